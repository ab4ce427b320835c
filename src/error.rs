use crate::registry::ElementId;
use crate::vector::Vector2;

/// Reasons an element cannot be constructed or modified.
///
/// These are hard failures reported to the caller. Nothing is clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f64),
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("collision factor must be non-negative and finite, got {0}")]
    InvalidCollisionFactor(f64),
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("obstacle vertices do not form a simple quadrilateral")]
    DegeneratePolygon,
    #[error("link needs at least one body endpoint and two distinct endpoints")]
    IllegalLink,
}

/// Top-level error type for registry and configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no element with id {0}")]
    UnknownElement(ElementId),
    #[error("element {0} is not a {1}")]
    WrongKind(ElementId, &'static str),
    #[error("malformed JSON: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = SandboxError> = std::result::Result<T, E>;

/// Rejects NaN and infinities for a named scalar input.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { name, value })
    }
}

pub(crate) fn ensure_finite_vector(name: &'static str, value: Vector2) -> Result<Vector2, ValidationError> {
    ensure_finite(name, value.x)?;
    ensure_finite(name, value.y)?;
    Ok(value)
}

/// Rejects non-positive (or non-finite) scalar inputs.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NonPositive { name, value })
    }
}
