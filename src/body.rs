use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ensure_finite, ensure_finite_vector};
use crate::integrator;
use crate::registry::{ElementId, Zone};
use crate::vector::Vector2;

/// RGB display color. Opaque to the physics apart from merge blending.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Weighted average of two colors. Equal weights if both weights are zero.
    pub fn blend(a: Color, wa: f64, b: Color, wb: f64) -> Color {
        let total = wa + wb;
        let (wa, wb) = if total > 0.0 { (wa / total, wb / total) } else { (0.5, 0.5) };
        let mix = |x: u8, y: u8| (x as f64 * wa + y as f64 * wb).round().clamp(0.0, 255.0) as u8;
        Color::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// UI-facing flags that must survive a merge.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyFlags {
    /// Camera is tracking this body.
    pub following: bool,
    pub highlighted: bool,
    pub show_info: bool,
}

impl BodyFlags {
    pub fn union(self, other: BodyFlags) -> BodyFlags {
        BodyFlags {
            following: self.following || other.following,
            highlighted: self.highlighted || other.highlighted,
            show_info: self.show_info || other.show_info,
        }
    }
}

/// Writable body attributes, one variant per field the host may edit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyAttribute {
    Mass(f64),
    Radius(f64),
    Color(Color),
    CollisionFactor(f64),
    ElectricCharge(f64),
}

/// Creation parameters for a [`Body`].
#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    pub position: Vector2,
    pub velocity: Vector2,
    pub radius: f64,
    pub mass: f64,
    pub color: Color,
    pub gravity: f64,
    pub air_resistance: f64,
    pub collision_factor: f64,
    pub electric_charge: f64,
    pub flags: BodyFlags,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            position: Vector2::zero(),
            velocity: Vector2::zero(),
            radius: 1.0,
            mass: 1.0,
            color: Color::WHITE,
            gravity: 1.0,
            air_resistance: 1.0,
            collision_factor: 1.0,
            electric_charge: 0.0,
            flags: BodyFlags::default(),
        }
    }
}

impl BodySpec {
    pub fn new(position: Vector2, radius: f64, mass: f64) -> Self {
        Self {
            position,
            radius,
            mass,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_air_resistance(mut self, air_resistance: f64) -> Self {
        self.air_resistance = air_resistance;
        self
    }

    pub fn with_collision_factor(mut self, collision_factor: f64) -> Self {
        self.collision_factor = collision_factor;
        self
    }

    pub fn with_charge(mut self, electric_charge: f64) -> Self {
        self.electric_charge = electric_charge;
        self
    }

    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A circular point mass ("ball").
#[derive(Clone, Debug)]
pub struct Body {
    pub id: ElementId,
    pub zone: Zone,
    /// Position in world units.
    pub position: Vector2,
    pub velocity: Vector2,
    /// Acceleration derived on the last integration.
    pub acceleration: Vector2,
    radius: f64,
    mass: f64,
    pub color: Color,
    /// Forces rebuilt every frame (gravitation, electrostatics, links).
    pub natural_forces: Vec<Vector2>,
    /// Forces injected by interaction. Kept until cleared.
    pub artificial_forces: Vec<Vector2>,
    /// Per-body multiplier on ground gravity.
    pub gravity: f64,
    /// Per-body velocity retention per unit time.
    pub air_resistance: f64,
    /// Restitution coefficient: 1 elastic, below 1 lossy, above 1 boosting.
    pub collision_factor: f64,
    /// Takes part in pairwise Newtonian gravity.
    pub gravitation: bool,
    pub electric_charge: f64,
    pub flags: BodyFlags,
}

impl Body {
    /// Validates `spec` and builds the body.
    pub fn new(id: ElementId, zone: Zone, spec: BodySpec) -> Result<Self, ValidationError> {
        let mass = validate_mass(spec.mass)?;
        let radius = validate_radius(spec.radius)?;
        let collision_factor = validate_collision_factor(spec.collision_factor)?;
        let position = ensure_finite_vector("position", spec.position)?;
        let velocity = ensure_finite_vector("velocity", spec.velocity)?;
        Ok(Self {
            id,
            zone,
            position,
            velocity,
            acceleration: Vector2::zero(),
            radius,
            mass,
            color: spec.color,
            natural_forces: Vec::new(),
            artificial_forces: Vec::new(),
            gravity: ensure_finite("gravity", spec.gravity)?,
            air_resistance: ensure_finite("air_resistance", spec.air_resistance)?,
            collision_factor,
            gravitation: zone == Zone::Celestial,
            electric_charge: ensure_finite("electric_charge", spec.electric_charge)?,
            flags: spec.flags,
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn momentum(&self) -> Vector2 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.mag_sq()
    }

    /// Updates one attribute, keeping the `mass > 0` and `radius > 0` invariants.
    pub fn set_attribute(&mut self, attribute: BodyAttribute) -> Result<(), ValidationError> {
        match attribute {
            BodyAttribute::Mass(mass) => self.mass = validate_mass(mass)?,
            BodyAttribute::Radius(radius) => self.radius = validate_radius(radius)?,
            BodyAttribute::Color(color) => self.color = color,
            BodyAttribute::CollisionFactor(factor) => {
                self.collision_factor = validate_collision_factor(factor)?
            }
            BodyAttribute::ElectricCharge(charge) => {
                self.electric_charge = ensure_finite("electric_charge", charge)?
            }
        }
        Ok(())
    }

    /// Records a force for this frame (`natural`) or until cleared.
    pub fn apply_force(&mut self, force: Vector2, natural: bool) {
        if natural {
            self.natural_forces.push(force);
        } else {
            self.artificial_forces.push(force);
        }
    }

    pub fn apply_velocity(&mut self, velocity: Vector2) {
        self.velocity += velocity;
    }

    pub fn clear_artificial_forces(&mut self) {
        self.artificial_forces.clear();
    }

    pub fn clear_natural_forces(&mut self) {
        self.natural_forces.clear();
    }

    pub fn clear_velocity(&mut self) {
        self.velocity = Vector2::zero();
    }

    /// Sum of natural and artificial forces.
    pub fn net_force(&self) -> Vector2 {
        self.natural_forces
            .iter()
            .chain(self.artificial_forces.iter())
            .fold(Vector2::zero(), |acc, f| acc + *f)
    }

    /// Advances position and velocity by `dt` under the current forces.
    ///
    /// `gravity` is the downward acceleration already scaled by the environment;
    /// `air_resistance` is the environment's retention factor.
    pub fn update(&mut self, dt: f64, gravity: f64, air_resistance: f64, params: &integrator::Params) {
        integrator::integrate(self, dt, gravity, air_resistance, params);
    }
}

fn validate_mass(mass: f64) -> Result<f64, ValidationError> {
    if mass.is_finite() && mass > 0.0 {
        Ok(mass)
    } else {
        Err(ValidationError::InvalidMass(mass))
    }
}

fn validate_radius(radius: f64) -> Result<f64, ValidationError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(ValidationError::InvalidRadius(radius))
    }
}

pub(crate) fn validate_collision_factor(factor: f64) -> Result<f64, ValidationError> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(factor)
    } else {
        Err(ValidationError::InvalidCollisionFactor(factor))
    }
}

/// Restores a body from trusted fields. Used by merging, which preserves the invariants.
pub(crate) fn with_shape(mut body: Body, mass: f64, radius: f64) -> Body {
    debug_assert!(mass > 0.0 && radius > 0.0);
    body.mass = mass;
    body.radius = radius;
    body
}
