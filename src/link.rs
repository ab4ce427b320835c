//! Rope, rod and spring links between bodies and obstacle anchors.
//!
//! Links are solved once per frame before the pairwise force field:
//!
//! 1. every rod is projected: both endpoints are moved so the rod has its exact
//!    length, and the relative velocity along the rod is removed (mass-weighted);
//! 2. every link then contributes a tension force along its axis to the
//!    natural forces of its body endpoints.
//!
//! For rods the force acts on whatever deformation is left after all
//! projections (non-zero when bodies share several rods), so a rod is a dual
//! force + position-projection constraint. The force alone cannot hold a rod
//! rigid at interactive timesteps.

use serde::{Deserialize, Serialize};

use crate::body::{Body, Color};
use crate::config::Tuning;
use crate::error::{ValidationError, ensure_positive};
use crate::obstacle::AnchorPoint;
use crate::registry::{ElementId, Zone};
use crate::vector::Vector2;

/// One end of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endpoint {
    Body(ElementId),
    /// Kinematically driven by its obstacle, never by the link.
    Anchor(AnchorPoint),
}

impl Endpoint {
    /// The registry element this endpoint depends on.
    pub fn element(&self) -> ElementId {
        match self {
            Endpoint::Body(id) => *id,
            Endpoint::Anchor(anchor) => anchor.obstacle,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Endpoint::Body(_))
    }
}

/// Type-specific link parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum LinkKind {
    /// Pulls only once stretched past `length`.
    Rope { length: f64 },
    /// Holds `length` exactly in both directions.
    Rod { length: f64 },
    /// Hookean spring with axial damping.
    Spring {
        rest_length: f64,
        stiffness: f64,
        damping: f64,
    },
}

impl LinkKind {
    pub fn name(&self) -> &'static str {
        match self {
            LinkKind::Rope { .. } => "rope",
            LinkKind::Rod { .. } => "rod",
            LinkKind::Spring { .. } => "spring",
        }
    }

    fn validate(self) -> Result<Self, ValidationError> {
        match self {
            LinkKind::Rope { length } => Ok(LinkKind::Rope {
                length: ensure_positive("rope length", length)?,
            }),
            LinkKind::Rod { length } => Ok(LinkKind::Rod {
                length: ensure_positive("rod length", length)?,
            }),
            LinkKind::Spring {
                rest_length,
                stiffness,
                damping,
            } => {
                if !(rest_length.is_finite() && rest_length >= 0.0) {
                    return Err(ValidationError::NonPositive {
                        name: "spring rest length",
                        value: rest_length,
                    });
                }
                if !(damping.is_finite() && damping >= 0.0) {
                    return Err(ValidationError::NonPositive {
                        name: "spring damping",
                        value: damping,
                    });
                }
                Ok(LinkKind::Spring {
                    rest_length,
                    stiffness: ensure_positive("spring stiffness", stiffness)?,
                    damping,
                })
            }
        }
    }
}

/// Creation parameters for a [`Link`]. Endpoints are checked against the registry by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
    pub start: Endpoint,
    pub end: Endpoint,
    pub kind: LinkKind,
    pub color: Color,
    pub width: f64,
}

impl LinkSpec {
    pub fn new(start: Endpoint, end: Endpoint, kind: LinkKind) -> Self {
        Self {
            start,
            end,
            kind,
            color: Color::WHITE,
            width: 1.0,
        }
    }

    pub fn rope(start: Endpoint, end: Endpoint, length: f64) -> Self {
        Self::new(start, end, LinkKind::Rope { length })
    }

    pub fn rod(start: Endpoint, end: Endpoint, length: f64) -> Self {
        Self::new(start, end, LinkKind::Rod { length })
    }

    pub fn spring(start: Endpoint, end: Endpoint, rest_length: f64, stiffness: f64, damping: f64) -> Self {
        Self::new(
            start,
            end,
            LinkKind::Spring {
                rest_length,
                stiffness,
                damping,
            },
        )
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub id: ElementId,
    pub zone: Zone,
    pub start: Endpoint,
    pub end: Endpoint,
    pub kind: LinkKind,
    pub color: Color,
    pub width: f64,
}

impl Link {
    /// Rejects links with no body endpoint or with the same element at both ends.
    pub fn new(id: ElementId, zone: Zone, spec: LinkSpec) -> Result<Self, ValidationError> {
        let link = Self {
            id,
            zone,
            start: spec.start,
            end: spec.end,
            kind: spec.kind.validate()?,
            color: spec.color,
            width: ensure_positive("link width", spec.width)?,
        };
        if !link.is_legal() {
            return Err(ValidationError::IllegalLink);
        }
        Ok(link)
    }

    /// A link needs a body to act on and two distinct endpoints.
    pub fn is_legal(&self) -> bool {
        (self.start.is_body() || self.end.is_body()) && self.start != self.end
    }

    pub fn endpoints(&self) -> [Endpoint; 2] {
        [self.start, self.end]
    }

    /// Axial tension for the given current length and separation speed.
    ///
    /// Positive pulls the endpoints together. `separation_speed` is the
    /// relative velocity along the start-to-end axis.
    pub fn tension(&self, current_length: f64, separation_speed: f64, tuning: &Tuning, collision_factor: f64) -> f64 {
        match self.kind {
            LinkKind::Rope { length } => {
                let overlap = current_length - length;
                if overlap <= 0.0 {
                    return 0.0;
                }
                let damping = separation_speed * tuning.rope_damping * collision_factor;
                (tuning.rope_stiffness * overlap + damping).max(0.0)
            }
            LinkKind::Rod { length } => {
                let deformation = current_length - length;
                tuning.rod_stiffness * deformation + separation_speed * tuning.rod_damping * collision_factor
            }
            LinkKind::Spring {
                rest_length,
                stiffness,
                damping,
            } => stiffness * (current_length - rest_length) + damping * separation_speed,
        }
    }
}

/// An endpoint resolved against the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolved {
    /// Index into the active body slice.
    Body(usize),
    /// World position of an anchor.
    Fixed(Vector2),
}

struct EndState {
    position: Vector2,
    velocity: Vector2,
    mass: Option<f64>,
}

fn state(end: Resolved, bodies: &[&mut Body]) -> EndState {
    match end {
        Resolved::Body(i) => EndState {
            position: bodies[i].position,
            velocity: bodies[i].velocity,
            mass: Some(bodies[i].mass()),
        },
        Resolved::Fixed(position) => EndState {
            position,
            velocity: Vector2::zero(),
            mass: None,
        },
    }
}

/// Share of a correction taken by each end: heavier ends move less, anchors never move.
fn shares(a: &EndState, b: &EndState) -> (f64, f64) {
    match (a.mass, b.mass) {
        (Some(ma), Some(mb)) => (mb / (ma + mb), ma / (ma + mb)),
        (Some(_), None) => (1.0, 0.0),
        (None, Some(_)) => (0.0, 1.0),
        (None, None) => (0.0, 0.0),
    }
}

/// Geometry of the link axis: unit direction start->end and its length.
fn axis(a: &EndState, b: &EndState, epsilon: f64) -> (Vector2, f64) {
    let delta = b.position - a.position;
    let len = delta.mag();
    let dir = if len < epsilon {
        Vector2::unit_x()
    } else {
        delta / len
    };
    (dir, len)
}

fn shift(end: Resolved, bodies: &mut [&mut Body], by: Vector2, velocity: Vector2) {
    if let Resolved::Body(i) = end {
        bodies[i].position += by;
        bodies[i].velocity += velocity;
    }
}

/// Rod position and velocity projection.
pub fn project_rod(link: &Link, start: Resolved, end: Resolved, bodies: &mut [&mut Body], tuning: &Tuning) {
    let LinkKind::Rod { length } = link.kind else {
        return;
    };
    let a = state(start, bodies);
    let b = state(end, bodies);
    let (wa, wb) = shares(&a, &b);
    let (dir, len) = axis(&a, &b, tuning.epsilon);

    let deformation = len - length;
    let separation_speed = (b.velocity - a.velocity).dot(dir);

    shift(start, bodies, dir * (deformation * wa), dir * (separation_speed * wa));
    shift(end, bodies, -dir * (deformation * wb), -dir * (separation_speed * wb));
}

/// Adds the link's tension to its body endpoints and nudges overstretched ropes.
pub fn apply_tension(
    link: &Link,
    start: Resolved,
    end: Resolved,
    bodies: &mut [&mut Body],
    tuning: &Tuning,
    collision_factor: f64,
) {
    let a = state(start, bodies);
    let b = state(end, bodies);
    let (dir, len) = axis(&a, &b, tuning.epsilon);
    let separation_speed = (b.velocity - a.velocity).dot(dir);

    let tension = link.tension(len, separation_speed, tuning, collision_factor);
    if tension != 0.0 {
        if let Resolved::Body(i) = start {
            bodies[i].apply_force(dir * tension, true);
        }
        if let Resolved::Body(i) = end {
            bodies[i].apply_force(-dir * tension, true);
        }
    }

    if let LinkKind::Rope { length } = link.kind {
        let overlap = len - length;
        if overlap > 0.0 {
            let (wa, wb) = shares(&a, &b);
            let nudge = overlap * tuning.rope_nudge;
            shift(start, bodies, dir * (nudge * wa), Vector2::zero());
            shift(end, bodies, -dir * (nudge * wb), Vector2::zero());
        }
    }
}
