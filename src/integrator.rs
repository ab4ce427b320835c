//! Time integration for bodies.
//!
//! A fixed number of sub-steps of a semi-implicit scheme. The position update
//! carries an extra `a * h * integration_correction` velocity term; that factor
//! (sqrt(20) by default) is a tuned integration correction factor kept for
//! behavioral compatibility, not a textbook Euler/Verlet coefficient.

use crate::body::Body;
use crate::config::Tuning;
use crate::vector::Vector2;

/// Integration parameters taken from [`Tuning`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub sub_steps: usize,
    pub correction: f64,
}

impl Params {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            sub_steps: tuning.sub_steps.max(1),
            correction: tuning.integration_correction,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

/// Acceleration from the force lists plus downward gravity of magnitude `gravity`.
pub fn acceleration(body: &Body, gravity: f64) -> Vector2 {
    body.net_force() / body.mass() + Vector2::new(0.0, -gravity * body.gravity)
}

/// Advances `body` by `dt`.
///
/// Recomputes `body.acceleration` first, then sub-steps velocity and position,
/// then applies exponential air decay `v *= (air * body.air)^dt`.
pub fn integrate(body: &mut Body, dt: f64, gravity: f64, air_resistance: f64, params: &Params) {
    let a = acceleration(body, gravity);
    body.acceleration = a;

    let h = dt / params.sub_steps as f64;
    for _ in 0..params.sub_steps {
        body.velocity += a * h;
        body.position += (body.velocity + a * (h * params.correction)) * h;
    }

    let retention = (air_resistance * body.air_resistance).max(0.0);
    body.velocity *= retention.powf(dt);
}
