//! Runtime configuration for the sandbox.
//!
//! Everything here is `serde`-(de)serializable so a host can ship it as JSON:
//!
//! ```json
//! {
//!   "environment": { "gravity_scale": 1.0, "air_resistance": 0.98, "mode": "Ground" },
//!   "tuning": { "sub_steps": 10 },
//!   "constants": { "gravitational_constant": 6.674e-11 },
//!   "floor": { "level": 0.0, "half_width": 1.0e6, "depth": 10.0, "collision_factor": 0.8 },
//!   "seed": 7
//! }
//! ```
//!
//! Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::Zone;

/// Per-frame inputs owned by the host (UI sliders, camera).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Environment {
    /// Multiplier on the constant downward gravity.
    pub gravity_scale: f64,
    /// Fraction of velocity retained per unit time. 1.0 disables drag.
    pub air_resistance: f64,
    /// Global multiplier on every restitution product.
    pub collision_factor: f64,
    /// Regime the host asks for.
    pub mode: Zone,
    /// Vertical scroll position of the view, in world units.
    pub view_altitude: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            gravity_scale: 1.0,
            air_resistance: 1.0,
            collision_factor: 1.0,
            mode: Zone::Ground,
            view_altitude: 0.0,
        }
    }
}

impl Environment {
    pub fn with_gravity_scale(mut self, gravity_scale: f64) -> Self {
        self.gravity_scale = gravity_scale;
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

    pub fn with_mode(mut self, mode: Zone) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_view_altitude(mut self, view_altitude: f64) -> Self {
        self.view_altitude = view_altitude;
        self
    }
}

/// Empirically tuned constants.
///
/// These values were tuned for visual stability at interactive frame rates
/// and are not derived from physical law.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Tuning {
    /// Integrator sub-steps per frame.
    pub sub_steps: usize,
    /// Tuned integration correction factor applied to the position update.
    pub integration_correction: f64,
    /// Floor on the separating speed of a colliding body pair.
    pub min_separation_speed: f64,
    /// Body-body penetration is corrected by this multiple of the overlap.
    pub separation_overshoot: f64,
    pub rope_stiffness: f64,
    pub rope_damping: f64,
    /// Fraction of rope overstretch removed by direct position nudging.
    pub rope_nudge: f64,
    pub rod_stiffness: f64,
    pub rod_damping: f64,
    /// Push-out scale for bodies found inside an obstacle.
    pub wall_push: f64,
    /// Vertex penetration is corrected by this multiple of the overlap.
    pub vertex_correction: f64,
    /// Lengths below this are degenerate.
    pub epsilon: f64,
    /// Altitude at which a pending celestial transition commits.
    pub celestial_threshold: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            sub_steps: 10,
            integration_correction: 20f64.sqrt(),
            min_separation_speed: 1.0,
            separation_overshoot: 1.05,
            rope_stiffness: 1000.0,
            rope_damping: 0.1,
            rope_nudge: 0.05,
            rod_stiffness: 5000.0,
            rod_damping: 0.1,
            wall_push: 0.1,
            vertex_correction: 1.1,
            epsilon: 1e-5,
            celestial_threshold: 1.5e7,
        }
    }
}

/// Constants of the pairwise force laws and ground gravity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicalConstants {
    pub gravitational_constant: f64,
    pub coulomb_constant: f64,
    /// Downward acceleration in ground mode (+y is up).
    pub standard_gravity: f64,
    /// Added to d² in the pairwise laws.
    pub softening: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gravitational_constant: 6.674e-11,
            coulomb_constant: 8.9875e9,
            standard_gravity: 9.8,
            softening: 1e-9,
        }
    }
}

/// The ground floor: a wide box whose top edge acts as an infinite line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FloorConfig {
    /// Height of the top surface.
    pub level: f64,
    pub half_width: f64,
    /// Kept shallow: a body whose center crosses the top edge is pushed out
    /// along the centroid axis, so a deep slab throws it far upward.
    pub depth: f64,
    pub collision_factor: f64,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            level: 0.0,
            half_width: 1.0e6,
            depth: 10.0,
            collision_factor: 1.0,
        }
    }
}

/// Top-level configuration for a [`Simulation`](crate::Simulation).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SandboxConfig {
    pub environment: Environment,
    pub tuning: Tuning,
    pub constants: PhysicalConstants,
    /// `None` runs ground mode without a floor.
    pub floor: Option<FloorConfig>,
    /// Seed for the fallback-normal generator.
    pub seed: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            tuning: Tuning::default(),
            constants: PhysicalConstants::default(),
            floor: Some(FloorConfig::default()),
            seed: 0,
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_floor(mut self, floor: Option<FloorConfig>) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
