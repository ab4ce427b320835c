pub mod body;
pub mod c_api;
pub mod collision;
pub mod config;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod integrator;
pub mod link;
pub mod merge;
pub mod obstacle;
pub mod registry;
pub mod simulation;
pub mod snapshot;
pub mod utils;
pub mod vector;

pub use body::{Body, BodyAttribute, BodyFlags, BodySpec, Color};
pub use config::{Environment, FloorConfig, PhysicalConstants, SandboxConfig, Tuning};
pub use error::{Result, SandboxError, ValidationError};
pub use link::{Endpoint, Link, LinkKind, LinkSpec};
pub use merge::ModeState;
pub use obstacle::{AnchorPoint, CollisionLine, Obstacle, ObstacleSpec};
pub use registry::{ElementId, Zone};
pub use simulation::{SimEvent, Simulation};
pub use snapshot::Snapshot;
pub use vector::{Vector2, VectorExt};
