//! Plain-data save/restore of a scene.
//!
//! Ids are stored as raw `u64`s and survive the round trip, so links are
//! re-attached to their endpoints by id. A link whose endpoint is missing or
//! of the wrong kind is dropped with a warning; a malformed body or obstacle
//! fails the whole restore.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyFlags, BodySpec, Color};
use crate::config::SandboxConfig;
use crate::error::{Result, SandboxError};
use crate::link::{Endpoint, Link, LinkKind, LinkSpec};
use crate::merge::{ModeEngine, ModeState};
use crate::obstacle::{AnchorPoint, Obstacle, ObstacleSpec};
use crate::registry::{ElementId, ElementKind, Registry, Zone};
use crate::simulation::Simulation;
use crate::vector::{from_array, to_array};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BodyRecord {
    pub id: u64,
    pub zone: Zone,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub radius: f64,
    pub mass: f64,
    pub color: Color,
    pub gravity: f64,
    pub air_resistance: f64,
    pub collision_factor: f64,
    pub gravitation: bool,
    pub electric_charge: f64,
    #[serde(default)]
    pub flags: BodyFlags,
    #[serde(default)]
    pub artificial_forces: Vec<[f64; 2]>,
}

impl BodyRecord {
    fn capture(body: &Body) -> Self {
        Self {
            id: body.id.0,
            zone: body.zone,
            position: to_array(body.position),
            velocity: to_array(body.velocity),
            radius: body.radius(),
            mass: body.mass(),
            color: body.color,
            gravity: body.gravity,
            air_resistance: body.air_resistance,
            collision_factor: body.collision_factor,
            gravitation: body.gravitation,
            electric_charge: body.electric_charge,
            flags: body.flags,
            artificial_forces: body.artificial_forces.iter().map(|f| to_array(*f)).collect(),
        }
    }

    fn rebuild(&self) -> Result<Body> {
        let spec = BodySpec {
            position: from_array(self.position),
            velocity: from_array(self.velocity),
            radius: self.radius,
            mass: self.mass,
            color: self.color,
            gravity: self.gravity,
            air_resistance: self.air_resistance,
            collision_factor: self.collision_factor,
            electric_charge: self.electric_charge,
            flags: self.flags,
        };
        let mut body = Body::new(ElementId(self.id), self.zone, spec)?;
        body.gravitation = self.gravitation;
        body.artificial_forces = self.artificial_forces.iter().map(|f| from_array(*f)).collect();
        Ok(body)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ObstacleRecord {
    pub id: u64,
    pub zone: Zone,
    pub vertices: [[f64; 2]; 4],
    pub color: Color,
    pub is_line: bool,
    pub collision_factor: f64,
}

impl ObstacleRecord {
    fn capture(obstacle: &Obstacle) -> Self {
        Self {
            id: obstacle.id.0,
            zone: obstacle.zone,
            vertices: obstacle.vertices().map(to_array),
            color: obstacle.color,
            is_line: obstacle.is_line(),
            collision_factor: obstacle.collision_factor(),
        }
    }

    fn rebuild(&self) -> Result<Obstacle> {
        let spec = ObstacleSpec::new(self.vertices.map(from_array))
            .with_color(self.color)
            .with_line(self.is_line)
            .with_collision_factor(self.collision_factor);
        Ok(Obstacle::new(ElementId(self.id), self.zone, spec)?)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum EndpointRecord {
    Body { id: u64 },
    Anchor { obstacle: u64, offset: [f64; 2] },
}

impl EndpointRecord {
    fn capture(endpoint: &Endpoint) -> Self {
        match endpoint {
            Endpoint::Body(id) => EndpointRecord::Body { id: id.0 },
            Endpoint::Anchor(anchor) => EndpointRecord::Anchor {
                obstacle: anchor.obstacle.0,
                offset: to_array(anchor.offset),
            },
        }
    }

    /// Resolves against the restored registry, checking the element kind.
    fn rebuild(&self, registry: &Registry) -> Result<Endpoint> {
        let (endpoint, expected) = match *self {
            EndpointRecord::Body { id } => (Endpoint::Body(ElementId(id)), ElementKind::Body),
            EndpointRecord::Anchor { obstacle, offset } => (
                Endpoint::Anchor(AnchorPoint::new(ElementId(obstacle), from_array(offset))),
                ElementKind::Obstacle,
            ),
        };
        let element = endpoint.element();
        match registry.kind_of(element) {
            Some(kind) if kind == expected => Ok(endpoint),
            Some(_) => Err(SandboxError::WrongKind(element, expected.name())),
            None => Err(SandboxError::UnknownElement(element)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LinkRecord {
    pub id: u64,
    pub zone: Zone,
    pub start: EndpointRecord,
    pub end: EndpointRecord,
    pub kind: LinkKind,
    pub color: Color,
    pub width: f64,
}

impl LinkRecord {
    fn capture(link: &Link) -> Self {
        Self {
            id: link.id.0,
            zone: link.zone,
            start: EndpointRecord::capture(&link.start),
            end: EndpointRecord::capture(&link.end),
            kind: link.kind,
            color: link.color,
            width: link.width,
        }
    }

    fn rebuild(&self, registry: &Registry) -> Result<Link> {
        let spec = LinkSpec::new(self.start.rebuild(registry)?, self.end.rebuild(registry)?, self.kind)
            .with_color(self.color)
            .with_width(self.width);
        Ok(Link::new(ElementId(self.id), self.zone, spec)?)
    }
}

/// Everything needed to rebuild a scene, minus the host's configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub next_id: u64,
    /// Committed mode. A pending transition is saved as ground.
    pub mode: Zone,
    pub bodies: Vec<BodyRecord>,
    pub obstacles: Vec<ObstacleRecord>,
    pub links: Vec<LinkRecord>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Simulation {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.registry.next_id(),
            mode: self.active_zone(),
            bodies: self.registry.bodies().map(BodyRecord::capture).collect(),
            obstacles: self.registry.obstacles().map(ObstacleRecord::capture).collect(),
            links: self.registry.links().map(LinkRecord::capture).collect(),
        }
    }

    /// Rebuilds a simulation from `snapshot`, resuming in the saved mode.
    pub fn restore(config: SandboxConfig, snapshot: &Snapshot) -> Result<Simulation> {
        let mut sim = Simulation::new(config);
        sim.engine = ModeEngine::new(match snapshot.mode {
            Zone::Ground => ModeState::Ground,
            Zone::Celestial => ModeState::Celestial,
        });
        sim.config.environment.mode = snapshot.mode;

        for record in &snapshot.bodies {
            sim.registry.insert_body(record.rebuild()?);
        }
        for record in &snapshot.obstacles {
            sim.registry.insert_obstacle(record.rebuild()?);
        }
        for record in &snapshot.links {
            match record.rebuild(&sim.registry) {
                Ok(link) => sim.registry.insert_link(link),
                Err(err) => warn!("dropping link #{} on restore: {err}", record.id),
            }
        }
        sim.registry.reserve_through(snapshot.next_id.saturating_sub(1));
        Ok(sim)
    }
}
