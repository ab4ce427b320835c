use std::collections::HashMap;

use log::{debug, info, trace, warn};

use crate::{
    body::{Body, BodyAttribute, BodySpec},
    collision::{self, ContactParams},
    config::{Environment, FloorConfig, SandboxConfig},
    error::{Result, SandboxError, ValidationError},
    forces, integrator,
    link::{self, Endpoint, Link, LinkSpec, Resolved},
    merge::{self, ModeEngine, ModeState, ModeStep},
    obstacle::{AnchorPoint, Obstacle, ObstacleSpec},
    registry::{ElementId, ElementKind, Registry, Zone},
    vector::Vector2,
};

/// Id of the built-in floor. Registry ids start at 1.
pub const FLOOR_ID: ElementId = ElementId(0);

/// Something the host may need to react to after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// `absorbed` was merged into `survivor`. Followed by `Removed` events.
    Merged { survivor: ElementId, absorbed: ElementId },
    /// The element no longer exists.
    Removed(ElementId),
    ModeChanged { from: Zone, to: Zone },
}

/// The physics sandbox: owns every element and advances them frame by frame.
#[derive(Debug)]
pub struct Simulation {
    pub(crate) config: SandboxConfig,
    pub(crate) registry: Registry,
    floor: Option<Obstacle>,
    pub(crate) engine: ModeEngine,
    rng: fastrand::Rng,
    /// Number of steps taken.
    pub frame: usize,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

impl Simulation {
    /// Starts an empty scene in the mode requested by `config.environment`.
    ///
    /// Celestial is only entered on the first step, through the mode engine.
    pub fn new(config: SandboxConfig) -> Self {
        let floor = config.floor.as_ref().and_then(|floor| match build_floor(floor) {
            Ok(obstacle) => Some(obstacle),
            Err(err) => {
                warn!("floor disabled: {err}");
                None
            }
        });
        Self {
            rng: fastrand::Rng::with_seed(config.seed),
            config,
            registry: Registry::new(),
            floor,
            engine: ModeEngine::default(),
            frame: 0,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.config.environment
    }

    /// Host-owned per-frame inputs. Read at the start of every step.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.config.environment
    }

    pub fn mode(&self) -> ModeState {
        self.engine.state()
    }

    /// Zone new elements are created in and the one being simulated.
    pub fn active_zone(&self) -> Zone {
        self.engine.state().active_zone()
    }

    pub fn floor(&self) -> Option<&Obstacle> {
        self.floor.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Advances the active zone by `dt` seconds.
    ///
    /// Order: mode reconciliation, natural force reset, links, pairwise forces,
    /// collisions (merges in celestial mode), integration. A non-positive or
    /// non-finite `dt` does nothing.
    pub fn step(&mut self, dt: f64) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if !(dt.is_finite() && dt > 0.0) {
            return events;
        }
        self.reconcile_mode(&mut events);

        let zone = self.active_zone();
        let celestial = zone == Zone::Celestial;
        let env = &self.config.environment;
        let tuning = &self.config.tuning;
        let constants = &self.config.constants;
        let gravity = if celestial {
            0.0
        } else {
            constants.standard_gravity * env.gravity_scale
        };
        let params = ContactParams::new(tuning, env.collision_factor, gravity);

        let mut contacts = 0;
        {
            let Registry {
                bodies,
                obstacles,
                links,
                ..
            } = &mut self.registry;
            let mut active: Vec<&mut Body> = bodies.values_mut().filter(|b| b.zone == zone).collect();
            for body in active.iter_mut() {
                body.clear_natural_forces();
            }

            let index: HashMap<ElementId, usize> = active.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
            let resolve = |endpoint: &Endpoint| match endpoint {
                Endpoint::Body(id) => index.get(id).map(|&i| Resolved::Body(i)),
                Endpoint::Anchor(anchor) => obstacles
                    .get(&anchor.obstacle)
                    .map(|obstacle| Resolved::Fixed(anchor.position(obstacle))),
            };
            let solved: Vec<(&Link, Resolved, Resolved)> = links
                .values()
                .filter(|l| l.zone == zone && l.is_legal())
                .filter_map(|l| Some((l, resolve(&l.start)?, resolve(&l.end)?)))
                .collect();

            for (link, start, end) in &solved {
                link::project_rod(link, *start, *end, &mut active, tuning);
            }
            for (link, start, end) in &solved {
                link::apply_tension(link, *start, *end, &mut active, tuning, env.collision_factor);
            }

            forces::accumulate(&mut active, constants);

            if !celestial {
                contacts += collision::resolve_body_pairs(&mut active, &params, &mut self.rng);
            }
        }

        if celestial {
            for outcome in merge::merge_overlapping(&mut self.registry, zone) {
                info!("{} absorbed {}", outcome.survivor, outcome.absorbed);
                events.push(SimEvent::Merged {
                    survivor: outcome.survivor,
                    absorbed: outcome.absorbed,
                });
                events.extend(outcome.removed.into_iter().map(SimEvent::Removed));
            }
        }

        let Registry { bodies, obstacles, .. } = &mut self.registry;
        let mut active: Vec<&mut Body> = bodies.values_mut().filter(|b| b.zone == zone).collect();
        let walls: Vec<&Obstacle> = obstacles.values().filter(|o| o.zone == zone).collect();
        let floor = if celestial { None } else { self.floor.as_ref() };
        contacts += collision::resolve_obstacles(&mut active, &walls, floor, &params);

        let integration = integrator::Params::from_tuning(tuning);
        for body in active.iter_mut() {
            body.update(dt, gravity, env.air_resistance, &integration);
        }

        trace!(
            "frame {}: {} bodies, {} contacts, {} events",
            self.frame,
            active.len(),
            contacts,
            events.len()
        );
        self.frame += 1;
        events
    }

    fn reconcile_mode(&mut self, events: &mut Vec<SimEvent>) {
        let env = &self.config.environment;
        let step = self
            .engine
            .reconcile(env.mode, env.view_altitude, self.config.tuning.celestial_threshold);
        match step {
            ModeStep::Steady => {}
            ModeStep::Began => info!("celestial mode requested, holding until altitude threshold"),
            ModeStep::Cancelled => {
                info!("celestial transition cancelled");
                merge::force_gravitation(&mut self.registry, Zone::Ground, false);
            }
            ModeStep::Committed { from, to } => {
                info!("mode changed from {from:?} to {to:?}");
                let removed = merge::migrate(&mut self.registry, to);
                events.extend(removed.into_iter().map(SimEvent::Removed));
                events.push(SimEvent::ModeChanged { from, to });
            }
        }
        if self.engine.state() == ModeState::Transitioning {
            merge::force_gravitation(&mut self.registry, Zone::Ground, true);
        }
    }

    pub fn create_body(&mut self, spec: BodySpec) -> Result<ElementId> {
        let id = self.registry.allocate_id();
        let body = Body::new(id, self.active_zone(), spec)?;
        debug!("created body {id} at {:?}", body.position);
        self.registry.insert_body(body);
        Ok(id)
    }

    pub fn create_obstacle(&mut self, spec: ObstacleSpec) -> Result<ElementId> {
        let id = self.registry.allocate_id();
        let obstacle = Obstacle::new(id, self.active_zone(), spec)?;
        debug!("created obstacle {id} at {:?}", obstacle.position());
        self.registry.insert_obstacle(obstacle);
        Ok(id)
    }

    /// Creates a link after checking both endpoints exist with the right kind.
    ///
    /// The link lives in the zone of its endpoints; endpoints in different
    /// zones make it illegal.
    pub fn create_link(&mut self, spec: LinkSpec) -> Result<ElementId> {
        let mut zones = Vec::with_capacity(2);
        for endpoint in [spec.start, spec.end] {
            let (element, expected) = match endpoint {
                Endpoint::Body(id) => (id, ElementKind::Body),
                Endpoint::Anchor(anchor) => (anchor.obstacle, ElementKind::Obstacle),
            };
            match self.registry.kind_of(element) {
                Some(kind) if kind == expected => {}
                Some(_) => return Err(SandboxError::WrongKind(element, expected.name())),
                None => return Err(SandboxError::UnknownElement(element)),
            }
            zones.extend(self.registry.zone_of(element));
        }
        if zones.windows(2).any(|w| w[0] != w[1]) {
            return Err(ValidationError::IllegalLink.into());
        }
        let zone = zones.first().copied().unwrap_or_else(|| self.active_zone());

        let id = self.registry.allocate_id();
        let link = Link::new(id, zone, spec)?;
        debug!("created {} {id}", link.kind.name());
        self.registry.insert_link(link);
        Ok(id)
    }

    /// Anchor for a link endpoint at `world_point` on an obstacle.
    pub fn anchor_at(&self, obstacle: ElementId, world_point: Vector2) -> Result<AnchorPoint> {
        let obstacle = self.obstacle_ref(obstacle)?;
        Ok(AnchorPoint::at(obstacle, world_point))
    }

    /// Deletes an element and every link attached to it. Returns all removed ids.
    pub fn delete_element(&mut self, id: ElementId) -> Result<Vec<ElementId>> {
        let removed = self.registry.remove(id);
        if removed.is_empty() {
            return Err(SandboxError::UnknownElement(id));
        }
        debug!("deleted {id} ({} elements)", removed.len());
        Ok(removed)
    }

    pub fn apply_force(&mut self, id: ElementId, force: Vector2, natural: bool) -> Result<()> {
        self.body_ref_mut(id)?.apply_force(force, natural);
        Ok(())
    }

    /// Adds `velocity` to the body's velocity.
    pub fn apply_velocity(&mut self, id: ElementId, velocity: Vector2) -> Result<()> {
        self.body_ref_mut(id)?.apply_velocity(velocity);
        Ok(())
    }

    /// Drops the body's artificial forces.
    pub fn clear_forces(&mut self, id: ElementId) -> Result<()> {
        self.body_ref_mut(id)?.clear_artificial_forces();
        Ok(())
    }

    pub fn clear_velocity(&mut self, id: ElementId) -> Result<()> {
        self.body_ref_mut(id)?.clear_velocity();
        Ok(())
    }

    pub fn set_body_attribute(&mut self, id: ElementId, attribute: BodyAttribute) -> Result<()> {
        self.body_ref_mut(id)?.set_attribute(attribute)?;
        Ok(())
    }

    /// Moves an obstacle rigidly. Its anchors move with it.
    pub fn move_obstacle(&mut self, id: ElementId, delta: Vector2) -> Result<()> {
        self.obstacle_ref_mut(id)?.translate(delta);
        Ok(())
    }

    pub fn set_obstacle_vertices(&mut self, id: ElementId, vertices: [Vector2; 4]) -> Result<()> {
        self.obstacle_ref_mut(id)?.set_vertices(vertices)?;
        Ok(())
    }

    pub fn body(&self, id: ElementId) -> Option<&Body> {
        self.registry.body(id)
    }

    /// All bodies in both zones, by id.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.registry.bodies()
    }

    pub fn obstacle(&self, id: ElementId) -> Option<&Obstacle> {
        self.registry.obstacle(id)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.registry.obstacles()
    }

    pub fn link(&self, id: ElementId) -> Option<&Link> {
        self.registry.link(id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.registry.links()
    }

    fn body_ref_mut(&mut self, id: ElementId) -> Result<&mut Body> {
        let kind = self.registry.kind_of(id);
        match self.registry.body_mut(id) {
            Some(body) => Ok(body),
            None if kind.is_some() => Err(SandboxError::WrongKind(id, ElementKind::Body.name())),
            None => Err(SandboxError::UnknownElement(id)),
        }
    }

    fn obstacle_ref(&self, id: ElementId) -> Result<&Obstacle> {
        match self.registry.obstacle(id) {
            Some(obstacle) => Ok(obstacle),
            None if self.registry.kind_of(id).is_some() => {
                Err(SandboxError::WrongKind(id, ElementKind::Obstacle.name()))
            }
            None => Err(SandboxError::UnknownElement(id)),
        }
    }

    fn obstacle_ref_mut(&mut self, id: ElementId) -> Result<&mut Obstacle> {
        let kind = self.registry.kind_of(id);
        match self.registry.obstacle_mut(id) {
            Some(obstacle) => Ok(obstacle),
            None if kind.is_some() => Err(SandboxError::WrongKind(id, ElementKind::Obstacle.name())),
            None => Err(SandboxError::UnknownElement(id)),
        }
    }
}

/// The floor: a wide slab whose top edge sits at `level`. Its edges act as infinite lines.
fn build_floor(floor: &FloorConfig) -> std::result::Result<Obstacle, ValidationError> {
    let min = Vector2::new(-floor.half_width, floor.level - floor.depth);
    let max = Vector2::new(floor.half_width, floor.level);
    let spec = ObstacleSpec::rect(min, max)
        .with_line(true)
        .with_collision_factor(floor.collision_factor);
    Obstacle::new(FLOOR_ID, Zone::Ground, spec)
}
