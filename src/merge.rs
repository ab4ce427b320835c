//! Celestial merging and the Ground/Celestial mode state machine.

use crate::body::{self, Body, Color};
use crate::collision;
use crate::registry::{ElementId, Registry, Zone};

/// Combines two bodies into one that conserves mass and momentum.
///
/// The lower id survives. Radius is `sqrt(r1² + r2²)` so the disc area is
/// conserved. Color blends by radius, charge sums, UI flags are OR-ed.
/// Both force lists are concatenated so the merged body still feels this
/// frame's field; the pair's mutual forces cancel in the sum.
pub fn merge_bodies(a: &Body, b: &Body) -> Body {
    let keep = if a.id <= b.id { a } else { b };
    let (ma, mb) = (a.mass(), b.mass());
    let mass = ma + mb;
    let radius = (a.radius().powi(2) + b.radius().powi(2)).sqrt();

    let mut merged = keep.clone();
    merged.position = (a.position * ma + b.position * mb) / mass;
    merged.velocity = (a.momentum() + b.momentum()) / mass;
    merged.acceleration = (a.acceleration * ma + b.acceleration * mb) / mass;
    merged.color = Color::blend(a.color, a.radius(), b.color, b.radius());
    merged.electric_charge = a.electric_charge + b.electric_charge;
    merged.collision_factor = (a.collision_factor * ma + b.collision_factor * mb) / mass;
    merged.flags = a.flags.union(b.flags);
    merged.gravitation = true;
    merged.natural_forces = a.natural_forces.iter().chain(&b.natural_forces).copied().collect();
    merged.artificial_forces = a.artificial_forces.iter().chain(&b.artificial_forces).copied().collect();
    body::with_shape(merged, mass, radius)
}

/// One merge applied to the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    pub survivor: ElementId,
    pub absorbed: ElementId,
    /// The absorbed body followed by any links that died with it.
    pub removed: Vec<ElementId>,
}

/// Merges every overlapping body pair in `zone`, in id order.
///
/// A body absorbed earlier in the frame is skipped by later pairs. Passes
/// repeat until nothing overlaps, so a chain of overlaps collapses within one
/// frame.
pub fn merge_overlapping(registry: &mut Registry, zone: Zone) -> Vec<MergeOutcome> {
    let mut outcomes = Vec::new();
    loop {
        let pass = merge_pass(registry, zone);
        if pass.is_empty() {
            return outcomes;
        }
        outcomes.extend(pass);
    }
}

fn merge_pass(registry: &mut Registry, zone: Zone) -> Vec<MergeOutcome> {
    let candidates = {
        let active: Vec<&mut Body> = registry.bodies.values_mut().filter(|b| b.zone == zone).collect();
        collision::broad_phase(&active)
            .into_iter()
            .map(|(i, j)| (active[i].id, active[j].id))
            .collect::<Vec<_>>()
    };

    let mut outcomes = Vec::new();
    for (a, b) in candidates {
        let (Some(first), Some(second)) = (registry.body(a), registry.body(b)) else {
            continue;
        };
        if !collision::touching(first, second) {
            continue;
        }
        let merged = merge_bodies(first, second);
        let survivor = merged.id;
        let absorbed = if survivor == a { b } else { a };

        let removed = registry.remove(absorbed);
        registry.insert_body(merged);
        outcomes.push(MergeOutcome {
            survivor,
            absorbed,
            removed,
        });
    }
    outcomes
}

/// Committed or pending simulation regime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeState {
    #[default]
    Ground,
    /// Celestial was requested below the altitude threshold. Ground is still
    /// simulated, with pairwise gravitation forced on.
    Transitioning,
    Celestial,
}

impl ModeState {
    /// Zone that is simulated in this state.
    pub fn active_zone(self) -> Zone {
        match self {
            ModeState::Celestial => Zone::Celestial,
            ModeState::Ground | ModeState::Transitioning => Zone::Ground,
        }
    }
}

/// What [`ModeEngine::reconcile`] did this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeStep {
    Steady,
    Began,
    Cancelled,
    Committed { from: Zone, to: Zone },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModeEngine {
    state: ModeState,
}

impl ModeEngine {
    pub fn new(state: ModeState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    /// Moves toward `requested`. Entering Celestial waits for `altitude >= threshold`.
    pub fn reconcile(&mut self, requested: Zone, altitude: f64, threshold: f64) -> ModeStep {
        let ready = altitude >= threshold;
        match (self.state, requested) {
            (ModeState::Ground, Zone::Celestial) if ready => self.commit(Zone::Celestial),
            (ModeState::Ground, Zone::Celestial) => {
                self.state = ModeState::Transitioning;
                ModeStep::Began
            }
            (ModeState::Transitioning, Zone::Celestial) if ready => self.commit(Zone::Celestial),
            (ModeState::Transitioning, Zone::Ground) => {
                self.state = ModeState::Ground;
                ModeStep::Cancelled
            }
            (ModeState::Celestial, Zone::Ground) => self.commit(Zone::Ground),
            _ => ModeStep::Steady,
        }
    }

    fn commit(&mut self, to: Zone) -> ModeStep {
        let from = self.state.active_zone();
        self.state = match to {
            Zone::Ground => ModeState::Ground,
            Zone::Celestial => ModeState::Celestial,
        };
        ModeStep::Committed { from, to }
    }
}

/// Moves the scene into `to` after a committed mode change.
///
/// Followed bodies migrate, links left spanning two zones are deleted, and
/// every body's `gravitation` flag is set for its zone. Natural forces are
/// cleared. Returns the deleted link ids.
pub fn migrate(registry: &mut Registry, to: Zone) -> Vec<ElementId> {
    for body in registry.bodies.values_mut() {
        if body.flags.following {
            body.zone = to;
        }
    }

    let mut spanning = Vec::new();
    let mut rezoned = Vec::new();
    for link in registry.links() {
        let zones = link.endpoints().map(|e| registry.zone_of(e.element()));
        match zones {
            [Some(a), Some(b)] if a == b => {
                if a != link.zone {
                    rezoned.push((link.id, a));
                }
            }
            _ => spanning.push(link.id),
        }
    }
    for (id, zone) in rezoned {
        if let Some(link) = registry.links.get_mut(&id) {
            link.zone = zone;
        }
    }
    let mut removed = Vec::new();
    for id in spanning {
        removed.extend(registry.remove(id));
    }

    for body in registry.bodies.values_mut() {
        body.gravitation = body.zone == Zone::Celestial;
        body.clear_natural_forces();
    }
    removed
}

/// Turns pairwise gravitation on or off for every body in `zone`.
pub fn force_gravitation(registry: &mut Registry, zone: Zone, enabled: bool) {
    for body in registry.bodies.values_mut().filter(|b| b.zone == zone) {
        body.gravitation = enabled;
    }
}
