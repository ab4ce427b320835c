//! Single registry for every element in the scene.
//!
//! Bodies, obstacles and links share one id space and carry a [`Zone`] tag
//! instead of living in per-mode collections. A dependency index maps each
//! body/obstacle id to the links that reference it, so deleting an element
//! removes exactly its links without scanning.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::link::Link;
use crate::obstacle::Obstacle;

/// Stable identity of a body, obstacle or link. Never reused.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which regime an element belongs to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Zone {
    #[default]
    Ground,
    Celestial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Body,
    Obstacle,
    Link,
}

impl ElementKind {
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Body => "body",
            ElementKind::Obstacle => "obstacle",
            ElementKind::Link => "link",
        }
    }
}

/// Owns all elements. Iteration order is id order, so the simulation is deterministic.
#[derive(Debug)]
pub struct Registry {
    next_id: u64,
    pub(crate) bodies: BTreeMap<ElementId, Body>,
    pub(crate) obstacles: BTreeMap<ElementId, Obstacle>,
    pub(crate) links: BTreeMap<ElementId, Link>,
    dependents: HashMap<ElementId, BTreeSet<ElementId>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            bodies: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            links: BTreeMap::new(),
            dependents: HashMap::new(),
        }
    }

    pub fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Next id that will be handed out.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Moves the id counter forward so restored ids cannot be reissued.
    pub(crate) fn reserve_through(&mut self, id: u64) {
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    pub fn kind_of(&self, id: ElementId) -> Option<ElementKind> {
        if self.bodies.contains_key(&id) {
            Some(ElementKind::Body)
        } else if self.obstacles.contains_key(&id) {
            Some(ElementKind::Obstacle)
        } else if self.links.contains_key(&id) {
            Some(ElementKind::Link)
        } else {
            None
        }
    }

    pub fn zone_of(&self, id: ElementId) -> Option<Zone> {
        self.bodies
            .get(&id)
            .map(|b| b.zone)
            .or_else(|| self.obstacles.get(&id).map(|o| o.zone))
            .or_else(|| self.links.get(&id).map(|l| l.zone))
    }

    pub fn insert_body(&mut self, body: Body) {
        self.reserve_through(body.id.0);
        self.bodies.insert(body.id, body);
    }

    pub fn insert_obstacle(&mut self, obstacle: Obstacle) {
        self.reserve_through(obstacle.id.0);
        self.obstacles.insert(obstacle.id, obstacle);
    }

    /// Inserts a link and records it against both endpoint elements.
    pub fn insert_link(&mut self, link: Link) {
        self.reserve_through(link.id.0);
        for endpoint in link.endpoints() {
            self.dependents.entry(endpoint.element()).or_default().insert(link.id);
        }
        self.links.insert(link.id, link);
    }

    /// Links that reference `id`.
    pub fn dependents(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.dependents.get(&id).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Removes an element and, for bodies and obstacles, every link attached to it.
    ///
    /// Returns the removed ids, the element itself first. Empty if `id` is unknown.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        let mut removed = Vec::new();
        match self.kind_of(id) {
            Some(ElementKind::Link) => {
                self.remove_link(id);
                removed.push(id);
            }
            Some(ElementKind::Body) | Some(ElementKind::Obstacle) => {
                self.bodies.remove(&id);
                self.obstacles.remove(&id);
                removed.push(id);
                let links = self.dependents.remove(&id).unwrap_or_default();
                for link in links {
                    self.remove_link(link);
                    removed.push(link);
                }
            }
            None => {}
        }
        removed
    }

    fn remove_link(&mut self, id: ElementId) {
        let Some(link) = self.links.remove(&id) else {
            return;
        };
        for endpoint in link.endpoints() {
            let element = endpoint.element();
            if let Some(set) = self.dependents.get_mut(&element) {
                set.remove(&id);
                if set.is_empty() {
                    self.dependents.remove(&element);
                }
            }
        }
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn bodies_in(&self, zone: Zone) -> impl Iterator<Item = &Body> {
        self.bodies.values().filter(move |b| b.zone == zone)
    }

    pub fn obstacles_in(&self, zone: Zone) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values().filter(move |o| o.zone == zone)
    }

    pub fn links_in(&self, zone: Zone) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.zone == zone)
    }

    pub fn body(&self, id: ElementId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: ElementId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn obstacle(&self, id: ElementId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    pub fn obstacle_mut(&mut self, id: ElementId) -> Option<&mut Obstacle> {
        self.obstacles.get_mut(&id)
    }

    pub fn link(&self, id: ElementId) -> Option<&Link> {
        self.links.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodySpec;
    use crate::link::{Endpoint, LinkSpec};
    use crate::vector::Vector2;

    fn add_body(reg: &mut Registry) -> ElementId {
        let id = reg.allocate_id();
        reg.insert_body(Body::new(id, Zone::Ground, BodySpec::new(Vector2::zero(), 1.0, 1.0)).unwrap());
        id
    }

    fn add_rope(reg: &mut Registry, a: ElementId, b: ElementId) -> ElementId {
        let id = reg.allocate_id();
        let spec = LinkSpec::rope(Endpoint::Body(a), Endpoint::Body(b), 1.0);
        reg.insert_link(Link::new(id, Zone::Ground, spec).unwrap());
        id
    }

    #[test]
    fn removing_a_body_cascades_to_its_links_only() {
        let mut reg = Registry::new();
        let a = add_body(&mut reg);
        let b = add_body(&mut reg);
        let c = add_body(&mut reg);
        let ab = add_rope(&mut reg, a, b);
        let bc = add_rope(&mut reg, b, c);

        let removed = reg.remove(a);
        assert_eq!(removed, vec![a, ab]);
        assert!(reg.link(bc).is_some());
        assert_eq!(reg.dependents(b).collect::<Vec<_>>(), vec![bc]);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut reg = Registry::new();
        let a = add_body(&mut reg);
        reg.remove(a);
        let b = add_body(&mut reg);
        assert!(b > a);
        assert!(reg.remove(a).is_empty());
    }
}
