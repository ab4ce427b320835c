//! Collision detection and response.
//!
//! Per frame, in this order:
//! 1. body-body pairs (broad phase through `broccoli`, then [`rebound_by_ball`]);
//! 2. bodies inside an obstacle ([`rebound_by_wall`]);
//! 3. ground mode only: the floor's segments and interior;
//! 4. for obstacles the body is not inside: vertices, then edges.
//!
//! Every normal is guarded against zero length; coincident centers fall back
//! to a random +/-x axis and other degenerate cases to a fixed axis.

use broccoli::aabb::Rect;

use crate::body::Body;
use crate::config::Tuning;
use crate::obstacle::{CollisionLine, Obstacle};
use crate::vector::{Vector2, VectorExt};

/// Normals within this angle of vertical (|n.y| above it) count as stacked.
const STACKED_NORMAL_Y: f64 = 0.7;

/// Frame-constant inputs of the contact solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactParams {
    pub min_separation_speed: f64,
    pub separation_overshoot: f64,
    pub wall_push: f64,
    pub vertex_correction: f64,
    pub epsilon: f64,
    /// Global restitution multiplier from the environment.
    pub collision_factor: f64,
    /// Downward acceleration currently acting on bodies.
    pub gravity: f64,
}

impl ContactParams {
    pub fn new(tuning: &Tuning, collision_factor: f64, gravity: f64) -> Self {
        Self {
            min_separation_speed: tuning.min_separation_speed,
            separation_overshoot: tuning.separation_overshoot,
            wall_push: tuning.wall_push,
            vertex_correction: tuning.vertex_correction,
            epsilon: tuning.epsilon,
            collision_factor,
            gravity,
        }
    }
}

impl Default for ContactParams {
    fn default() -> Self {
        Self::new(&Tuning::default(), 1.0, 0.0)
    }
}

fn unit_or(v: Vector2, epsilon: f64, fallback: Vector2) -> Vector2 {
    let mag = v.mag();
    if mag < epsilon { fallback } else { v / mag }
}

fn random_axis(rng: &mut fastrand::Rng) -> Vector2 {
    if rng.bool() {
        Vector2::unit_x()
    } else {
        -Vector2::unit_x()
    }
}

/// Whether two bodies overlap.
pub fn touching(a: &Body, b: &Body) -> bool {
    let reach = a.radius() + b.radius();
    (b.position - a.position).mag_sq() < reach * reach
}

/// Candidate overlapping pairs `(i, j)` with `i < j`, sorted.
///
/// Uses f32 AABBs padded for rounding; the narrow phase decides in f64.
pub fn broad_phase(bodies: &[&mut Body]) -> Vec<(usize, usize)> {
    let mut rects = bodies
        .iter()
        .enumerate()
        .map(|(index, body)| {
            let pos = body.position;
            let pad = body.radius() + 1.0 + pos.x.abs().max(pos.y.abs()) * 1e-6;
            let min = pos - Vector2::new(pad, pad);
            let max = pos + Vector2::new(pad, pad);
            (
                Rect::new(min.x as f32, max.x as f32, min.y as f32, max.y as f32),
                index,
            )
        })
        .collect::<Vec<_>>();

    let mut pairs = Vec::new();
    let mut broccoli = broccoli::Tree::new(&mut rects);

    broccoli.find_colliding_pairs(|i, j| {
        let i = *i.unpack_inner();
        let j = *j.unpack_inner();
        pairs.push((i.min(j), i.max(j)));
    });

    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Splits out mutable references to two distinct entries.
pub(crate) fn pair_mut<'a, T>(items: &'a mut [T], i: usize, j: usize) -> (&'a mut T, &'a mut T) {
    debug_assert!(i != j);
    if i < j {
        let (left, right) = items.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

/// Split of a separation-speed deficit between `a` and `b` along `normal` (a->b).
///
/// Mass-weighted by default. A vertically stacked pair under gravity puts
/// the whole push on the upper body so resting stacks don't glue together.
fn separation_shares(normal: Vector2, ma: f64, mb: f64, gravity: f64) -> (f64, f64) {
    if gravity > 0.0 && normal.y.abs() > STACKED_NORMAL_Y {
        if normal.y > 0.0 { (0.0, 1.0) } else { (1.0, 0.0) }
    } else {
        let total = ma + mb;
        (mb / total, ma / total)
    }
}

/// Bounces two overlapping bodies off each other.
///
/// The normal components follow a 1D collision with restitution
/// `a.cf * b.cf * global`; tangential components are untouched. Penetration is
/// removed along the normal, inverse-mass weighted, with a small overshoot.
/// An overlapping pair with no relative normal motion gets the minimum
/// separation speed; an approaching pair never gains energy beyond its
/// restitution. Returns `false` if the bodies don't overlap.
pub fn rebound_by_ball(a: &mut Body, b: &mut Body, params: &ContactParams, rng: &mut fastrand::Rng) -> bool {
    let delta = b.position - a.position;
    let dist = delta.mag();
    let reach = a.radius() + b.radius();
    if dist >= reach {
        return false;
    }

    let normal = if dist < params.epsilon {
        random_axis(rng)
    } else {
        delta / dist
    };
    let (ma, mb) = (a.mass(), b.mass());
    let total = ma + mb;
    let restitution = a.collision_factor * b.collision_factor * params.collision_factor;

    let van = a.velocity.dot(normal);
    let vbn = b.velocity.dot(normal);
    let (mut new_van, mut new_vbn) = (van, vbn);

    if van > vbn {
        let momentum = ma * van + mb * vbn;
        new_van = (momentum + mb * restitution * (vbn - van)) / total;
        new_vbn = (momentum + ma * restitution * (van - vbn)) / total;
    } else if vbn - van <= 0.0 {
        // resting overlap: kick the pair apart so it cannot stay glued
        let deficit = params.min_separation_speed - (vbn - van);
        let (share_a, share_b) = separation_shares(normal, ma, mb, params.gravity);
        new_van -= deficit * share_a;
        new_vbn += deficit * share_b;
    }

    a.velocity += normal * (new_van - van);
    b.velocity += normal * (new_vbn - vbn);

    let correction = (reach - dist) * params.separation_overshoot;
    a.position -= normal * (correction * mb / total);
    b.position += normal * (correction * ma / total);
    true
}

/// Bounces a body off a segment (or infinite line when `line.is_line`).
///
/// The body is displaced by `p * (1 + min(1, p / r))` for penetration `p`,
/// so deep penetrations are pushed out harder.
pub fn rebound_by_line(body: &mut Body, line: &CollisionLine, params: &ContactParams) -> bool {
    let closest = line.closest_point(body.position);
    let delta = body.position - closest;
    let penetration = body.radius() - delta.mag();
    if penetration <= 0.0 {
        return false;
    }

    let fallback = unit_or(line.vector().perpendicular(), params.epsilon, Vector2::unit_y());
    let normal = unit_or(delta, params.epsilon, fallback);
    let restitution = body.collision_factor * line.collision_factor * params.collision_factor;

    body.velocity = body.velocity.bounce_off(normal, restitution);
    let depth = (penetration / body.radius()).min(1.0);
    body.position += normal * (penetration * (1.0 + depth));
    true
}

/// Pushes a body whose center lies inside `obstacle` back out.
///
/// Treated as a resting contact: the body moves along centroid->center by
/// `wall_push` of that vector and its velocity is reflected about it.
pub fn rebound_by_wall(body: &mut Body, obstacle: &Obstacle, params: &ContactParams) -> bool {
    if !obstacle.contains(body.position) {
        return false;
    }
    let outward = body.position - obstacle.position();
    let normal = unit_or(outward, params.epsilon, Vector2::unit_y());
    let push = if outward.mag() < params.epsilon {
        normal * body.radius()
    } else {
        outward
    };
    let restitution = body.collision_factor * obstacle.collision_factor() * params.collision_factor;

    body.position += push * params.wall_push;
    body.velocity = body.velocity.bounce_off(normal, restitution);
    true
}

/// Resolves overlap between a body and any obstacle vertex.
pub fn check_vertex_collision(body: &mut Body, obstacle: &Obstacle, params: &ContactParams) -> bool {
    let restitution = body.collision_factor * obstacle.collision_factor() * params.collision_factor;
    let mut hit = false;
    for &vertex in obstacle.vertices() {
        let delta = body.position - vertex;
        let penetration = body.radius() - delta.mag();
        if penetration <= 0.0 {
            continue;
        }
        let away = unit_or(body.position - obstacle.position(), params.epsilon, Vector2::unit_y());
        let normal = unit_or(delta, params.epsilon, away);
        body.velocity = body.velocity.bounce_off(normal, restitution);
        body.position += normal * (penetration * params.vertex_correction);
        hit = true;
    }
    hit
}

/// Vertex and edge contacts for a body outside `obstacle`. Edges are skipped
/// when a vertex already handled the contact.
pub fn rebound_by_outline(body: &mut Body, obstacle: &Obstacle, params: &ContactParams) -> bool {
    if obstacle.contains(body.position) {
        return false;
    }
    if check_vertex_collision(body, obstacle, params) {
        return true;
    }
    let mut hit = false;
    for line in obstacle.lines() {
        hit |= rebound_by_line(body, line, params);
    }
    hit
}

/// Bounces every overlapping body pair. Returns the number of contacts.
pub fn resolve_body_pairs(bodies: &mut [&mut Body], params: &ContactParams, rng: &mut fastrand::Rng) -> usize {
    let mut contacts = 0;
    for (i, j) in broad_phase(bodies) {
        let (a, b) = pair_mut(bodies, i, j);
        if rebound_by_ball(a, b, params, rng) {
            contacts += 1;
        }
    }
    contacts
}

/// Obstacle passes 2-4 for every body.
pub fn resolve_obstacles(
    bodies: &mut [&mut Body],
    walls: &[&Obstacle],
    floor: Option<&Obstacle>,
    params: &ContactParams,
) -> usize {
    let mut contacts = 0;
    for body in bodies.iter_mut() {
        let body: &mut Body = body;
        for wall in walls {
            contacts += rebound_by_wall(body, wall, params) as usize;
        }
        if let Some(floor) = floor {
            for line in floor.lines() {
                contacts += rebound_by_line(body, line, params) as usize;
            }
            contacts += rebound_by_wall(body, floor, params) as usize;
        }
        for wall in walls {
            contacts += rebound_by_outline(body, wall, params) as usize;
        }
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodySpec;
    use crate::obstacle::ObstacleSpec;
    use crate::registry::{ElementId, Zone};

    fn ball(id: u64, x: f64, y: f64, vx: f64, vy: f64) -> Body {
        let spec = BodySpec::new(Vector2::new(x, y), 1.0, 1.0).with_velocity(Vector2::new(vx, vy));
        Body::new(ElementId(id), Zone::Ground, spec).unwrap()
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut v = [1, 2, 3];
        let (a, b) = pair_mut(&mut v, 2, 0);
        assert_eq!((*a, *b), (3, 1));
    }

    #[test]
    fn broad_phase_finds_only_near_pairs() {
        let mut a = ball(1, 0.0, 0.0, 0.0, 0.0);
        let mut b = ball(2, 1.5, 0.0, 0.0, 0.0);
        let mut c = ball(3, 100.0, 0.0, 0.0, 0.0);
        let bodies = [&mut a, &mut b, &mut c];
        assert_eq!(broad_phase(&bodies), vec![(0, 1)]);
    }

    #[test]
    fn coincident_bodies_separate_along_x() {
        let mut a = ball(1, 0.0, 0.0, 0.0, 0.0);
        let mut b = ball(2, 0.0, 0.0, 0.0, 0.0);
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(rebound_by_ball(&mut a, &mut b, &ContactParams::default(), &mut rng));
        assert!(a.position.y.abs() < 1e-12 && b.position.y.abs() < 1e-12);
        assert!((b.position.x - a.position.x).abs() > 2.0);
    }

    #[test]
    fn resting_pair_gets_minimum_separation_speed() {
        let mut a = ball(1, 0.0, 0.0, 0.0, 0.0);
        let mut b = ball(2, 1.9, 0.0, 0.0, 0.0);
        let mut rng = fastrand::Rng::with_seed(1);
        rebound_by_ball(&mut a, &mut b, &ContactParams::default(), &mut rng);
        let separation = b.velocity.x - a.velocity.x;
        assert!((separation - 1.0).abs() < 1e-12);
        // momentum still balanced for a side-by-side pair
        assert!((a.momentum() + b.momentum()).mag() < 1e-12);
    }

    #[test]
    fn stacked_pair_pushes_the_upper_body() {
        let mut lower = ball(1, 0.0, 0.0, 0.0, 0.0);
        let mut upper = ball(2, 0.0, 1.9, 0.0, 0.0);
        let mut rng = fastrand::Rng::with_seed(1);
        let params = ContactParams::new(&Tuning::default(), 1.0, 9.8);
        rebound_by_ball(&mut lower, &mut upper, &params, &mut rng);
        assert_eq!(lower.velocity, Vector2::zero());
        assert!(upper.velocity.y > 0.0);
    }

    #[test]
    fn inelastic_pair_does_not_gain_energy() {
        let mut a = ball(1, 0.0, 0.0, 0.5, 0.0);
        let mut b = ball(2, 1.9, 0.0, 0.0, 0.0);
        a.collision_factor = 0.0;
        b.collision_factor = 0.0;
        let before = a.kinetic_energy() + b.kinetic_energy();
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(rebound_by_ball(&mut a, &mut b, &ContactParams::default(), &mut rng));
        assert!((a.velocity.x - 0.25).abs() < 1e-12);
        assert!((b.velocity.x - 0.25).abs() < 1e-12);
        assert!(a.kinetic_energy() + b.kinetic_energy() <= before);
    }

    fn square() -> Obstacle {
        let spec = ObstacleSpec::rect(Vector2::new(0.0, 0.0), Vector2::new(10.0, 10.0));
        Obstacle::new(ElementId(9), Zone::Ground, spec).unwrap()
    }

    #[test]
    fn wall_pushes_out_along_centroid_axis() {
        let wall = square();
        let mut b = ball(1, 6.0, 5.0, -2.0, 1.0);
        assert!(rebound_by_wall(&mut b, &wall, &ContactParams::default()));
        // 0.1 * ((6, 5) - (5, 5))
        assert!((b.position - Vector2::new(6.1, 5.0)).mag() < 1e-12);
        assert!((b.velocity - Vector2::new(2.0, 1.0)).mag() < 1e-12);

        let mut outside = ball(2, 12.0, 5.0, -2.0, 0.0);
        assert!(!rebound_by_wall(&mut outside, &wall, &ContactParams::default()));
        assert_eq!(outside.position, Vector2::new(12.0, 5.0));
    }

    #[test]
    fn vertex_contact_corrects_by_tuned_multiple() {
        let wall = square();
        let spec = BodySpec::new(Vector2::new(11.0, 11.0), 2.0, 1.0).with_velocity(Vector2::new(-1.0, -1.0));
        let mut b = Body::new(ElementId(1), Zone::Ground, spec).unwrap();
        assert!(check_vertex_collision(&mut b, &wall, &ContactParams::default()));

        let penetration = 2.0 - 2f64.sqrt();
        let along = 1.1 * penetration / 2f64.sqrt();
        assert!((b.position - Vector2::new(11.0 + along, 11.0 + along)).mag() < 1e-12);
        assert!((b.velocity - Vector2::new(1.0, 1.0)).mag() < 1e-12);
    }

    #[test]
    fn outline_is_skipped_while_inside() {
        let wall = square();
        let mut b = ball(1, 9.5, 5.0, 3.0, 0.0);
        assert!(!rebound_by_outline(&mut b, &wall, &ContactParams::default()));
        assert_eq!(b.position, Vector2::new(9.5, 5.0));

        // only the interior push applies, the edge at x = 10 is not bounced off
        let contacts = resolve_obstacles(&mut [&mut b], &[&wall], None, &ContactParams::default());
        assert_eq!(contacts, 1);
        assert!((b.position - Vector2::new(9.95, 5.0)).mag() < 1e-12);
        assert_eq!(b.velocity, Vector2::new(3.0, 0.0));
    }

    #[test]
    fn line_bounce_reflects_normal_component() {
        let line = CollisionLine::new(Vector2::new(-10.0, 0.0), Vector2::new(10.0, 0.0), false, 1.0);
        let mut b = ball(1, 0.0, 0.5, 3.0, -4.0);
        assert!(rebound_by_line(&mut b, &line, &ContactParams::default()));
        assert!((b.velocity.x - 3.0).abs() < 1e-12);
        assert!((b.velocity.y - 4.0).abs() < 1e-12);
        // penetration 0.5 of radius 1 -> displaced 0.5 * 1.5
        assert!((b.position.y - 1.25).abs() < 1e-12);
    }

    #[test]
    fn finite_segment_misses_beyond_its_end() {
        let line = CollisionLine::new(Vector2::new(-10.0, 0.0), Vector2::new(10.0, 0.0), false, 1.0);
        let mut b = ball(1, 12.0, 0.5, 0.0, -1.0);
        assert!(!rebound_by_line(&mut b, &line, &ContactParams::default()));
        let infinite = CollisionLine::new(Vector2::new(-10.0, 0.0), Vector2::new(10.0, 0.0), true, 1.0);
        assert!(rebound_by_line(&mut b, &infinite, &ContactParams::default()));
    }
}
