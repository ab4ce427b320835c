//! Pairwise natural forces: Newtonian gravitation and electrostatics.
//!
//! Both laws use `F = k * a * b / (d^2 + softening)` with `d` floored at 1 to
//! keep close encounters finite. Results are pushed onto `natural_forces` as
//! equal and opposite pairs, once per unordered pair.

use crate::body::Body;
use crate::config::PhysicalConstants;
use crate::vector::{EPSILON, Vector2};

/// Minimum separation used by the pairwise laws.
pub const MIN_FORCE_DISTANCE: f64 = 1.0;

/// Contribution of one unordered pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PairForce {
    /// Force on the first body; the second receives the negation.
    pub on_first: Vector2,
}

/// Unit axis from `a` to `b` and the floored distance.
fn axis(a: Vector2, b: Vector2) -> (Vector2, f64) {
    let delta = b - a;
    let dist = delta.mag();
    let dir = if dist < EPSILON {
        Vector2::unit_x()
    } else {
        delta / dist
    };
    (dir, dist.max(MIN_FORCE_DISTANCE))
}

/// Attractive gravitation between two bodies that both have `gravitation` set.
pub fn gravitation(a: &Body, b: &Body, constants: &PhysicalConstants) -> Option<PairForce> {
    if !(a.gravitation && b.gravitation) {
        return None;
    }
    let (dir, d) = axis(a.position, b.position);
    let magnitude = constants.gravitational_constant * a.mass() * b.mass() / (d * d + constants.softening);
    Some(PairForce {
        on_first: dir * magnitude,
    })
}

/// Coulomb force between two charged bodies: like charges repel.
pub fn electrostatic(a: &Body, b: &Body, constants: &PhysicalConstants) -> Option<PairForce> {
    if a.electric_charge == 0.0 || b.electric_charge == 0.0 {
        return None;
    }
    let (dir, d) = axis(a.position, b.position);
    let magnitude =
        constants.coulomb_constant * a.electric_charge * b.electric_charge / (d * d + constants.softening);
    Some(PairForce {
        on_first: -dir * magnitude,
    })
}

/// Adds gravitation and electrostatic forces for every unordered pair of `bodies`.
pub fn accumulate(bodies: &mut [&mut Body], constants: &PhysicalConstants) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&*bodies[i], &*bodies[j]);
            let pair = [gravitation(a, b, constants), electrostatic(a, b, constants)];
            for force in pair.into_iter().flatten() {
                bodies[i].apply_force(force.on_first, true);
                bodies[j].apply_force(-force.on_first, true);
            }
        }
    }
}
