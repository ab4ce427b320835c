use crate::body::BodySpec;
use crate::config::PhysicalConstants;
use crate::vector::Vector2;

/// Mass of the central body placed by [`uniform_disc`].
pub const DISC_CENTRAL_MASS: f64 = 1e14;

/// Generates `n` body specs in a uniform disc around a heavy central body.
/// - Places the central body at the origin.
/// - Scatters the rest with uniform area density between the inner and outer radius.
/// - Gives each a circular-orbit velocity from the mass enclosed by its orbit.
///
/// Deterministic for a given `seed`.
pub fn uniform_disc(n: usize, seed: u64, constants: &PhysicalConstants) -> Vec<BodySpec> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let inner_radius = 25.0;
    let outer_radius = (n as f64).sqrt() * 5.0 + inner_radius;

    let mut specs = Vec::with_capacity(n);
    if n == 0 {
        return specs;
    }
    specs.push(BodySpec::new(Vector2::zero(), inner_radius, DISC_CENTRAL_MASS));

    while specs.len() < n {
        let a = rng.f64() * std::f64::consts::TAU;
        let (sin, cos) = a.sin_cos();

        let t = inner_radius / outer_radius;
        let r = rng.f64() * (1.0 - t * t) + t * t;
        let position = Vector2::new(cos, sin) * outer_radius * r.sqrt();

        // unit tangent, scaled once the enclosed mass is known
        let velocity = Vector2::new(-sin, cos);
        specs.push(BodySpec::new(position, 1.0, 1.0).with_velocity(velocity));
    }

    specs.sort_by(|a, b| a.position.mag_sq().total_cmp(&b.position.mag_sq()));

    let mut enclosed = 0.0;
    for spec in specs.iter_mut() {
        enclosed += spec.mass;
        let dist = spec.position.mag();
        if dist == 0.0 {
            continue;
        }
        spec.velocity *= (constants.gravitational_constant * enclosed / dist).sqrt();
    }

    specs
}

/// A `cols` x `rows` grid of equal balls with its lower-left ball at `origin`.
pub fn ball_grid(cols: usize, rows: usize, origin: Vector2, radius: f64, gap: f64) -> Vec<BodySpec> {
    let pitch = 2.0 * radius + gap;
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (col, row)))
        .map(|(col, row)| {
            let offset = Vector2::new(col as f64 * pitch, row as f64 * pitch);
            BodySpec::new(origin + offset, radius, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_is_deterministic_and_sized() {
        let constants = PhysicalConstants::default();
        let a = uniform_disc(64, 3, &constants);
        let b = uniform_disc(64, 3, &constants);
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert_eq!(a[0].mass, DISC_CENTRAL_MASS);
    }

    #[test]
    fn orbits_are_tangential() {
        let disc = uniform_disc(32, 1, &PhysicalConstants::default());
        for spec in &disc[1..] {
            assert!(spec.position.dot(spec.velocity).abs() < 1e-6 * spec.position.mag() * spec.velocity.mag());
        }
    }

    #[test]
    fn grid_spacing() {
        let grid = ball_grid(3, 2, Vector2::new(0.0, 10.0), 1.0, 0.5);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[1].position, Vector2::new(2.5, 10.0));
        assert_eq!(grid[3].position, Vector2::new(0.0, 12.5));
    }
}
