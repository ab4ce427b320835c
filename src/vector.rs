//! 2D vector value type used throughout the core.
//!
//! `Vector2` is `ultraviolet::DVec2`: a `Copy` value, so every operation
//! yields a new vector and no two bodies can alias the same instance.

pub use ultraviolet::DVec2 as Vector2;

/// Lengths below this are treated as zero when normalizing.
pub const EPSILON: f64 = 1e-5;

/// Extra vector operations the physics code needs on top of `DVec2`.
pub trait VectorExt: Sized {
    /// Unit vector in the same direction, or `fallback` if the length is below `EPSILON`.
    fn normalized_or(self, fallback: Self) -> Self;
    /// Component of `self` along `onto`. Zero if `onto` is degenerate.
    fn projected_onto(self, onto: Self) -> Self;
    /// Euclidean distance between two points.
    fn distance_to(self, other: Self) -> f64;
    /// Counter-clockwise perpendicular.
    fn perpendicular(self) -> Self;
    /// Reflects the part of `self` moving into `normal`, keeping `restitution` of it.
    ///
    /// `normal` must be unit length. Velocities already leaving the surface
    /// are returned unchanged.
    fn bounce_off(self, normal: Self, restitution: f64) -> Self;
    /// Both components finite.
    fn all_finite(self) -> bool;
}

impl VectorExt for Vector2 {
    fn normalized_or(self, fallback: Self) -> Self {
        let mag = self.mag();
        if mag < EPSILON {
            fallback
        } else {
            self / mag
        }
    }

    fn projected_onto(self, onto: Self) -> Self {
        let mag_sq = onto.mag_sq();
        if mag_sq < EPSILON * EPSILON {
            return Vector2::zero();
        }
        onto * (self.dot(onto) / mag_sq)
    }

    fn distance_to(self, other: Self) -> f64 {
        (self - other).mag()
    }

    fn perpendicular(self) -> Self {
        Vector2::new(-self.y, self.x)
    }

    fn bounce_off(self, normal: Self, restitution: f64) -> Self {
        let into = self.dot(normal);
        if into >= 0.0 {
            return self;
        }
        self - normal * ((1.0 + restitution) * into)
    }

    fn all_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

pub(crate) fn to_array(v: Vector2) -> [f64; 2] {
    [v.x, v.y]
}

pub(crate) fn from_array(a: [f64; 2]) -> Vector2 {
    Vector2::new(a[0], a[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_or_falls_back_on_zero() {
        let n = Vector2::zero().normalized_or(Vector2::unit_x());
        assert_eq!(n, Vector2::unit_x());
        let n = Vector2::new(3.0, 4.0).normalized_or(Vector2::unit_x());
        assert!((n.mag() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn projection_keeps_parallel_part() {
        let p = Vector2::new(3.0, 4.0).projected_onto(Vector2::new(10.0, 0.0));
        assert!((p.x - 3.0).abs() < 1e-12 && p.y.abs() < 1e-12);
    }

    #[test]
    fn bounce_off_is_lossy_with_restitution_below_one() {
        let v = Vector2::new(2.0, -4.0).bounce_off(Vector2::unit_y(), 0.5);
        assert!((v.x - 2.0).abs() < 1e-12);
        assert!((v.y - 2.0).abs() < 1e-12);
        // already separating
        let v = Vector2::new(2.0, 4.0).bounce_off(Vector2::unit_y(), 0.5);
        assert_eq!(v, Vector2::new(2.0, 4.0));
    }
}
