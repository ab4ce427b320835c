//! Geometric primitives shared by the obstacle and collision code.

use crate::vector::{EPSILON, Vector2, VectorExt};

/// 2D cross product of two vectors.
pub fn cross(a: Vector2, b: Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Orientation of the triangle `a, b, c`: positive if counter-clockwise.
fn orient(a: Vector2, b: Vector2, c: Vector2) -> f64 {
    cross(b - a, c - a)
}

fn on_segment(a: Vector2, b: Vector2, p: Vector2) -> bool {
    p.x <= a.x.max(b.x) + EPSILON
        && p.x >= a.x.min(b.x) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
}

/// Whether segments `a1-a2` and `b1-b2` touch or cross.
pub fn segments_intersect(a1: Vector2, a2: Vector2, b1: Vector2, b2: Vector2) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear touching cases
    (d1.abs() < EPSILON && on_segment(b1, b2, a1))
        || (d2.abs() < EPSILON && on_segment(b1, b2, a2))
        || (d3.abs() < EPSILON && on_segment(a1, a2, b1))
        || (d4.abs() < EPSILON && on_segment(a1, a2, b2))
}

/// Intersection point of the infinite lines through `a1-a2` and `b1-b2`.
///
/// Returns `None` for parallel (or degenerate) lines.
pub fn line_intersection(a1: Vector2, a2: Vector2, b1: Vector2, b2: Vector2) -> Option<Vector2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = cross(r, s);
    if denom.abs() < EPSILON * EPSILON {
        return None;
    }
    let t = cross(b1 - a1, s) / denom;
    Some(a1 + r * t)
}

/// Closest point to `p` on the segment `start-end` (or the infinite line through them).
///
/// Returns the point and the unclamped projection parameter along `end - start`.
pub fn closest_point(start: Vector2, end: Vector2, p: Vector2, infinite: bool) -> (Vector2, f64) {
    let line = end - start;
    let len_sq = line.mag_sq();
    if len_sq < EPSILON * EPSILON {
        return (start, 0.0);
    }
    let t = (p - start).dot(line) / len_sq;
    let clamped = if infinite { t } else { t.clamp(0.0, 1.0) };
    (start + line * clamped, t)
}

/// Even-odd ray casting test: casts a ray towards +x and counts edge crossings.
pub fn point_in_polygon(p: Vector2, vertices: &[Vector2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = vertices[i];
        let vj = vertices[j];
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = vi.x + (p.y - vi.y) * (vj.x - vi.x) / (vj.y - vi.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed area of a polygon (positive when counter-clockwise).
pub fn signed_area(vertices: &[Vector2]) -> f64 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        sum += cross(vertices[i], vertices[(i + 1) % n]);
    }
    sum * 0.5
}

/// A quadrilateral is usable as a collider when it has area and its opposite edges don't cross.
pub fn is_simple_quad(v: &[Vector2; 4]) -> bool {
    if v.iter().any(|p| !p.all_finite()) {
        return false;
    }
    if signed_area(v).abs() < EPSILON {
        return false;
    }
    // Edges 0-1 / 2-3 and 1-2 / 3-0 are the only non-adjacent pairs.
    !segments_intersect(v[0], v[1], v[2], v[3]) && !segments_intersect(v[1], v[2], v[3], v[0])
}

/// Arithmetic mean of the vertices.
pub fn centroid(vertices: &[Vector2]) -> Vector2 {
    let sum = vertices.iter().fold(Vector2::zero(), |acc, v| acc + *v);
    sum / vertices.len().max(1) as f64
}
