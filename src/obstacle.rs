use crate::body::{Color, validate_collision_factor};
use crate::error::ValidationError;
use crate::geometry;
use crate::registry::{ElementId, Zone};
use crate::vector::Vector2;

/// One boundary segment of an obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionLine {
    pub start: Vector2,
    pub end: Vector2,
    /// Treat as an infinite line when reflecting (used for the floor).
    pub is_line: bool,
    pub collision_factor: f64,
}

impl CollisionLine {
    pub fn new(start: Vector2, end: Vector2, is_line: bool, collision_factor: f64) -> Self {
        Self {
            start,
            end,
            is_line,
            collision_factor,
        }
    }

    /// `end - start`.
    pub fn vector(&self) -> Vector2 {
        self.end - self.start
    }

    /// Closest point on the segment (or line) to `p`.
    pub fn closest_point(&self, p: Vector2) -> Vector2 {
        geometry::closest_point(self.start, self.end, p, self.is_line).0
    }
}

/// Creation parameters for an [`Obstacle`].
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleSpec {
    pub vertices: [Vector2; 4],
    pub color: Color,
    pub is_line: bool,
    pub collision_factor: f64,
}

impl ObstacleSpec {
    pub fn new(vertices: [Vector2; 4]) -> Self {
        Self {
            vertices,
            color: Color::WHITE,
            is_line: false,
            collision_factor: 1.0,
        }
    }

    /// Axis-aligned box spanning `min..max`.
    pub fn rect(min: Vector2, max: Vector2) -> Self {
        Self::new([
            Vector2::new(min.x, min.y),
            Vector2::new(max.x, min.y),
            Vector2::new(max.x, max.y),
            Vector2::new(min.x, max.y),
        ])
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_line(mut self, is_line: bool) -> Self {
        self.is_line = is_line;
        self
    }

    pub fn with_collision_factor(mut self, collision_factor: f64) -> Self {
        self.collision_factor = collision_factor;
        self
    }
}

/// A static (or externally moved) quadrilateral collider ("wall").
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub id: ElementId,
    pub zone: Zone,
    vertices: [Vector2; 4],
    lines: [CollisionLine; 4],
    position: Vector2,
    pub color: Color,
    is_line: bool,
    collision_factor: f64,
}

impl Obstacle {
    /// Validates the quad and derives its boundary segments.
    pub fn new(id: ElementId, zone: Zone, spec: ObstacleSpec) -> Result<Self, ValidationError> {
        if !geometry::is_simple_quad(&spec.vertices) {
            return Err(ValidationError::DegeneratePolygon);
        }
        let collision_factor = validate_collision_factor(spec.collision_factor)?;
        Ok(Self {
            id,
            zone,
            vertices: spec.vertices,
            lines: build_lines(&spec.vertices, spec.is_line, collision_factor),
            position: geometry::centroid(&spec.vertices),
            color: spec.color,
            is_line: spec.is_line,
            collision_factor,
        })
    }

    pub fn vertices(&self) -> &[Vector2; 4] {
        &self.vertices
    }

    pub fn lines(&self) -> &[CollisionLine; 4] {
        &self.lines
    }

    /// Centroid of the four vertices.
    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn is_line(&self) -> bool {
        self.is_line
    }

    pub fn collision_factor(&self) -> f64 {
        self.collision_factor
    }

    /// Ray-casting parity test against the quad.
    pub fn contains(&self, p: Vector2) -> bool {
        geometry::point_in_polygon(p, &self.vertices)
    }

    /// Moves the obstacle rigidly by `delta`.
    pub fn translate(&mut self, delta: Vector2) {
        for v in self.vertices.iter_mut() {
            *v += delta;
        }
        self.refresh();
    }

    /// Replaces the vertices, keeping the old ones if the new quad is degenerate.
    pub fn set_vertices(&mut self, vertices: [Vector2; 4]) -> Result<(), ValidationError> {
        if !geometry::is_simple_quad(&vertices) {
            return Err(ValidationError::DegeneratePolygon);
        }
        self.vertices = vertices;
        self.refresh();
        Ok(())
    }

    pub fn set_collision_factor(&mut self, factor: f64) -> Result<(), ValidationError> {
        self.collision_factor = validate_collision_factor(factor)?;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.lines = build_lines(&self.vertices, self.is_line, self.collision_factor);
        self.position = geometry::centroid(&self.vertices);
    }
}

fn build_lines(v: &[Vector2; 4], is_line: bool, collision_factor: f64) -> [CollisionLine; 4] {
    [0, 1, 2, 3].map(|i| CollisionLine::new(v[i], v[(i + 1) % 4], is_line, collision_factor))
}

/// A point fixed relative to an obstacle's centroid, usable as a link endpoint.
///
/// Holds the obstacle by id only; it moves with the obstacle and is never
/// pushed by link forces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPoint {
    pub obstacle: ElementId,
    pub offset: Vector2,
}

impl AnchorPoint {
    pub fn new(obstacle: ElementId, offset: Vector2) -> Self {
        Self { obstacle, offset }
    }

    /// Anchor at `world_point` on `obstacle`.
    pub fn at(obstacle: &Obstacle, world_point: Vector2) -> Self {
        Self::new(obstacle.id, world_point - obstacle.position())
    }

    pub fn position(&self, obstacle: &Obstacle) -> Vector2 {
        obstacle.position() + self.offset
    }
}
