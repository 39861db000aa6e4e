//! Core geometry types for the annotation canvas.
//!
//! All coordinates in this module live in the normalized 640x480 annotation
//! space unless a function says otherwise. Values may drift outside that
//! range during an active drag; geometry never clamps stored values.

use serde::{Deserialize, Serialize};

use crate::constants::norm;

/// Minimum number of vertices a polygon must keep through any edit.
pub const MIN_POLYGON_VERTICES: usize = 3;

// ============================================================================
// Point
// ============================================================================

/// A 2D point in normalized annotation coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation between `self` and `other` at parameter `t`.
    pub fn lerp(&self, other: &Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Whether the point lies inside the nominal normalized space.
    ///
    /// Transient out-of-range points are legal during drags; callers use
    /// this to decide whether to warn, never to reject.
    pub fn in_normalized_bounds(&self) -> bool {
        self.x >= 0.0 && self.x <= norm::WIDTH && self.y >= 0.0 && self.y <= norm::HEIGHT
    }
}

/// Distance from `p` to the segment `a..b`, plus the clamped projection
/// parameter `t` in `[0, 1]`.
///
/// Degenerate segments (a == b) project everything onto `a` with `t = 0`.
pub fn point_to_segment(p: &Point, a: &Point, b: &Point) -> (f32, f32) {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f32::EPSILON {
        return (p.distance_to(a), 0.0);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + abx * t, a.y + aby * t);
    (p.distance_to(&proj), t)
}

// ============================================================================
// BoundingBox
// ============================================================================

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner X coordinate
    pub x: f32,
    /// Top-left corner Y coordinate
    pub y: f32,
    /// Width of the box
    pub width: f32,
    /// Height of the box
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

// ============================================================================
// Polygon
// ============================================================================

/// An ordered, cyclic sequence of vertices; edges connect consecutive
/// vertices and close last-to-first.
///
/// Edit operations uphold one invariant: once a polygon has at least
/// [`MIN_POLYGON_VERTICES`] vertices, no operation reduces it below that.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new() -> Self {
        Self { vertices: Vec::new() }
    }

    pub fn from_vertices(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// A closed polygon needs at least three vertices.
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= MIN_POLYGON_VERTICES
    }

    pub fn vertex(&self, index: usize) -> Option<&Point> {
        self.vertices.get(index)
    }

    /// Replace vertex `index` with `point`. Out-of-range points are stored
    /// as-is; rendering clamps, storage does not.
    pub fn move_vertex(&mut self, index: usize, point: Point) -> bool {
        match self.vertices.get_mut(index) {
            Some(v) => {
                *v = point;
                true
            }
            None => false,
        }
    }

    /// Insert `point` immediately after vertex `index` (i.e. on the edge
    /// from `index` to `index + 1`). Returns the index of the new vertex.
    pub fn insert_after(&mut self, index: usize, point: Point) -> Option<usize> {
        if index >= self.vertices.len() {
            return None;
        }
        let at = index + 1;
        self.vertices.insert(at, point);
        Some(at)
    }

    /// Remove vertex `index`, refusing to shrink a valid polygon below
    /// [`MIN_POLYGON_VERTICES`]. Returns whether a vertex was removed.
    pub fn remove_vertex(&mut self, index: usize) -> bool {
        if index >= self.vertices.len() || self.vertices.len() <= MIN_POLYGON_VERTICES {
            return false;
        }
        self.vertices.remove(index);
        true
    }

    /// Axis-aligned bounds of the vertices.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for p in &self.vertices {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

// ============================================================================
// Tests
// ============================================================================
