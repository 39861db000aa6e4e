//! Screen/normalized coordinate mapping.
//!
//! This module contains the mathematical functions bridging the fixed
//! 640x480 normalized annotation space and whatever surface the frame is
//! currently displayed on, extracted for testability and reusability.

use crate::constants::norm;
use crate::geometry::Point;

/// Placement of a frame image inside the canvas viewport.
///
/// Derived once per loaded image by aspect-fitting the source into the
/// viewport (letterbox/pillarbox); replaced, never mutated, when the image
/// or the viewport changes. Owned by the canvas controller, read by
/// everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    /// Drawn image width in screen pixels.
    pub draw_width: f32,
    /// Drawn image height in screen pixels.
    pub draw_height: f32,
    /// Left edge of the drawn image in the viewport.
    pub offset_x: f32,
    /// Top edge of the drawn image in the viewport.
    pub offset_y: f32,
    /// Source frame width in pixels.
    pub source_width: f32,
    /// Source frame height in pixels.
    pub source_height: f32,
}

impl DisplayTransform {
    /// Fit a `source_width` x `source_height` frame into a viewport,
    /// preserving aspect ratio and centering the leftover space.
    pub fn fit(
        source_width: f32,
        source_height: f32,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Self {
        let scale = (viewport_width / source_width).min(viewport_height / source_height);
        let draw_width = source_width * scale;
        let draw_height = source_height * scale;
        Self {
            draw_width,
            draw_height,
            offset_x: (viewport_width - draw_width) / 2.0,
            offset_y: (viewport_height - draw_height) / 2.0,
            source_width,
            source_height,
        }
    }

    /// Map a normalized point onto the display surface.
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(
            (p.x / norm::WIDTH) * self.draw_width + self.offset_x,
            (p.y / norm::HEIGHT) * self.draw_height + self.offset_y,
        )
    }

    /// Map a screen position into the normalized space.
    ///
    /// Exact inverse of [`to_screen`](Self::to_screen). No clamping happens
    /// here: positions outside the image map to out-of-range normalized
    /// values, and callers decide whether to reject them.
    pub fn to_normalized(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.draw_width * norm::WIDTH,
            (p.y - self.offset_y) / self.draw_height * norm::HEIGHT,
        )
    }

    /// Whether a screen position falls on the drawn image (not the
    /// letterbox bars).
    pub fn is_inside_image(&self, p: Point) -> bool {
        p.x >= self.offset_x
            && p.x <= self.offset_x + self.draw_width
            && p.y >= self.offset_y
            && p.y <= self.offset_y + self.draw_height
    }
}
