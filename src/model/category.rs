//! Labeling categories.

use serde::{Deserialize, Serialize};

/// A labeling category. The color is part of the model rather than the
/// view because committed masks for a category must composite the same
/// way in every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    /// RGBA tint applied to this category's committed masks.
    pub color: [f32; 4],
}

impl Category {
    /// Create a category with a color derived deterministically from the id.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color_for_id(id),
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// Per-id display color: ids step around the hue wheel by the golden
/// angle, so consecutive ids land far apart and stay distinguishable.
fn color_for_id(id: u32) -> [f32; 4] {
    let hue = (id as f32 * 137.508) % 360.0;
    let (r, g, b) = hue_to_rgb(hue, 0.7, 0.9);
    [r, g, b, 0.7]
}

/// HSV to RGB for hue in degrees, saturation and value in 0..1.
fn hue_to_rgb(hue: f32, saturation: f32, value: f32) -> (f32, f32, f32) {
    let chroma = value * saturation;
    let x = chroma * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let base = value - chroma;
    let (r, g, b) = match (hue / 60.0) as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    (r + base, g + base, b + base)
}
