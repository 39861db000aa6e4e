//! Prompt types sent to the segmentation predictor.
//!
//! Prompts are always expressed in the normalized 640x480 space; the
//! serialized field names are the predictor wire contract.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A single positive or negative point prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointPrompt {
    pub x: f32,
    pub y: f32,
    /// True marks foreground, false marks background to exclude.
    pub is_positive: bool,
}

impl PointPrompt {
    pub fn new(point: Point, is_positive: bool) -> Self {
        Self {
            x: point.x,
            y: point.y,
            is_positive,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A box prompt with corners normalized so `x1 < x2` and `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxPrompt {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoxPrompt {
    /// Build from two corner clicks in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

/// Which prompt family a prediction request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Point,
    Box,
}
