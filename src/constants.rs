//! Global constants for the annotation core.
//!
//! The normalized annotation space and the foreground threshold are hard
//! compatibility contracts with the segmentation predictor and the export
//! collaborators; they are named here and validated at module boundaries
//! rather than enforced by convention.

/// Normalized annotation space dimensions.
///
/// Every persisted prompt, polygon vertex, and mask is expressed in this
/// fixed 640x480 coordinate system so annotations are independent of any
/// display size.
pub mod norm {
    /// Width of the normalized annotation space.
    pub const WIDTH: f32 = 640.0;
    /// Height of the normalized annotation space.
    pub const HEIGHT: f32 = 480.0;
}

/// Raster mask dimensions and binarization thresholds.
pub mod mask {
    /// Required mask width in pixels.
    pub const WIDTH: u32 = 640;
    /// Required mask height in pixels.
    pub const HEIGHT: u32 = 480;
    /// A pixel is foreground when its intensity exceeds this value.
    pub const FOREGROUND_THRESHOLD: u8 = 128;
    /// Fallback threshold applied when the high threshold finds no
    /// foreground at all (low-contrast or anti-aliased masks).
    pub const FALLBACK_THRESHOLD: u8 = 0;
    /// Intensity written for foreground pixels when rasterizing.
    pub const FOREGROUND_VALUE: u8 = 255;
}

/// Polygon editor hit-testing and rendering radii (screen pixels).
pub mod hit {
    /// Radius used when drawing vertex handles.
    pub const NODE_RADIUS: f32 = 6.0;
    /// Pointer-to-vertex distance that counts as a vertex hit.
    pub const NODE_HIT_RADIUS: f32 = 2.0 * NODE_RADIUS;
    /// Pointer-to-edge distance that counts as an edge hit.
    pub const EDGE_HIT_DISTANCE: f32 = 10.0;
}

/// Contour extraction tuning.
pub mod contour {
    /// Maximum distance (pixels) to the next boundary pixel when chaining.
    pub const CHAIN_RADIUS: f32 = 2.0;
    /// Douglas-Peucker perpendicular-distance tolerance (normalized units).
    pub const SIMPLIFY_TOLERANCE: f32 = 1.5;
}

/// Overlay compositing colors and alphas.
pub mod overlay {
    /// RGBA for positive (foreground) prompts and masks.
    pub const POSITIVE: [f32; 4] = [0.1, 0.8, 0.2, 1.0];
    /// RGBA for negative (background) prompts and masks.
    pub const NEGATIVE: [f32; 4] = [0.9, 0.15, 0.15, 1.0];
    /// Alpha for committed annotation masks.
    pub const COMMITTED_ALPHA: f32 = 0.3;
    /// Alpha for the active prediction mask.
    pub const ACTIVE_ALPHA: f32 = 0.6;
    /// Alpha for the polygon body fill.
    pub const POLYGON_FILL_ALPHA: f32 = 0.25;
    /// Marker radius for prompt points.
    pub const PROMPT_RADIUS: f32 = 5.0;
    /// Edge color for the polygon in its normal state.
    pub const EDGE_NORMAL: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
    /// Edge color while hovered.
    pub const EDGE_HOVERED: [f32; 4] = [1.0, 0.85, 0.2, 1.0];
    /// Vertex handle fill in its normal state.
    pub const NODE_NORMAL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    /// Vertex handle fill while hovered.
    pub const NODE_HOVERED: [f32; 4] = [1.0, 0.85, 0.2, 1.0];
    /// Vertex handle fill while selected (dragging).
    pub const NODE_SELECTED: [f32; 4] = [1.0, 0.4, 0.1, 1.0];
    /// Side length of the placeholder marker drawn when a mask fails to
    /// decode.
    pub const PLACEHOLDER_SIZE: f32 = 24.0;
}

/// Prediction session limits.
pub mod session {
    /// Bounded wait for a predictor response before the transport must
    /// surface a timeout.
    pub const PREDICT_TIMEOUT_MS: u64 = 60_000;
    /// Inclusive range of the mask adjustment amount.
    pub const ADJUST_AMOUNT_MIN: u8 = 1;
    pub const ADJUST_AMOUNT_MAX: u8 = 20;
}
