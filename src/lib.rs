//! SVAT - Segmentation Video Annotation Toolkit
//!
//! Headless core for promptable-segmentation annotation: a
//! coordinate-consistent annotation canvas and a polygon mask editor,
//! driven by messages and rendered as draw command lists.
//!
//! All annotation geometry lives in a fixed 640x480 normalized space so
//! prompts, masks, and polygons stay comparable across viewport sizes;
//! [`transform::DisplayTransform`] maps between that space and the
//! screen.

pub mod canvas;
pub mod constants;
pub mod contour;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod handlers;
pub mod mask;
pub mod message;
pub mod model;
pub mod rasterize;
pub mod session;
pub mod tracking;
pub mod transform;

pub use canvas::{AnnotationMode, CanvasController, CanvasEvent, DrawCommand};
pub use handlers::{update, AppState};
pub use message::{Effect, Message};
