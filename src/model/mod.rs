//! Data models for the annotation core.

mod annotation;
mod category;
mod prompt;

pub use annotation::{Annotation, AnnotationId, AnnotationRepository, FrameAnnotations};
pub use category::Category;
pub use prompt::{BoxPrompt, PointPrompt, PromptType};
