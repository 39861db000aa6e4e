//! Annotation entity and per-frame storage.
//!
//! The core owns annotations only in memory; persistence is delegated to an
//! [`AnnotationRepository`] implemented by the surrounding application.

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::model::prompt::{BoxPrompt, PointPrompt};

/// Unique identifier for an annotation.
pub type AnnotationId = u64;

/// A committed mask annotation on one video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    pub frame_id: u64,
    pub category_id: u32,
    /// Encoded 640x480 raster mask.
    pub mask_data: Vec<u8>,
    /// Point prompts that produced the mask, in insertion order.
    pub source_points: Vec<PointPrompt>,
    /// Box prompts that produced the mask.
    pub source_boxes: Vec<BoxPrompt>,
    pub confidence: f32,
}

/// In-memory storage for the annotations of a single frame.
///
/// Kept in insertion order because committed masks composite in that order.
/// The dirty flag avoids rebuilding the base layer every frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameAnnotations {
    annotations: Vec<Annotation>,
    /// Counter for generating unique annotation IDs.
    next_id: AnnotationId,
    /// Set when annotations change.
    #[serde(skip)]
    dirty: bool,
}

impl FrameAnnotations {
    pub fn new() -> Self {
        Self {
            annotations: Vec::new(),
            next_id: 1,
            dirty: true, // Start dirty so first base-layer build happens
        }
    }

    /// Check if the store has been modified since last clear_dirty().
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after rebuilding the base layer.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Add an annotation and return its ID.
    pub fn add(
        &mut self,
        frame_id: u64,
        category_id: u32,
        mask_data: Vec<u8>,
        source_points: Vec<PointPrompt>,
        source_boxes: Vec<BoxPrompt>,
        confidence: f32,
    ) -> AnnotationId {
        let id = self.next_id;
        self.next_id += 1;
        self.annotations.push(Annotation {
            id,
            frame_id,
            category_id,
            mask_data,
            source_points,
            source_boxes,
            confidence,
        });
        self.mark_dirty();
        id
    }

    /// Remove an annotation by ID.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let pos = self.annotations.iter().position(|a| a.id == id)?;
        self.mark_dirty();
        Some(self.annotations.remove(pos))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// All annotations in insertion (compositing) order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Replace the contents with annotations loaded from persistence.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.next_id = annotations.iter().map(|a| a.id + 1).max().unwrap_or(1);
        self.annotations = annotations;
        self.mark_dirty();
    }
}

/// Persistence boundary owned by the surrounding application.
///
/// Failures are surfaced to the user; local in-memory state is not rolled
/// back automatically, the user retries explicitly.
pub trait AnnotationRepository {
    fn create_annotation(
        &mut self,
        video_id: &str,
        frame_number: u64,
        category_name: &str,
        mask_data: &[u8],
        points: &[PointPrompt],
        boxes: &[BoxPrompt],
        confidence: f32,
    ) -> Result<AnnotationId, PersistenceError>;

    fn delete_annotation(&mut self, id: AnnotationId) -> Result<(), PersistenceError>;

    fn annotations_for_frame(
        &self,
        video_id: &str,
        frame_number: u64,
    ) -> Result<Vec<Annotation>, PersistenceError>;
}

// ============================================================================
// Tests
// ============================================================================
