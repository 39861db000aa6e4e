//! Annotation canvas controller.
//!
//! Owns the display transform and all transient annotation state, routes
//! pointer events to the active mode (point, box, or polygon editing), and
//! composites two logical layers of draw commands: a base layer (frame
//! image plus committed annotations, rebuilt only when those change) and an
//! overlay layer (in-progress prompts, active mask preview, editable
//! polygon, rebuilt every interaction).
//!
//! Rendering is expressed as ordered [`DrawCommand`]s so any shell can
//! replay them and compositing order stays testable.

use crate::constants::{hit, overlay};
use crate::contour::extract_contour;
use crate::editor::{EditorState, HoverTarget, PolygonEditor};
use crate::geometry::Point;
use crate::mask::{binarize, DecodedMask, MaskBuffer};
use crate::model::{BoxPrompt, PointPrompt, PromptType};
use crate::rasterize::rasterize;
use crate::session::PredictRequest;
use crate::transform::DisplayTransform;

/// Which handler set pointer events are routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationMode {
    #[default]
    Point,
    Box,
    Polygon,
}

/// A committed annotation prepared for compositing.
#[derive(Debug, Clone)]
pub struct CommittedMask {
    pub annotation_id: u64,
    pub color: [f32; 4],
    pub buffer: MaskBuffer,
}

/// Which decoded mask a tint command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskLayer {
    /// Index into the committed mask list, in compositing order.
    Committed(usize),
    /// The in-progress prediction or polygon preview mask.
    Active,
}

/// One rendering primitive. Coordinates are screen-space; the shell
/// replays commands in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Draw the loaded frame image aspect-fit into the viewport.
    FrameImage,
    /// Tint the foreground pixels of a mask layer.
    MaskTint { layer: MaskLayer, color: [f32; 4] },
    /// Filled circle (prompt markers, vertex handles).
    Circle {
        center: Point,
        radius: f32,
        color: [f32; 4],
    },
    /// Stroked rectangle (box prompts).
    Rect {
        min: Point,
        max: Point,
        color: [f32; 4],
    },
    /// Filled polygon body.
    PolygonFill { points: Vec<Point>, color: [f32; 4] },
    /// Single polygon edge, so hovered edges can differ in color.
    Line {
        from: Point,
        to: Point,
        color: [f32; 4],
        width: f32,
    },
    /// Fixed-size marker drawn when no frame is loaded or a mask failed
    /// to decode.
    Placeholder { center: Point, size: f32 },
}

/// Event emitted toward the application after a pointer interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A point prompt was added; the full accumulated set should be
    /// replayed to the predictor.
    PointAdded(PointPrompt),
    /// First corner of a box placed.
    BoxStarted(Point),
    /// Second click completed the box.
    BoxCompleted(BoxPrompt),
    /// The polygon changed and the live mask preview was regenerated.
    PolygonChanged,
}

/// Everything needed to commit the in-progress annotation.
#[derive(Debug, Clone)]
pub struct CommitData {
    pub points: Vec<PointPrompt>,
    pub boxes: Vec<BoxPrompt>,
    pub mask: MaskBuffer,
}

/// State container for the annotation canvas.
#[derive(Debug, Default)]
pub struct CanvasController {
    viewport: Option<(f32, f32)>,
    transform: Option<DisplayTransform>,
    frame_id: Option<u64>,
    /// Encoded still frame, forwarded to the predictor with each request.
    frame_image: Option<Vec<u8>>,
    mode: AnnotationMode,
    /// Sticky polarity for point prompts; toggled separately, not
    /// per-click.
    positive_polarity: bool,
    points: Vec<PointPrompt>,
    boxes: Vec<BoxPrompt>,
    pending_box: Option<Point>,
    active_mask: Option<MaskBuffer>,
    /// Set when the latest mask blob failed to decode; the overlay draws
    /// a placeholder instead.
    mask_decode_failed: bool,
    editor: Option<PolygonEditor>,
    committed: Vec<CommittedMask>,
    base_dirty: bool,
}

impl CanvasController {
    pub fn new() -> Self {
        Self {
            positive_polarity: true,
            base_dirty: true,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // State access
    // ------------------------------------------------------------------

    pub fn transform(&self) -> Option<&DisplayTransform> {
        self.transform.as_ref()
    }

    pub fn frame_id(&self) -> Option<u64> {
        self.frame_id
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn positive_polarity(&self) -> bool {
        self.positive_polarity
    }

    pub fn points(&self) -> &[PointPrompt] {
        &self.points
    }

    pub fn boxes(&self) -> &[BoxPrompt] {
        &self.boxes
    }

    pub fn active_mask(&self) -> Option<&MaskBuffer> {
        self.active_mask.as_ref()
    }

    pub fn editor(&self) -> Option<&PolygonEditor> {
        self.editor.as_ref()
    }

    /// Ready for interaction: a frame is loaded and the transform exists.
    pub fn is_ready(&self) -> bool {
        self.transform.is_some()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Viewport size changed: refit the transform for the current frame.
    /// The transform is replaced, never mutated in place.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Some((width, height));
        if let Some(t) = self.transform {
            self.transform = Some(DisplayTransform::fit(
                t.source_width,
                t.source_height,
                width,
                height,
            ));
        }
    }

    /// A new frame was loaded. All transient state is cleared atomically
    /// before the new transform is installed, so nothing from the old
    /// frame can leak into requests for the new one.
    pub fn load_frame(
        &mut self,
        frame_id: u64,
        image_data: Vec<u8>,
        source_width: f32,
        source_height: f32,
    ) {
        self.clear_transient();
        self.frame_id = Some(frame_id);
        self.frame_image = Some(image_data);
        let (vw, vh) = self.viewport.unwrap_or((source_width, source_height));
        self.transform = Some(DisplayTransform::fit(source_width, source_height, vw, vh));
        self.base_dirty = true;
        log::debug!("Frame {frame_id} loaded ({source_width}x{source_height})");
    }

    /// Drop all in-progress annotation state: prompts, active mask,
    /// polygon. Committed annotations and the frame itself stay.
    pub fn clear_transient(&mut self) {
        self.points.clear();
        self.boxes.clear();
        self.pending_box = None;
        self.active_mask = None;
        self.mask_decode_failed = false;
        self.editor = None;
    }

    pub fn set_mode(&mut self, mode: AnnotationMode) {
        if self.mode != mode {
            self.pending_box = None;
            // A drag must not survive a mode switch.
            if let Some(editor) = self.editor.as_mut() {
                editor.pointer_up();
            }
            self.mode = mode;
            log::debug!("Annotation mode: {mode:?}");
        }
    }

    pub fn toggle_polarity(&mut self) {
        self.positive_polarity = !self.positive_polarity;
        log::debug!(
            "Prompt polarity: {}",
            if self.positive_polarity {
                "positive"
            } else {
                "negative"
            }
        );
    }

    /// Replace the committed annotation list used for base compositing.
    pub fn set_committed(&mut self, committed: Vec<CommittedMask>) {
        self.committed = committed;
        self.base_dirty = true;
    }

    pub fn is_base_dirty(&self) -> bool {
        self.base_dirty
    }

    // ------------------------------------------------------------------
    // Pointer routing
    // ------------------------------------------------------------------

    /// Pointer press in screen coordinates.
    pub fn pointer_down(&mut self, screen: Point, modifier: bool) -> Option<CanvasEvent> {
        let Some(transform) = self.transform else {
            log::debug!("Pointer ignored: no frame loaded");
            return None;
        };

        if self.mode == AnnotationMode::Polygon {
            let editor = self.editor.as_mut()?;
            let outcome = editor.pointer_down(screen, modifier, &transform);
            return self.after_edit(outcome.changed_polygon());
        }

        if !transform.is_inside_image(screen) {
            return None;
        }
        let normalized = transform.to_normalized(screen);

        match self.mode {
            AnnotationMode::Point => {
                let prompt = PointPrompt::new(normalized, self.positive_polarity);
                self.points.push(prompt);
                log::debug!(
                    "Point prompt {} at ({:.1}, {:.1}), total {}",
                    if prompt.is_positive { "+" } else { "-" },
                    prompt.x,
                    prompt.y,
                    self.points.len()
                );
                Some(CanvasEvent::PointAdded(prompt))
            }
            AnnotationMode::Box => match self.pending_box.take() {
                None => {
                    self.pending_box = Some(normalized);
                    Some(CanvasEvent::BoxStarted(normalized))
                }
                Some(first) => {
                    let prompt = BoxPrompt::from_corners(first, normalized);
                    self.boxes.push(prompt);
                    log::debug!(
                        "Box prompt ({:.1}, {:.1})..({:.1}, {:.1})",
                        prompt.x1,
                        prompt.y1,
                        prompt.x2,
                        prompt.y2
                    );
                    Some(CanvasEvent::BoxCompleted(prompt))
                }
            },
            AnnotationMode::Polygon => unreachable!("handled above"),
        }
    }

    /// Pointer move in screen coordinates.
    pub fn pointer_move(&mut self, screen: Point) -> Option<CanvasEvent> {
        let transform = self.transform?;
        if self.mode != AnnotationMode::Polygon {
            return None;
        }
        let editor = self.editor.as_mut()?;
        let outcome = editor.pointer_move(screen, &transform);
        self.after_edit(outcome.changed_polygon())
    }

    /// Pointer release.
    pub fn pointer_up(&mut self) -> Option<CanvasEvent> {
        if self.mode == AnnotationMode::Polygon {
            self.editor.as_mut()?.pointer_up();
        }
        None
    }

    /// Re-rasterize after a polygon mutation so the live preview matches
    /// the polygon. Synchronous and unconditional per mutation.
    fn after_edit(&mut self, changed: bool) -> Option<CanvasEvent> {
        if !changed {
            return None;
        }
        let polygon = self.editor.as_ref()?.polygon();
        self.active_mask = Some(rasterize(polygon));
        self.mask_decode_failed = false;
        Some(CanvasEvent::PolygonChanged)
    }

    // ------------------------------------------------------------------
    // Mask and polygon synchronization
    // ------------------------------------------------------------------

    /// Apply a decoded predictor mask as the active preview.
    pub fn apply_prediction(&mut self, decoded: DecodedMask) {
        self.active_mask = Some(decoded.buffer);
        self.mask_decode_failed = false;
    }

    /// The latest mask blob could not be decoded; remember it so the
    /// overlay degrades to a placeholder instead of crashing.
    pub fn mark_mask_decode_failed(&mut self) {
        self.mask_decode_failed = true;
    }

    /// Switch to polygon editing by extracting a contour from the active
    /// mask. Refuses (returns false) when there is no mask or the contour
    /// comes back empty.
    pub fn enter_polygon_edit(&mut self) -> bool {
        let Some(mask) = self.active_mask.as_ref() else {
            log::debug!("Cannot edit polygon: no active mask");
            return false;
        };
        let polygon = extract_contour(&binarize(mask));
        if !polygon.is_valid() {
            log::warn!("Contour extraction produced no polygon; staying in current mode");
            return false;
        }
        log::debug!("Entering polygon edit with {} vertices", polygon.len());
        self.editor = Some(PolygonEditor::new(polygon));
        self.set_mode(AnnotationMode::Polygon);
        true
    }

    /// Build the predictor request from the *entire* accumulated prompt
    /// set, in insertion order. `None` when there is nothing to ask.
    pub fn predict_request(&self) -> Option<PredictRequest> {
        let image_data = self.frame_image.clone()?;
        let prompt_type = match self.mode {
            AnnotationMode::Point | AnnotationMode::Polygon => PromptType::Point,
            AnnotationMode::Box => PromptType::Box,
        };
        match prompt_type {
            PromptType::Point if self.points.is_empty() => return None,
            PromptType::Box if self.boxes.is_empty() => return None,
            _ => {}
        }
        Some(PredictRequest {
            image_data,
            prompt_type,
            points: self.points.clone(),
            boxes: self.boxes.clone(),
        })
    }

    /// Take everything needed to commit the in-progress annotation,
    /// clearing transient state. `None` when there is no active mask yet.
    pub fn take_commit(&mut self) -> Option<CommitData> {
        let mask = self.active_mask.take()?;
        let data = CommitData {
            points: std::mem::take(&mut self.points),
            boxes: std::mem::take(&mut self.boxes),
            mask,
        };
        self.clear_transient();
        Some(data)
    }

    /// Color of the active mask tint: green when the most recent point
    /// prompt is positive, red when negative.
    fn active_mask_color(&self) -> [f32; 4] {
        let positive = self
            .points
            .last()
            .map_or(true, |p| p.is_positive);
        let base = if positive {
            overlay::POSITIVE
        } else {
            overlay::NEGATIVE
        };
        with_alpha(base, overlay::ACTIVE_ALPHA)
    }

    // ------------------------------------------------------------------
    // Compositing
    // ------------------------------------------------------------------

    /// Base layer: the frame image plus committed annotation tints.
    /// Rebuild only when [`is_base_dirty`](Self::is_base_dirty) reports a
    /// change; calling this clears the flag.
    pub fn build_base(&mut self) -> Vec<DrawCommand> {
        self.base_dirty = false;
        let mut commands = Vec::new();
        if self.transform.is_none() {
            let (vw, vh) = self.viewport.unwrap_or((0.0, 0.0));
            commands.push(DrawCommand::Placeholder {
                center: Point::new(vw / 2.0, vh / 2.0),
                size: overlay::PLACEHOLDER_SIZE,
            });
            return commands;
        }
        commands.push(DrawCommand::FrameImage);
        for (i, committed) in self.committed.iter().enumerate() {
            commands.push(DrawCommand::MaskTint {
                layer: MaskLayer::Committed(i),
                color: with_alpha(committed.color, overlay::COMMITTED_ALPHA),
            });
        }
        commands
    }

    /// Overlay layer, rebuilt every interaction frame: active mask tint,
    /// prompt markers, then the editable polygon on top.
    pub fn build_overlay(&self) -> Vec<DrawCommand> {
        let Some(transform) = self.transform else {
            return Vec::new();
        };
        let mut commands = Vec::new();

        if self.mask_decode_failed {
            let center = transform.to_screen(Point::new(320.0, 240.0));
            commands.push(DrawCommand::Placeholder {
                center,
                size: overlay::PLACEHOLDER_SIZE,
            });
        } else if self.active_mask.is_some() {
            commands.push(DrawCommand::MaskTint {
                layer: MaskLayer::Active,
                color: self.active_mask_color(),
            });
        }

        for point in &self.points {
            let color = if point.is_positive {
                overlay::POSITIVE
            } else {
                overlay::NEGATIVE
            };
            commands.push(DrawCommand::Circle {
                center: transform.to_screen(point.position()),
                radius: overlay::PROMPT_RADIUS,
                color,
            });
        }
        for prompt in &self.boxes {
            commands.push(DrawCommand::Rect {
                min: transform.to_screen(prompt.min()),
                max: transform.to_screen(prompt.max()),
                color: overlay::POSITIVE,
            });
        }
        if let Some(first) = self.pending_box {
            commands.push(DrawCommand::Circle {
                center: transform.to_screen(first),
                radius: overlay::PROMPT_RADIUS,
                color: overlay::EDGE_HOVERED,
            });
        }

        if let Some(editor) = &self.editor {
            self.push_polygon_overlay(&mut commands, editor, &transform);
        }

        commands
    }

    fn push_polygon_overlay(
        &self,
        commands: &mut Vec<DrawCommand>,
        editor: &PolygonEditor,
        transform: &DisplayTransform,
    ) {
        let verts = editor.polygon().vertices();
        if verts.is_empty() {
            return;
        }
        let screen: Vec<Point> = verts.iter().map(|v| transform.to_screen(*v)).collect();

        commands.push(DrawCommand::PolygonFill {
            points: screen.clone(),
            color: with_alpha(overlay::EDGE_NORMAL, overlay::POLYGON_FILL_ALPHA),
        });

        let n = screen.len();
        for i in 0..n {
            let hovered = editor.hover() == HoverTarget::Edge(i);
            commands.push(DrawCommand::Line {
                from: screen[i],
                to: screen[(i + 1) % n],
                color: if hovered {
                    overlay::EDGE_HOVERED
                } else {
                    overlay::EDGE_NORMAL
                },
                width: 2.0,
            });
        }

        for (i, p) in screen.iter().enumerate() {
            let color = if editor.state() == EditorState::DraggingNode(i) {
                overlay::NODE_SELECTED
            } else if editor.hover() == HoverTarget::Node(i) {
                overlay::NODE_HOVERED
            } else {
                overlay::NODE_NORMAL
            };
            commands.push(DrawCommand::Circle {
                center: *p,
                radius: hit::NODE_RADIUS,
                color,
            });
        }
    }
}

fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], alpha]
}

// ============================================================================
// Tests
// ============================================================================
