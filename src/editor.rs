//! Interactive polygon editing state machine.
//!
//! Pointer events arrive in screen coordinates; hit radii are screen-space
//! so handles feel the same at every display size. Mutations are applied
//! to normalized vertices, and the caller re-rasterizes after any outcome
//! that reports a polygon change so the live preview stays in sync.

use crate::constants::hit;
use crate::geometry::{point_to_segment, Point, Polygon, MIN_POLYGON_VERTICES};
use crate::transform::DisplayTransform;

/// Editor interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    /// A vertex is being dragged.
    DraggingNode(usize),
}

/// What the pointer is currently over, for visual highlight only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HoverTarget {
    #[default]
    None,
    Node(usize),
    /// Edge identified by its start vertex index.
    Edge(usize),
}

/// Outcome of one pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    /// Nothing hit, or the event did not apply.
    Ignored,
    DragStarted(usize),
    /// The dragged vertex followed the pointer. Emitted on every move,
    /// unthrottled, so the mask preview can track the drag.
    NodeMoved(usize),
    DragEnded,
    NodeInserted(usize),
    NodeDeleted(usize),
}

impl EditOutcome {
    /// Whether the polygon shape changed and the mask must be regenerated.
    pub fn changed_polygon(&self) -> bool {
        matches!(
            self,
            EditOutcome::NodeMoved(_) | EditOutcome::NodeInserted(_) | EditOutcome::NodeDeleted(_)
        )
    }
}

/// State machine for direct polygon manipulation.
#[derive(Debug, Clone, Default)]
pub struct PolygonEditor {
    polygon: Polygon,
    state: EditorState,
    hover: HoverTarget,
}

impl PolygonEditor {
    pub fn new(polygon: Polygon) -> Self {
        Self {
            polygon,
            state: EditorState::Idle,
            hover: HoverTarget::None,
        }
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn hover(&self) -> HoverTarget {
        self.hover
    }

    /// Index of the vertex being dragged, if any.
    pub fn selected(&self) -> Option<usize> {
        match self.state {
            EditorState::DraggingNode(i) => Some(i),
            EditorState::Idle => None,
        }
    }

    /// Pointer press. With `modifier` held on a vertex the vertex is
    /// deleted (unless that would drop the polygon below three vertices);
    /// without it a drag starts. Off-vertex presses within reach of an
    /// edge insert a new vertex at the projected position. Vertex hits
    /// take priority over edge hits.
    pub fn pointer_down(
        &mut self,
        screen: Point,
        modifier: bool,
        transform: &DisplayTransform,
    ) -> EditOutcome {
        if let Some(index) = self.vertex_hit(screen, transform) {
            if modifier {
                if self.polygon.len() > MIN_POLYGON_VERTICES && self.polygon.remove_vertex(index) {
                    log::debug!("Deleted polygon vertex {index}");
                    self.hover = HoverTarget::None;
                    return EditOutcome::NodeDeleted(index);
                }
                log::debug!("Refusing to delete vertex {index}: polygon is at minimum size");
                return EditOutcome::Ignored;
            }
            self.state = EditorState::DraggingNode(index);
            return EditOutcome::DragStarted(index);
        }

        if let Some((edge, t)) = self.edge_hit(screen, transform) {
            let n = self.polygon.len();
            let a = self.polygon.vertices()[edge];
            let b = self.polygon.vertices()[(edge + 1) % n];
            let new_point = a.lerp(&b, t);
            if let Some(at) = self.polygon.insert_after(edge, new_point) {
                log::debug!(
                    "Inserted vertex {at} on edge {edge} at t={t:.3} ({:.1}, {:.1})",
                    new_point.x,
                    new_point.y
                );
                return EditOutcome::NodeInserted(at);
            }
        }

        EditOutcome::Ignored
    }

    /// Pointer move. While dragging, the selected vertex follows the
    /// pointer in normalized space with no clamping; an out-of-range
    /// position is logged and stored as-is so the drag can pass outside
    /// the image and come back. Otherwise only the hover highlight updates.
    pub fn pointer_move(&mut self, screen: Point, transform: &DisplayTransform) -> EditOutcome {
        match self.state {
            EditorState::DraggingNode(index) => {
                let normalized = transform.to_normalized(screen);
                if !normalized.in_normalized_bounds() {
                    log::warn!(
                        "Vertex {index} dragged out of range: ({:.1}, {:.1})",
                        normalized.x,
                        normalized.y
                    );
                }
                if self.polygon.move_vertex(index, normalized) {
                    EditOutcome::NodeMoved(index)
                } else {
                    EditOutcome::Ignored
                }
            }
            EditorState::Idle => {
                self.update_hover(screen, transform);
                EditOutcome::Ignored
            }
        }
    }

    /// Pointer release: end any drag and clear the selection.
    pub fn pointer_up(&mut self) -> EditOutcome {
        match self.state {
            EditorState::DraggingNode(_) => {
                self.state = EditorState::Idle;
                EditOutcome::DragEnded
            }
            EditorState::Idle => EditOutcome::Ignored,
        }
    }

    fn update_hover(&mut self, screen: Point, transform: &DisplayTransform) {
        self.hover = if let Some(i) = self.vertex_hit(screen, transform) {
            HoverTarget::Node(i)
        } else if let Some((i, _)) = self.edge_hit(screen, transform) {
            HoverTarget::Edge(i)
        } else {
            HoverTarget::None
        };
    }

    /// Nearest vertex within the screen-space hit radius.
    fn vertex_hit(&self, screen: Point, transform: &DisplayTransform) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, v) in self.polygon.vertices().iter().enumerate() {
            let d = transform.to_screen(*v).distance_to(&screen);
            if d <= hit::NODE_HIT_RADIUS && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Nearest edge within the screen-space hit distance, with the clamped
    /// projection parameter along it.
    fn edge_hit(&self, screen: Point, transform: &DisplayTransform) -> Option<(usize, f32)> {
        let verts = self.polygon.vertices();
        if verts.len() < 2 {
            return None;
        }
        let n = verts.len();
        let mut best: Option<(usize, f32, f32)> = None;
        for i in 0..n {
            let a = transform.to_screen(verts[i]);
            let b = transform.to_screen(verts[(i + 1) % n]);
            let (d, t) = point_to_segment(&screen, &a, &b);
            if d <= hit::EDGE_HIT_DISTANCE && best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((i, t, d));
            }
        }
        best.map(|(i, t, _)| (i, t))
    }
}

// ============================================================================
// Tests
// ============================================================================
