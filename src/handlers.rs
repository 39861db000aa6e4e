//! Message handlers.
//!
//! Each handler processes one category of messages, keeping the top-level
//! [`update`] function a plain dispatch table. Handlers mutate
//! [`AppState`] directly; the two slow service calls (prediction and
//! adjustment) and bulk propagation are returned as [`Effect`]s for the
//! shell to execute, with their outcomes fed back as messages.

use crate::canvas::{CanvasController, CanvasEvent, CommittedMask};
use crate::mask;
use crate::message::{Effect, Message};
use crate::model::{AnnotationRepository, Category, FrameAnnotations, PointPrompt};
use crate::session::{AdjustRequest, AdjustmentKind, PredictionSession, RequestToken};
use crate::tracking::{TrackingService, TrackingSession};
use crate::error::{AdjustmentError, PredictError};

/// Top-level application state.
pub struct AppState {
    pub canvas: CanvasController,
    pub session: PredictionSession,
    pub tracking: TrackingSession,
    pub annotations: FrameAnnotations,
    pub categories: Vec<Category>,
    pub selected_category: u32,
    pub video_id: String,
    /// Most recent user-facing error, cleared by the next successful
    /// operation of the same kind.
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            canvas: CanvasController::new(),
            session: PredictionSession::new(),
            tracking: TrackingSession::new(),
            annotations: FrameAnnotations::new(),
            categories: vec![Category::new(1, "object")],
            selected_category: 1,
            video_id: video_id.into(),
            last_error: None,
        }
    }

    fn category_color(&self, category_id: u32) -> [f32; 4] {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.color)
            .unwrap_or([1.0, 1.0, 1.0, 1.0])
    }

    fn category_name(&self, category_id: u32) -> &str {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("object")
    }
}

/// Process one message and return any follow-up work for the shell.
pub fn update(
    state: &mut AppState,
    tracker: &mut dyn TrackingService,
    repository: &mut dyn AnnotationRepository,
    msg: Message,
) -> Option<Effect> {
    match msg {
        Message::ViewportResized(width, height) => {
            state.canvas.set_viewport(width, height);
            None
        }
        Message::FrameLoaded {
            frame_id,
            image_data,
            width,
            height,
        } => {
            handle_frame_loaded(state, repository, frame_id, image_data, width, height);
            None
        }

        Message::PointerDown { position, modifier } => {
            let event = state.canvas.pointer_down(position, modifier);
            handle_canvas_event(state, event)
        }
        Message::PointerMoved(position) => {
            state.canvas.pointer_move(position);
            None
        }
        Message::PointerUp => {
            state.canvas.pointer_up();
            None
        }

        Message::ModeSelected(mode) => {
            if state.canvas.mode() != mode {
                // Everything in flight targets the old mode.
                state.session.invalidate();
                state.canvas.set_mode(mode);
            }
            None
        }
        Message::PolarityToggled => {
            state.canvas.toggle_polarity();
            None
        }
        Message::EditPolygon => {
            if state.canvas.enter_polygon_edit() {
                state.session.invalidate();
            }
            None
        }
        Message::CategorySelected(id) => {
            if state.categories.iter().any(|c| c.id == id) {
                state.selected_category = id;
                log::debug!("Category selected: {id}");
            }
            None
        }

        Message::PredictionResolved { token, result } => {
            handle_prediction_resolved(state, token, result);
            None
        }
        Message::AdjustMask { kind, amount } => handle_adjust_mask(state, kind, amount),
        Message::AdjustResolved { token, result } => {
            handle_adjust_resolved(state, token, result);
            None
        }

        Message::CommitAnnotation => {
            handle_commit(state, repository);
            None
        }
        Message::CancelAnnotation => {
            state.canvas.clear_transient();
            state.session.invalidate();
            log::debug!("In-progress annotation cancelled");
            None
        }
        Message::DeleteAnnotation(id) => {
            handle_delete(state, repository, id);
            None
        }

        Message::OpenTracking(video_path) => {
            if let Err(err) = state.tracking.open(tracker, &video_path) {
                report_error(state, &err);
            }
            None
        }
        Message::TrackObject { name, category } => {
            handle_track_object(state, tracker, &name, &category);
            None
        }
        Message::StartPropagation => match state.tracking.begin_propagation() {
            Ok(()) => {
                let session_id = state.tracking.info()?.session_id.clone();
                Some(Effect::Propagate { session_id })
            }
            Err(err) => {
                report_error(state, &err);
                None
            }
        },
        Message::PropagationProgress(percent) => {
            state.tracking.on_progress(percent);
            None
        }
        Message::PropagationFinished(result) => {
            match result {
                Ok(summary) => {
                    state.tracking.propagation_finished(summary);
                }
                Err(err) => {
                    state.tracking.propagation_failed();
                    report_error(state, &err);
                }
            }
            None
        }
        Message::LoadTrackedMasks(frame_idx) => {
            handle_tracked_masks(state, tracker, frame_idx);
            None
        }
        Message::CloseTracking => {
            if let Err(err) = state.tracking.close(tracker) {
                report_error(state, &err);
            }
            None
        }
    }
}

fn report_error(state: &mut AppState, err: &dyn std::error::Error) {
    log::error!("{err}");
    state.last_error = Some(err.to_string());
}

// ============================================================================
// Canvas and prediction
// ============================================================================

fn handle_frame_loaded(
    state: &mut AppState,
    repository: &mut dyn AnnotationRepository,
    frame_id: u64,
    image_data: Vec<u8>,
    width: f32,
    height: f32,
) {
    // Invalidate before the canvas clears, so a response racing the frame
    // change can never land on the new frame.
    state.session.invalidate();
    state.canvas.load_frame(frame_id, image_data, width, height);

    match repository.annotations_for_frame(&state.video_id, frame_id) {
        Ok(stored) => state.annotations.replace_all(stored),
        Err(err) => {
            state.annotations.replace_all(Vec::new());
            report_error(state, &err);
        }
    }
    refresh_committed(state);
}

fn handle_canvas_event(state: &mut AppState, event: Option<CanvasEvent>) -> Option<Effect> {
    match event? {
        CanvasEvent::PointAdded(_) | CanvasEvent::BoxCompleted(_) => start_prediction(state),
        CanvasEvent::BoxStarted(_) | CanvasEvent::PolygonChanged => None,
    }
}

/// Submit the accumulated prompt set. One request at a time; while busy
/// the new prompt stays accumulated and rides along with the next
/// submission.
fn start_prediction(state: &mut AppState) -> Option<Effect> {
    let request = state.canvas.predict_request()?;
    let token = state.session.begin()?;
    log::debug!(
        "Prediction request: {} points, {} boxes",
        request.points.len(),
        request.boxes.len()
    );
    Some(Effect::Predict { token, request })
}

fn handle_prediction_resolved(
    state: &mut AppState,
    token: RequestToken,
    result: Result<mask::DecodedMask, PredictError>,
) {
    match result {
        Ok(decoded) => {
            if state.session.finish(token) {
                if decoded.resized {
                    log::warn!("Predictor mask arrived with unexpected dimensions");
                }
                state.canvas.apply_prediction(decoded);
                state.last_error = None;
            }
        }
        Err(err) => {
            // A failure from a superseded request is as stale as a
            // success: it must not touch the current frame's state.
            if state.session.fail(token) {
                if matches!(err, PredictError::Mask(_)) {
                    state.canvas.mark_mask_decode_failed();
                }
                report_error(state, &err);
            }
        }
    }
}

fn handle_adjust_mask(state: &mut AppState, kind: AdjustmentKind, amount: u8) -> Option<Effect> {
    let mask_data = match mask::encode(state.canvas.active_mask()?) {
        Ok(data) => data,
        Err(err) => {
            report_error(state, &err);
            return None;
        }
    };
    let request = match AdjustRequest::new(mask_data, kind, amount) {
        Ok(request) => request,
        Err(err) => {
            report_error(state, &err);
            return None;
        }
    };
    let token = state.session.begin()?;
    log::debug!("Adjustment request: {kind:?} amount {amount}");
    Some(Effect::Adjust { token, request })
}

fn handle_adjust_resolved(
    state: &mut AppState,
    token: RequestToken,
    result: Result<mask::DecodedMask, AdjustmentError>,
) {
    match result {
        Ok(decoded) => {
            if state.session.finish(token) {
                state.canvas.apply_prediction(decoded);
                state.last_error = None;
            }
        }
        Err(err) => {
            if state.session.fail(token) {
                report_error(state, &err);
            }
        }
    }
}

// ============================================================================
// Annotation lifecycle
// ============================================================================

fn handle_commit(state: &mut AppState, repository: &mut dyn AnnotationRepository) {
    let Some(frame_id) = state.canvas.frame_id() else {
        return;
    };
    let Some(commit) = state.canvas.take_commit() else {
        log::debug!("Commit ignored: no active mask");
        return;
    };
    let encoded = match mask::encode(&commit.mask) {
        Ok(data) => data,
        Err(err) => {
            report_error(state, &err);
            return;
        }
    };
    state.session.invalidate();

    let category_id = state.selected_category;
    state.annotations.add(
        frame_id,
        category_id,
        encoded.clone(),
        commit.points.clone(),
        commit.boxes.clone(),
        1.0,
    );
    refresh_committed(state);
    log::info!("Committed annotation on frame {frame_id} (category {category_id})");

    // Persistence failures are surfaced but local state is kept; the user
    // retries explicitly.
    if let Err(err) = repository.create_annotation(
        &state.video_id,
        frame_id,
        state.category_name(category_id),
        &encoded,
        &commit.points,
        &commit.boxes,
        1.0,
    ) {
        report_error(state, &err);
    }
}

fn handle_delete(state: &mut AppState, repository: &mut dyn AnnotationRepository, id: u64) {
    if state.annotations.remove(id).is_none() {
        log::debug!("Delete ignored: no annotation {id}");
        return;
    }
    refresh_committed(state);
    if let Err(err) = repository.delete_annotation(id) {
        report_error(state, &err);
    }
}

/// Rebuild the committed-mask compositing list from the annotation store,
/// in insertion order. Skipped when the store is unchanged since the last
/// rebuild; decoding every committed mask is not free.
fn refresh_committed(state: &mut AppState) {
    if !state.annotations.is_dirty() {
        return;
    }
    let mut committed = Vec::with_capacity(state.annotations.len());
    for annotation in state.annotations.iter() {
        match mask::decode(&annotation.mask_data) {
            Ok(decoded) => committed.push(CommittedMask {
                annotation_id: annotation.id,
                color: state.category_color(annotation.category_id),
                buffer: decoded.buffer,
            }),
            Err(err) => {
                log::warn!("Skipping undecodable mask for annotation {}: {err}", annotation.id)
            }
        }
    }
    state.canvas.set_committed(committed);
    state.annotations.clear_dirty();
}

// ============================================================================
// Tracking
// ============================================================================

fn handle_track_object(
    state: &mut AppState,
    tracker: &mut dyn TrackingService,
    name: &str,
    category: &str,
) {
    let Some(frame_idx) = state.canvas.frame_id() else {
        return;
    };
    let prompts: Vec<PointPrompt> = state.canvas.points().to_vec();
    if prompts.is_empty() {
        log::debug!("TrackObject ignored: no point prompts");
        return;
    }
    if let Err(err) = state
        .tracking
        .add_object(tracker, frame_idx, &prompts, name, category)
    {
        report_error(state, &err);
    }
}

fn handle_tracked_masks(state: &mut AppState, tracker: &mut dyn TrackingService, frame_idx: u64) {
    let masks = match state.tracking.frame_masks(tracker, frame_idx) {
        Ok(masks) => masks,
        Err(err) => {
            report_error(state, &err);
            return;
        }
    };
    let mut committed = Vec::with_capacity(masks.len());
    for (object_id, encoded) in masks {
        let decoded = match mask::decode(&encoded) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::warn!("Skipping undecodable tracked mask for object {object_id}: {err}");
                continue;
            }
        };
        let color = state
            .tracking
            .objects()
            .iter()
            .find(|o| o.object_id == object_id)
            .map(|o| {
                [
                    o.color[0] as f32 / 255.0,
                    o.color[1] as f32 / 255.0,
                    o.color[2] as f32 / 255.0,
                    1.0,
                ]
            })
            .unwrap_or([1.0, 1.0, 1.0, 1.0]);
        committed.push(CommittedMask {
            annotation_id: object_id as u64,
            color,
            buffer: decoded.buffer,
        });
    }
    // Stable compositing order across fetches.
    committed.sort_by_key(|c| c.annotation_id);
    state.canvas.set_committed(committed);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::AnnotationMode;
    use crate::geometry::Point;
    use crate::mask::{empty_buffer, DecodedMask};
    use crate::model::{Annotation, AnnotationId, BoxPrompt};
    use crate::error::{PersistenceError, TrackingError};
    use crate::tracking::{PropagateSummary, SessionInfo, TrackingState};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryRepository {
        created: Vec<(String, u64, String)>,
        deleted: Vec<AnnotationId>,
        fail_create: bool,
        next_id: AnnotationId,
    }

    impl AnnotationRepository for MemoryRepository {
        fn create_annotation(
            &mut self,
            video_id: &str,
            frame_number: u64,
            category_name: &str,
            _mask_data: &[u8],
            _points: &[PointPrompt],
            _boxes: &[BoxPrompt],
            _confidence: f32,
        ) -> Result<AnnotationId, PersistenceError> {
            if self.fail_create {
                return Err(PersistenceError::Save("server unavailable".into()));
            }
            self.created
                .push((video_id.to_string(), frame_number, category_name.to_string()));
            self.next_id += 1;
            Ok(self.next_id)
        }

        fn delete_annotation(&mut self, id: AnnotationId) -> Result<(), PersistenceError> {
            self.deleted.push(id);
            Ok(())
        }

        fn annotations_for_frame(
            &self,
            _video_id: &str,
            _frame_number: u64,
        ) -> Result<Vec<Annotation>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeTracker;

    impl TrackingService for FakeTracker {
        fn initialize(&mut self, _video_path: &str) -> Result<SessionInfo, TrackingError> {
            Ok(SessionInfo {
                session_id: "sess-1".into(),
                total_frames: 10,
                frame_width: 1920,
                frame_height: 1080,
                fps: 30.0,
            })
        }

        fn add_object(
            &mut self,
            request: &crate::tracking::AddObjectRequest,
        ) -> Result<crate::tracking::TrackedObject, TrackingError> {
            Ok(crate::tracking::TrackedObject {
                object_id: request.object_id,
                mask: Vec::new(),
                color: [255, 0, 0],
            })
        }

        fn propagate(
            &mut self,
            _session_id: &str,
            progress: &mut dyn FnMut(u8),
        ) -> Result<PropagateSummary, TrackingError> {
            progress(100);
            Ok(PropagateSummary {
                total_frames: 10,
                total_objects: 1,
            })
        }

        fn frame_masks(
            &mut self,
            _session_id: &str,
            _frame_idx: u64,
        ) -> Result<HashMap<u32, Vec<u8>>, TrackingError> {
            Ok(HashMap::new())
        }

        fn close(&mut self, _session_id: &str) -> Result<(), TrackingError> {
            Ok(())
        }
    }

    fn ready_state() -> (AppState, FakeTracker, MemoryRepository) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut state = AppState::new("video-1");
        let mut tracker = FakeTracker;
        let mut repo = MemoryRepository::default();
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::ViewportResized(400.0, 300.0),
        );
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::FrameLoaded {
                frame_id: 1,
                image_data: vec![0xFF],
                width: 640.0,
                height: 480.0,
            },
        );
        (state, tracker, repo)
    }

    fn decoded_full() -> DecodedMask {
        let mut buffer = empty_buffer();
        for y in 100..200 {
            for x in 200..400 {
                buffer[(y, x)] = 255;
            }
        }
        DecodedMask {
            buffer,
            resized: false,
        }
    }

    #[test]
    fn test_point_click_spawns_prediction_effect() {
        let (mut state, mut tracker, mut repo) = ready_state();
        let effect = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        );
        match effect {
            Some(Effect::Predict { request, .. }) => {
                assert_eq!(request.points.len(), 1);
            }
            other => panic!("expected Predict effect, got {other:?}"),
        }
        assert!(state.session.is_busy());
    }

    #[test]
    fn test_second_click_while_busy_accumulates_without_effect() {
        let (mut state, mut tracker, mut repo) = ready_state();
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(100.0, 100.0),
                modifier: false,
            },
        );
        let effect = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        );
        assert!(effect.is_none());
        assert_eq!(state.canvas.points().len(), 2);
    }

    #[test]
    fn test_stale_response_after_frame_change_is_dropped() {
        let (mut state, mut tracker, mut repo) = ready_state();
        let effect = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        );
        let token = match effect {
            Some(Effect::Predict { token, .. }) => token,
            other => panic!("expected Predict effect, got {other:?}"),
        };

        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::FrameLoaded {
                frame_id: 2,
                image_data: vec![0xAA],
                width: 640.0,
                height: 480.0,
            },
        );
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PredictionResolved {
                token,
                result: Ok(decoded_full()),
            },
        );
        assert!(state.canvas.active_mask().is_none());
        assert_eq!(state.session.stale_discards(), 1);
        assert!(!state.session.is_busy());
    }

    #[test]
    fn test_stale_failed_response_leaves_new_frame_clean() {
        let (mut state, mut tracker, mut repo) = ready_state();
        let Some(Effect::Predict { token, .. }) = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        ) else {
            panic!("expected Predict effect");
        };

        // User switches frames, then the old request fails to decode.
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::FrameLoaded {
                frame_id: 2,
                image_data: vec![0xAA],
                width: 640.0,
                height: 480.0,
            },
        );
        let decode_err = crate::mask::decode(b"not a png").unwrap_err();
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PredictionResolved {
                token,
                result: Err(PredictError::Mask(decode_err)),
            },
        );

        // The new frame shows neither the failure placeholder nor the
        // stale error message.
        assert!(!state
            .canvas
            .build_overlay()
            .iter()
            .any(|c| matches!(c, crate::canvas::DrawCommand::Placeholder { .. })));
        assert!(state.last_error.is_none());
        assert_eq!(state.session.stale_discards(), 1);
        assert!(!state.session.is_busy());
    }

    #[test]
    fn test_current_response_applies_mask() {
        let (mut state, mut tracker, mut repo) = ready_state();
        let Some(Effect::Predict { token, .. }) = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        ) else {
            panic!("expected Predict effect");
        };
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PredictionResolved {
                token,
                result: Ok(decoded_full()),
            },
        );
        assert!(state.canvas.active_mask().is_some());
        assert!(!state.session.is_busy());
    }

    #[test]
    fn test_prediction_failure_resets_busy_and_surfaces_error() {
        let (mut state, mut tracker, mut repo) = ready_state();
        let Some(Effect::Predict { token, .. }) = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        ) else {
            panic!("expected Predict effect");
        };
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PredictionResolved {
                token,
                result: Err(PredictError::Timeout { elapsed_ms: 60_000 }),
            },
        );
        assert!(!state.session.is_busy());
        assert!(state.last_error.as_deref().unwrap().contains("timed out"));
        // Prompts survive a failure so the user can retry.
        assert_eq!(state.canvas.points().len(), 1);
    }

    #[test]
    fn test_mode_change_invalidates_in_flight_request() {
        let (mut state, mut tracker, mut repo) = ready_state();
        let Some(Effect::Predict { token, .. }) = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        ) else {
            panic!("expected Predict effect");
        };
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::ModeSelected(AnnotationMode::Box),
        );
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PredictionResolved {
                token,
                result: Ok(decoded_full()),
            },
        );
        assert!(state.canvas.active_mask().is_none());
        assert_eq!(state.session.stale_discards(), 1);
    }

    #[test]
    fn test_commit_persists_and_composites() {
        let (mut state, mut tracker, mut repo) = ready_state();
        state.canvas.apply_prediction(decoded_full());
        update(&mut state, &mut tracker, &mut repo, Message::CommitAnnotation);

        assert_eq!(state.annotations.len(), 1);
        assert_eq!(repo.created.len(), 1);
        assert_eq!(repo.created[0].0, "video-1");
        assert_eq!(repo.created[0].1, 1);
        assert!(state.canvas.active_mask().is_none());
        // Committed annotation is now part of the base layer.
        assert!(state.canvas.is_base_dirty());
    }

    #[test]
    fn test_committed_rebuild_skipped_when_store_unchanged() {
        let (mut state, mut tracker, mut repo) = ready_state();
        state.canvas.apply_prediction(decoded_full());
        update(&mut state, &mut tracker, &mut repo, Message::CommitAnnotation);
        assert!(!state.annotations.is_dirty());

        state.canvas.build_base();
        assert!(!state.canvas.is_base_dirty());

        // Nothing changed in the store, so the base layer must stay settled.
        refresh_committed(&mut state);
        assert!(!state.canvas.is_base_dirty());

        state.annotations.mark_dirty();
        refresh_committed(&mut state);
        assert!(state.canvas.is_base_dirty());
    }

    #[test]
    fn test_commit_keeps_local_state_on_persistence_failure() {
        let (mut state, mut tracker, mut repo) = ready_state();
        repo.fail_create = true;
        state.canvas.apply_prediction(decoded_full());
        update(&mut state, &mut tracker, &mut repo, Message::CommitAnnotation);

        assert_eq!(state.annotations.len(), 1);
        assert!(state.last_error.is_some());
    }

    #[test]
    fn test_adjust_round_trip() {
        let (mut state, mut tracker, mut repo) = ready_state();
        state.canvas.apply_prediction(decoded_full());
        let Some(Effect::Adjust { token, request }) = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::AdjustMask {
                kind: AdjustmentKind::Expand,
                amount: 5,
            },
        ) else {
            panic!("expected Adjust effect");
        };
        assert_eq!(request.amount, 5);
        assert!(state.session.is_busy());

        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::AdjustResolved {
                token,
                result: Ok(decoded_full()),
            },
        );
        assert!(!state.session.is_busy());
    }

    #[test]
    fn test_adjust_rejects_out_of_range_amount() {
        let (mut state, mut tracker, mut repo) = ready_state();
        state.canvas.apply_prediction(decoded_full());
        let effect = update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::AdjustMask {
                kind: AdjustmentKind::Smooth,
                amount: 21,
            },
        );
        assert!(effect.is_none());
        assert!(state.last_error.as_deref().unwrap().contains("21"));
        assert!(!state.session.is_busy());
    }

    #[test]
    fn test_tracking_workflow_via_messages() {
        let (mut state, mut tracker, mut repo) = ready_state();
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::OpenTracking("video.mp4".into()),
        );
        assert_eq!(state.tracking.state(), TrackingState::Ready);

        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PointerDown {
                position: Point::new(200.0, 150.0),
                modifier: false,
            },
        );
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::TrackObject {
                name: "cat".into(),
                category: "animal".into(),
            },
        );
        assert_eq!(state.tracking.objects().len(), 1);

        let effect = update(&mut state, &mut tracker, &mut repo, Message::StartPropagation);
        assert!(matches!(effect, Some(Effect::Propagate { .. })));
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PropagationProgress(40),
        );
        assert_eq!(state.tracking.progress(), 40);
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PropagationFinished(Ok(PropagateSummary {
                total_frames: 10,
                total_objects: 1,
            })),
        );
        assert_eq!(state.tracking.state(), TrackingState::Ready);
        assert_eq!(state.tracking.progress(), 100);
    }

    #[test]
    fn test_close_drops_late_propagation_progress() {
        let (mut state, mut tracker, mut repo) = ready_state();
        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::OpenTracking("video.mp4".into()),
        );
        update(&mut state, &mut tracker, &mut repo, Message::StartPropagation);
        update(&mut state, &mut tracker, &mut repo, Message::CloseTracking);
        assert_eq!(state.tracking.state(), TrackingState::Closed);

        update(
            &mut state,
            &mut tracker,
            &mut repo,
            Message::PropagationProgress(80),
        );
        assert_eq!(state.tracking.progress(), 0);
    }
}
