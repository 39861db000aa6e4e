//! Video-tracking session orchestration.
//!
//! The tracking backend extends object masks from an annotated frame
//! across the rest of a video. It is an external collaborator behind
//! [`TrackingService`]; [`TrackingSession`] sequences the workflow
//! (initialize, add objects, propagate, fetch per-frame masks, close) and
//! enforces that a closed session discards any late progress or results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::model::PointPrompt;

// ============================================================================
// Service boundary types
// ============================================================================

/// Session metadata returned by the backend on initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub total_frames: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: f32,
}

/// Request registering one object to track from a given frame.
///
/// Point coordinates and polarity labels travel as parallel arrays, which
/// is the tracking backend's wire convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddObjectRequest {
    pub session_id: String,
    pub frame_idx: u64,
    pub object_id: u32,
    pub points: Vec<[f32; 2]>,
    /// 1 = positive, 0 = negative, aligned with `points`.
    pub labels: Vec<u8>,
    pub name: String,
    pub category: String,
}

impl AddObjectRequest {
    pub fn from_prompts(
        session_id: impl Into<String>,
        frame_idx: u64,
        object_id: u32,
        prompts: &[PointPrompt],
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            frame_idx,
            object_id,
            points: prompts.iter().map(|p| [p.x, p.y]).collect(),
            labels: prompts
                .iter()
                .map(|p| if p.is_positive { 1 } else { 0 })
                .collect(),
            name: name.into(),
            category: category.into(),
        }
    }
}

/// One tracked object as the backend sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedObject {
    pub object_id: u32,
    /// Encoded mask on the frame the object was registered on.
    pub mask: Vec<u8>,
    /// Display color assigned by the backend.
    pub color: [u8; 3],
}

/// Result of a completed propagation pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagateSummary {
    pub total_frames: u64,
    pub total_objects: u32,
}

/// External tracking backend. `propagate` reports incremental progress
/// (0-100) through the callback while it runs.
pub trait TrackingService {
    fn initialize(&mut self, video_path: &str) -> Result<SessionInfo, TrackingError>;

    fn add_object(&mut self, request: &AddObjectRequest) -> Result<TrackedObject, TrackingError>;

    fn propagate(
        &mut self,
        session_id: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<PropagateSummary, TrackingError>;

    fn frame_masks(
        &mut self,
        session_id: &str,
        frame_idx: u64,
    ) -> Result<HashMap<u32, Vec<u8>>, TrackingError>;

    fn close(&mut self, session_id: &str) -> Result<(), TrackingError>;
}

// ============================================================================
// Session orchestrator
// ============================================================================

/// Workflow phase of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    /// No session open yet.
    #[default]
    Idle,
    /// Session open; objects can be added and propagation started.
    Ready,
    /// Bulk propagation in progress.
    Propagating,
    /// Session closed; late progress and results are discarded.
    Closed,
}

/// Sequences the tracking workflow over a [`TrackingService`].
///
/// Progress arrives through [`on_progress`](Self::on_progress) so the
/// shell can forward backend callbacks as ordinary messages; once the
/// session is closed those updates are dropped, which is what makes
/// closing an effective abort.
#[derive(Debug, Default)]
pub struct TrackingSession {
    info: Option<SessionInfo>,
    state: TrackingState,
    progress: u8,
    objects: Vec<TrackedObject>,
    next_object_id: u32,
}

impl TrackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn info(&self) -> Option<&SessionInfo> {
        self.info.as_ref()
    }

    /// Propagation progress, 0-100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    /// Initialize a backend session for `video_path`.
    pub fn open(
        &mut self,
        service: &mut dyn TrackingService,
        video_path: &str,
    ) -> Result<&SessionInfo, TrackingError> {
        let info = service.initialize(video_path)?;
        log::info!(
            "Tracking session {} opened: {} frames at {:.1} fps",
            info.session_id,
            info.total_frames,
            info.fps
        );
        self.info = Some(info);
        self.state = TrackingState::Ready;
        self.progress = 0;
        self.objects.clear();
        self.next_object_id = 1;
        Ok(self.info.as_ref().unwrap())
    }

    /// Register an object to track, identified by the accumulated point
    /// prompts on `frame_idx`.
    pub fn add_object(
        &mut self,
        service: &mut dyn TrackingService,
        frame_idx: u64,
        prompts: &[PointPrompt],
        name: &str,
        category: &str,
    ) -> Result<&TrackedObject, TrackingError> {
        let info = self.require_ready()?;
        let request = AddObjectRequest::from_prompts(
            info.session_id.clone(),
            frame_idx,
            self.next_object_id,
            prompts,
            name,
            category,
        );
        let object = service.add_object(&request)?;
        log::info!(
            "Added tracked object {} ({name}) on frame {frame_idx}",
            object.object_id
        );
        self.next_object_id += 1;
        self.objects.push(object);
        Ok(self.objects.last().unwrap())
    }

    /// Mark the session as propagating. The shell then drives
    /// `service.propagate`, forwarding each progress callback to
    /// [`on_progress`](Self::on_progress) and the final result to
    /// [`propagation_finished`](Self::propagation_finished).
    pub fn begin_propagation(&mut self) -> Result<(), TrackingError> {
        self.require_ready()?;
        self.state = TrackingState::Propagating;
        self.progress = 0;
        Ok(())
    }

    /// Record a progress update. Returns false (and drops the update) when
    /// the session is no longer propagating, e.g. after an abort by close.
    pub fn on_progress(&mut self, percent: u8) -> bool {
        if self.state != TrackingState::Propagating {
            log::debug!("Dropped tracking progress {percent}% after session left propagation");
            return false;
        }
        self.progress = percent.min(100);
        true
    }

    /// Propagation completed; back to Ready unless the session was closed
    /// mid-run, in which case the result is discarded.
    pub fn propagation_finished(&mut self, summary: PropagateSummary) -> Option<PropagateSummary> {
        if self.state != TrackingState::Propagating {
            log::debug!("Dropped propagation result after session close");
            return None;
        }
        self.progress = 100;
        self.state = TrackingState::Ready;
        log::info!(
            "Propagation complete: {} objects over {} frames",
            summary.total_objects,
            summary.total_frames
        );
        Some(summary)
    }

    /// Propagation aborted with a backend error. The session stays usable
    /// so the run can be retried.
    pub fn propagation_failed(&mut self) {
        if self.state == TrackingState::Propagating {
            self.state = TrackingState::Ready;
            self.progress = 0;
        }
    }

    /// Fetch the per-object masks of one frame.
    pub fn frame_masks(
        &mut self,
        service: &mut dyn TrackingService,
        frame_idx: u64,
    ) -> Result<HashMap<u32, Vec<u8>>, TrackingError> {
        let info = self.require_ready()?;
        let session_id = info.session_id.clone();
        service.frame_masks(&session_id, frame_idx)
    }

    /// Close the session. This is also the abort path: the state flips to
    /// Closed immediately, so any in-flight progress or results are
    /// discarded even if the backend close call itself fails.
    pub fn close(&mut self, service: &mut dyn TrackingService) -> Result<(), TrackingError> {
        let Some(info) = self.info.take() else {
            return Err(TrackingError::NotOpen);
        };
        self.state = TrackingState::Closed;
        self.progress = 0;
        service.close(&info.session_id)
    }

    fn require_ready(&self) -> Result<&SessionInfo, TrackingError> {
        match self.state {
            TrackingState::Idle => Err(TrackingError::NotOpen),
            TrackingState::Closed => Err(TrackingError::Closed),
            TrackingState::Ready | TrackingState::Propagating => {
                self.info.as_ref().ok_or(TrackingError::NotOpen)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    /// Backend double that records calls and serves canned data.
    #[derive(Default)]
    struct FakeBackend {
        closed: Vec<String>,
        objects_added: u32,
    }

    impl TrackingService for FakeBackend {
        fn initialize(&mut self, video_path: &str) -> Result<SessionInfo, TrackingError> {
            Ok(SessionInfo {
                session_id: format!("session-{video_path}"),
                total_frames: 120,
                frame_width: 1920,
                frame_height: 1080,
                fps: 30.0,
            })
        }

        fn add_object(
            &mut self,
            request: &AddObjectRequest,
        ) -> Result<TrackedObject, TrackingError> {
            self.objects_added += 1;
            Ok(TrackedObject {
                object_id: request.object_id,
                mask: vec![0xAB],
                color: [200, 40, 40],
            })
        }

        fn propagate(
            &mut self,
            _session_id: &str,
            progress: &mut dyn FnMut(u8),
        ) -> Result<PropagateSummary, TrackingError> {
            for pct in [10, 50, 100] {
                progress(pct);
            }
            Ok(PropagateSummary {
                total_frames: 120,
                total_objects: self.objects_added,
            })
        }

        fn frame_masks(
            &mut self,
            _session_id: &str,
            frame_idx: u64,
        ) -> Result<HashMap<u32, Vec<u8>>, TrackingError> {
            let mut masks = HashMap::new();
            masks.insert(1, vec![frame_idx as u8]);
            Ok(masks)
        }

        fn close(&mut self, session_id: &str) -> Result<(), TrackingError> {
            self.closed.push(session_id.to_string());
            Ok(())
        }
    }

    fn prompts() -> Vec<PointPrompt> {
        vec![
            PointPrompt::new(Point::new(100.0, 100.0), true),
            PointPrompt::new(Point::new(300.0, 200.0), false),
        ]
    }

    #[test]
    fn test_full_workflow() {
        let mut backend = FakeBackend::default();
        let mut session = TrackingSession::new();

        session.open(&mut backend, "clip.mp4").unwrap();
        assert_eq!(session.state(), TrackingState::Ready);
        assert_eq!(session.info().unwrap().total_frames, 120);

        let object = session
            .add_object(&mut backend, 0, &prompts(), "car", "vehicle")
            .unwrap();
        assert_eq!(object.object_id, 1);

        session.begin_propagation().unwrap();
        let mut backend_progress = Vec::new();
        let summary = backend
            .propagate("session-clip.mp4", &mut |pct| {
                backend_progress.push(pct);
            })
            .unwrap();
        for pct in backend_progress {
            assert!(session.on_progress(pct));
        }
        assert_eq!(session.progress(), 100);
        assert!(session.propagation_finished(summary).is_some());
        assert_eq!(session.state(), TrackingState::Ready);

        let masks = session.frame_masks(&mut backend, 7).unwrap();
        assert_eq!(masks.get(&1), Some(&vec![7u8]));

        session.close(&mut backend).unwrap();
        assert_eq!(backend.closed, vec!["session-clip.mp4".to_string()]);
    }

    #[test]
    fn test_operations_require_open_session() {
        let mut backend = FakeBackend::default();
        let mut session = TrackingSession::new();
        let err = session
            .add_object(&mut backend, 0, &prompts(), "x", "y")
            .unwrap_err();
        assert!(matches!(err, TrackingError::NotOpen));
        assert!(matches!(
            session.begin_propagation().unwrap_err(),
            TrackingError::NotOpen
        ));
    }

    #[test]
    fn test_close_aborts_propagation() {
        let mut backend = FakeBackend::default();
        let mut session = TrackingSession::new();
        session.open(&mut backend, "clip.mp4").unwrap();
        session.begin_propagation().unwrap();
        assert!(session.on_progress(40));

        session.close(&mut backend).unwrap();
        assert_eq!(session.state(), TrackingState::Closed);

        // Late progress and the late result are discarded.
        assert!(!session.on_progress(80));
        let late = PropagateSummary {
            total_frames: 120,
            total_objects: 1,
        };
        assert!(session.propagation_finished(late).is_none());
    }

    #[test]
    fn test_closed_session_rejects_further_work() {
        let mut backend = FakeBackend::default();
        let mut session = TrackingSession::new();
        session.open(&mut backend, "clip.mp4").unwrap();
        session.close(&mut backend).unwrap();
        let err = session
            .add_object(&mut backend, 0, &prompts(), "x", "y")
            .unwrap_err();
        assert!(matches!(err, TrackingError::Closed));
    }

    #[test]
    fn test_add_object_request_splits_points_and_labels() {
        let request = AddObjectRequest::from_prompts("s", 3, 9, &prompts(), "car", "vehicle");
        assert_eq!(request.points, vec![[100.0, 100.0], [300.0, 200.0]]);
        assert_eq!(request.labels, vec![1, 0]);
        assert_eq!(request.frame_idx, 3);
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let mut backend = FakeBackend::default();
        let mut session = TrackingSession::new();
        session.open(&mut backend, "clip.mp4").unwrap();
        session.begin_propagation().unwrap();
        session.on_progress(250);
        assert_eq!(session.progress(), 100);
    }
}
