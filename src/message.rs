//! Application message types.
//!
//! All input events and asynchronous results are represented as messages
//! in the Elm architecture style. The shell (whatever windowing or IPC
//! layer hosts the core) translates raw events into these and feeds the
//! results of service calls back as messages too, so every state change
//! flows through one update path.

use crate::canvas::AnnotationMode;
use crate::error::{AdjustmentError, PredictError, TrackingError};
use crate::geometry::Point;
use crate::mask::DecodedMask;
use crate::session::{AdjustRequest, AdjustmentKind, PredictRequest, RequestToken};
use crate::tracking::PropagateSummary;

/// Messages that update application state.
#[derive(Debug)]
pub enum Message {
    // Canvas lifecycle
    /// Viewport was resized (width, height in screen pixels).
    ViewportResized(f32, f32),
    /// A frame finished loading: id, encoded image bytes, source size.
    FrameLoaded {
        frame_id: u64,
        image_data: Vec<u8>,
        width: f32,
        height: f32,
    },

    // Input
    /// Pointer pressed at a screen position; `modifier` is the delete
    /// modifier for polygon editing.
    PointerDown { position: Point, modifier: bool },
    /// Pointer moved to a screen position.
    PointerMoved(Point),
    /// Pointer released.
    PointerUp,

    // Mode and prompts
    /// Annotation mode selected.
    ModeSelected(AnnotationMode),
    /// Flip the sticky point polarity.
    PolarityToggled,
    /// Switch the active mask into polygon editing.
    EditPolygon,
    /// Category selected by ID.
    CategorySelected(u32),

    // Prediction results, fed back by the shell
    /// A prediction request finished (successfully or not). Stale tokens
    /// are discarded without touching canvas state.
    PredictionResolved {
        token: RequestToken,
        result: Result<DecodedMask, PredictError>,
    },
    /// Mask adjustment requested on the active mask.
    AdjustMask { kind: AdjustmentKind, amount: u8 },
    /// A mask adjustment finished. Goes through the same staleness gate
    /// as predictions.
    AdjustResolved {
        token: RequestToken,
        result: Result<DecodedMask, AdjustmentError>,
    },

    // Annotation lifecycle
    /// Commit the in-progress annotation under the selected category.
    CommitAnnotation,
    /// Discard all in-progress prompts and the active mask.
    CancelAnnotation,
    /// Delete a committed annotation by ID.
    DeleteAnnotation(u64),

    // Video tracking
    /// Open a tracking session for a video.
    OpenTracking(String),
    /// Register the accumulated point prompts as a tracked object on the
    /// current frame.
    TrackObject { name: String, category: String },
    /// Run mask propagation across the video.
    StartPropagation,
    /// Propagation progress report, 0 to 100. Late reports after close
    /// are dropped.
    PropagationProgress(u8),
    /// Propagation finished; per-frame results can now be fetched.
    PropagationFinished(Result<PropagateSummary, TrackingError>),
    /// Fetch the tracked masks for a frame.
    LoadTrackedMasks(u64),
    /// Close the tracking session, aborting any propagation in flight.
    CloseTracking,
}

/// Work the shell must perform after an update. The two service calls
/// that can take seconds are returned as effects instead of being run
/// inside the update path; their outcomes come back as messages carrying
/// the request token.
#[derive(Debug)]
pub enum Effect {
    /// Call the predictor, then feed back
    /// [`Message::PredictionResolved`].
    Predict {
        token: RequestToken,
        request: PredictRequest,
    },
    /// Call the adjustment service, then feed back
    /// [`Message::AdjustResolved`].
    Adjust {
        token: RequestToken,
        request: AdjustRequest,
    },
    /// Drive backend propagation, forwarding progress callbacks as
    /// [`Message::PropagationProgress`] and the result as
    /// [`Message::PropagationFinished`].
    Propagate { session_id: String },
}
