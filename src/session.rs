//! Prediction session orchestration.
//!
//! The predictor is an external collaborator behind [`PredictorService`];
//! this module owns the bookkeeping around it: the busy indicator, request
//! tokens, and the staleness check that discards responses arriving after
//! the user has moved on. The shell performs the actual (possibly slow)
//! service call and feeds the result back as a message carrying the token.

use serde::{Deserialize, Serialize};

use crate::constants::session::{ADJUST_AMOUNT_MAX, ADJUST_AMOUNT_MIN};
use crate::error::{AdjustmentError, PredictError};
use crate::mask::{self, DecodedMask};
use crate::model::{BoxPrompt, PointPrompt, PromptType};

// ============================================================================
// Predictor boundary
// ============================================================================

/// A segmentation request. Prompts are always the *entire* accumulated set
/// for the in-progress annotation, replayed in insertion order; the
/// predictor sees no deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    /// Encoded still frame.
    pub image_data: Vec<u8>,
    pub prompt_type: PromptType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointPrompt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boxes: Vec<BoxPrompt>,
}

/// A predictor response. `mask` is nominally required; its absence in a
/// successful response is a validation error, not a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub mask: Option<Vec<u8>>,
    pub confidence: f32,
    pub processing_time_ms: u64,
    pub cached: bool,
}

/// External predictor service. Implementations must surface
/// [`PredictError::Timeout`] after a bounded wait
/// ([`crate::constants::session::PREDICT_TIMEOUT_MS`]).
pub trait PredictorService {
    fn predict(&mut self, request: &PredictRequest) -> Result<PredictResponse, PredictError>;
}

/// Validate a nominally successful response and decode its mask.
pub fn accept_response(response: &PredictResponse) -> Result<DecodedMask, PredictError> {
    let encoded = response.mask.as_deref().ok_or(PredictError::MissingMask)?;
    Ok(mask::decode(encoded)?)
}

// ============================================================================
// Mask adjustment boundary
// ============================================================================

/// Morphological mask adjustment operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Expand,
    Contract,
    Smooth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustRequest {
    pub mask_data: Vec<u8>,
    pub adjustment_type: AdjustmentKind,
    pub amount: u8,
}

impl AdjustRequest {
    /// Build a request, validating the 1-20 amount range.
    pub fn new(
        mask_data: Vec<u8>,
        adjustment_type: AdjustmentKind,
        amount: u8,
    ) -> Result<Self, AdjustmentError> {
        if !(ADJUST_AMOUNT_MIN..=ADJUST_AMOUNT_MAX).contains(&amount) {
            return Err(AdjustmentError::InvalidAmount(amount));
        }
        Ok(Self {
            mask_data,
            adjustment_type,
            amount,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustResponse {
    pub adjusted_mask: Vec<u8>,
}

pub trait MaskAdjustmentService {
    fn adjust(&mut self, request: &AdjustRequest) -> Result<AdjustResponse, AdjustmentError>;
}

// ============================================================================
// Request tokens and staleness
// ============================================================================

/// Identifies one in-flight prediction request. The epoch changes whenever
/// the active frame or mode changes, so a token from before the change can
/// never be accepted after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    id: u64,
    epoch: u64,
}

/// Tracks the single in-flight prediction request and discards stale
/// responses.
#[derive(Debug, Default)]
pub struct PredictionSession {
    next_id: u64,
    epoch: u64,
    in_flight: Option<RequestToken>,
    stale_discards: u64,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request is awaiting its response. The UI shows a busy
    /// indicator while this is set, and further submissions are ignored.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a request. Returns `None` while another request is in flight.
    pub fn begin(&mut self) -> Option<RequestToken> {
        if self.in_flight.is_some() {
            log::debug!("Prediction request ignored: another request is in flight");
            return None;
        }
        self.next_id += 1;
        let token = RequestToken {
            id: self.next_id,
            epoch: self.epoch,
        };
        self.in_flight = Some(token);
        Some(token)
    }

    /// The active frame or mode changed: everything in flight becomes
    /// stale and the busy indicator resets.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        if self.in_flight.take().is_some() {
            log::debug!("Invalidated in-flight prediction request (epoch {})", self.epoch);
        }
    }

    /// A response arrived for `token`. Returns true when the response is
    /// current and should be applied; stale responses are counted and
    /// dropped.
    pub fn finish(&mut self, token: RequestToken) -> bool {
        if self.in_flight == Some(token) && token.epoch == self.epoch {
            self.in_flight = None;
            return true;
        }
        self.stale_discards += 1;
        log::debug!(
            "Discarded stale prediction response (token {} epoch {}, now epoch {})",
            token.id,
            token.epoch,
            self.epoch
        );
        false
    }

    /// A failure arrived for `token`. Returns true when the failure
    /// belongs to the current request, resetting the busy indicator so
    /// the caller surfaces the error. A failure from before a frame or
    /// mode change is as stale as a success would be: it is counted and
    /// dropped without touching current state.
    pub fn fail(&mut self, token: RequestToken) -> bool {
        if self.in_flight == Some(token) && token.epoch == self.epoch {
            self.in_flight = None;
            return true;
        }
        self.stale_discards += 1;
        log::debug!(
            "Discarded stale prediction failure (token {} epoch {}, now epoch {})",
            token.id,
            token.epoch,
            self.epoch
        );
        false
    }

    /// Number of responses discarded as stale, for tests and diagnostics.
    pub fn stale_discards(&self) -> u64 {
        self.stale_discards
    }
}

// ============================================================================
// Tests
// ============================================================================
