//! Error taxonomy for the annotation core.
//!
//! Every failure class defined here is recoverable: the core is an
//! interactive editing tool and must never lose in-progress work. Errors
//! carry enough context for a human-readable status message per class.

use thiserror::Error;

/// Mask decode failures. Wrong-size masks are not an error: decoding
/// scales them and flags the mismatch instead.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("Failed to decode mask image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Predictor request failures, one variant per user-facing message.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Prediction timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Predictor returned a response without a mask")]
    MissingMask,

    #[error("Predictor request failed: {0}")]
    Server(String),

    #[error("Returned mask is unusable: {0}")]
    Mask(#[from] MaskError),
}

/// Mask adjustment request failures.
#[derive(Debug, Error)]
pub enum AdjustmentError {
    #[error("Adjustment amount {0} is outside 1-20")]
    InvalidAmount(u8),

    #[error("Adjustment request failed: {0}")]
    Server(String),
}

/// Video-tracking session failures.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Failed to initialize tracking session: {0}")]
    Initialize(String),

    #[error("No tracking session is open")]
    NotOpen,

    #[error("Tracking session was closed")]
    Closed,

    #[error("Tracking request failed: {0}")]
    Server(String),
}

/// Annotation persistence failures. Local in-memory state is not rolled
/// back on these; the user retries explicitly.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to save annotation: {0}")]
    Save(String),

    #[error("Failed to delete annotation: {0}")]
    Delete(String),

    #[error("Failed to load annotations: {0}")]
    Load(String),
}
