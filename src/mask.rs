//! Raster mask codec and binarization.
//!
//! A mask travels between the core and the predictor as an opaque encoded
//! blob (single-channel PNG). Decoded masks are always 640x480; anything
//! else is a backend contract violation that gets flagged here rather than
//! silently accepted, while display paths may still scale best-effort.

use image::{imageops::FilterType, GrayImage, ImageFormat};
use ndarray::Array2;
use std::io::Cursor;

use crate::constants::mask::{FALLBACK_THRESHOLD, FOREGROUND_THRESHOLD, HEIGHT, WIDTH};
use crate::error::MaskError;

/// Decoded single-channel pixel buffer, indexed `[(y, x)]`.
pub type MaskBuffer = Array2<u8>;

/// An all-background buffer at the required dimensions.
pub fn empty_buffer() -> MaskBuffer {
    Array2::zeros((HEIGHT as usize, WIDTH as usize))
}

/// Foreground test at the contract threshold.
#[inline]
pub fn is_foreground(value: u8) -> bool {
    value > FOREGROUND_THRESHOLD
}

/// Result of decoding an encoded mask blob.
#[derive(Debug, Clone)]
pub struct DecodedMask {
    pub buffer: MaskBuffer,
    /// Set when the source was not 640x480 and was scaled to fit. The
    /// mismatch is also logged so tests and diagnostics can observe it.
    pub resized: bool,
}

/// Decode an encoded mask, scaling wrong-size inputs to 640x480.
///
/// Malformed bytes are a recoverable [`MaskError::Decode`]; callers fall
/// back to a placeholder render instead of propagating a crash.
pub fn decode(encoded: &[u8]) -> Result<DecodedMask, MaskError> {
    let gray = image::load_from_memory(encoded)?.into_luma8();
    let resized = gray.width() != WIDTH || gray.height() != HEIGHT;
    let gray = if resized {
        log::warn!(
            "Mask is {}x{}, expected {}x{}; scaling to fit",
            gray.width(),
            gray.height(),
            WIDTH,
            HEIGHT
        );
        image::imageops::resize(&gray, WIDTH, HEIGHT, FilterType::Nearest)
    } else {
        gray
    };
    Ok(DecodedMask {
        buffer: buffer_from_gray(&gray),
        resized,
    })
}

/// Encode a pixel buffer as a single-channel PNG blob.
pub fn encode(buffer: &MaskBuffer) -> Result<Vec<u8>, MaskError> {
    let (h, w) = buffer.dim();
    let mut gray = GrayImage::new(w as u32, h as u32);
    for ((y, x), v) in buffer.indexed_iter() {
        gray.put_pixel(x as u32, y as u32, image::Luma([*v]));
    }
    let mut bytes = Vec::new();
    gray.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn buffer_from_gray(gray: &GrayImage) -> MaskBuffer {
    Array2::from_shape_fn(
        (gray.height() as usize, gray.width() as usize),
        |(y, x)| gray.get_pixel(x as u32, y as u32).0[0],
    )
}

// ============================================================================
// Binarization
// ============================================================================

/// Which threshold produced the foreground set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdUsed {
    /// The contract threshold (intensity > 128).
    High,
    /// The fallback (intensity > 0), used only when the high threshold
    /// found zero foreground pixels.
    LowFallback,
}

/// Binarized view of a mask buffer.
#[derive(Debug, Clone)]
pub struct Binarized {
    pub foreground: Array2<bool>,
    pub threshold: ThresholdUsed,
    pub foreground_count: usize,
}

impl Binarized {
    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.foreground.get((y, x)).copied().unwrap_or(false)
    }

    pub fn width(&self) -> usize {
        self.foreground.ncols()
    }

    pub fn height(&self) -> usize {
        self.foreground.nrows()
    }
}

/// Binarize a buffer with the contract threshold, falling back to the low
/// threshold when the high one yields nothing.
///
/// The fallback is a deliberate robustness policy for low-contrast inputs,
/// not silent data loss: the chosen threshold and the resulting count are
/// part of the return value.
pub fn binarize(buffer: &MaskBuffer) -> Binarized {
    let high = buffer.mapv(|v| v > FOREGROUND_THRESHOLD);
    let count = high.iter().filter(|&&b| b).count();
    if count > 0 {
        return Binarized {
            foreground: high,
            threshold: ThresholdUsed::High,
            foreground_count: count,
        };
    }

    let low = buffer.mapv(|v| v > FALLBACK_THRESHOLD);
    let count = low.iter().filter(|&&b| b).count();
    if count > 0 {
        log::debug!(
            "Foreground threshold fallback engaged: {} pixels above low threshold",
            count
        );
    }
    Binarized {
        foreground: low,
        threshold: ThresholdUsed::LowFallback,
        foreground_count: count,
    }
}

// ============================================================================
// Tests
// ============================================================================
