//! Image decoding, grayscale conversion and input validation.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP, GIF) and produces the
//! single-channel intensity buffers every transitioner consumes.

use image::GrayImage;

use crate::types::{Dimensions, TransitionError};

/// Decode raw image bytes and convert to grayscale.
///
/// Uses the `image` crate's luminance conversion
/// (`0.299*R + 0.587*G + 0.114*B`).
///
/// # Errors
///
/// Returns [`TransitionError::EmptyInput`] if `bytes` is empty.
/// Returns [`TransitionError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded grayscale image"]
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, TransitionError> {
    if bytes.is_empty() {
        return Err(TransitionError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Check that a start/target pair can be transitioned.
///
/// # Errors
///
/// Returns [`TransitionError::EmptyImage`] if either image has no pixels
/// and [`TransitionError::DimensionMismatch`] if their sizes differ.
pub fn ensure_same_dimensions(start: &GrayImage, target: &GrayImage) -> Result<(), TransitionError> {
    let start_dims = Dimensions::of(start);
    let target_dims = Dimensions::of(target);

    if start_dims.pixel_count() == 0 || target_dims.pixel_count() == 0 {
        return Err(TransitionError::EmptyImage);
    }
    if start_dims != target_dims {
        return Err(TransitionError::DimensionMismatch {
            start: start_dims,
            target: target_dims,
        });
    }
    Ok(())
}
