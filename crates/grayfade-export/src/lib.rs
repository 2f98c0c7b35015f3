//! grayfade-export: Pure frame-sequence serializers (sans-IO)
//!
//! Encodes the grayscale frames produced by `grayfade-pipeline` into
//! animation formats. Currently supports animated GIF and MJPEG AVI.
//! Every serializer returns the encoded file as bytes; writing them
//! anywhere is the caller's job.

pub mod avi;
pub mod gif;

pub use avi::{AviOptions, to_avi};
pub use gif::{GifOptions, GifRepeat, to_gif};

use grayfade_pipeline::{Dimensions, GrayImage};

/// Errors that can occur while encoding a frame sequence.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// There are no frames to encode.
    #[error("no frames to encode")]
    NoFrames,

    /// A frame's size differs from the first frame's.
    #[error("frame {index} is {found}, expected {expected}")]
    FrameSizeMismatch {
        /// Position of the offending frame.
        index: usize,
        /// Size of the first frame.
        expected: Dimensions,
        /// Size of the offending frame.
        found: Dimensions,
    },

    /// The underlying image encoder failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    /// The output exceeds a limit of the container format.
    #[error("output too large: {0}")]
    TooLarge(String),
}

/// Check that `frames` is non-empty and uniformly sized, returning the
/// shared size.
///
/// # Errors
///
/// Returns [`ExportError::NoFrames`] or [`ExportError::FrameSizeMismatch`].
pub fn frame_dimensions(frames: &[GrayImage]) -> Result<Dimensions, ExportError> {
    let first = frames.first().ok_or(ExportError::NoFrames)?;
    let expected = Dimensions::of(first);

    for (index, frame) in frames.iter().enumerate().skip(1) {
        let found = Dimensions::of(frame);
        if found != expected {
            return Err(ExportError::FrameSizeMismatch {
                index,
                expected,
                found,
            });
        }
    }
    Ok(expected)
}
