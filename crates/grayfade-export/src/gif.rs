//! Animated GIF serializer.
//!
//! Each grayscale frame is expanded to RGBA and handed to
//! [`image::codecs::gif::GifEncoder`], which quantizes it into the GIF
//! palette. Every frame gets the same delay.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};

use grayfade_pipeline::GrayImage;

use crate::{ExportError, frame_dimensions};

/// How many times a GIF animation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GifRepeat {
    /// Loop forever.
    #[default]
    Infinite,
    /// Play this many extra times after the first.
    Finite(u16),
}

impl From<GifRepeat> for Repeat {
    fn from(repeat: GifRepeat) -> Self {
        match repeat {
            GifRepeat::Infinite => Self::Infinite,
            GifRepeat::Finite(n) => Self::Finite(n),
        }
    }
}

/// Settings for [`to_gif`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifOptions {
    /// Display time of each frame in milliseconds.
    pub delay_ms: u32,
    /// How many times the animation plays.
    pub repeat: GifRepeat,
}

impl GifOptions {
    /// Default frame delay.
    pub const DEFAULT_DELAY_MS: u32 = 50;
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            delay_ms: Self::DEFAULT_DELAY_MS,
            repeat: GifRepeat::Infinite,
        }
    }
}

/// Encode `frames` as an animated GIF.
///
/// # Errors
///
/// Returns [`ExportError::NoFrames`] or [`ExportError::FrameSizeMismatch`]
/// for an unusable sequence, [`ExportError::TooLarge`] if the frames
/// exceed GIF's 16-bit dimensions, and [`ExportError::Encode`] if the
/// encoder fails.
pub fn to_gif(frames: &[GrayImage], options: &GifOptions) -> Result<Vec<u8>, ExportError> {
    let dims = frame_dimensions(frames)?;
    if u16::try_from(dims.width).is_err() || u16::try_from(dims.height).is_err() {
        return Err(ExportError::TooLarge(format!(
            "GIF frames are limited to 65535x65535, got {dims}"
        )));
    }

    let delay = Delay::from_numer_denom_ms(options.delay_ms, 1);
    let mut buf = Vec::new();
    {
        // The encoder writes the trailer when dropped.
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(options.repeat.into())?;
        for frame in frames {
            let rgba = DynamicImage::ImageLuma8(frame.clone()).into_rgba8();
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::AnimationDecoder;
    use image::codecs::gif::GifDecoder;
    use std::io::Cursor;

    fn frames() -> Vec<GrayImage> {
        (0..3u8)
            .map(|i| GrayImage::from_fn(4, 2, |x, _| image::Luma([i * 60 + u8::try_from(x).unwrap()])))
            .collect()
    }

    #[test]
    fn output_is_a_gif() {
        let gif = to_gif(&frames(), &GifOptions::default()).unwrap();
        assert!(gif.starts_with(b"GIF89a"));
        assert_eq!(gif.last(), Some(&0x3B));
    }

    #[test]
    fn decodes_to_same_frame_count_and_delay() {
        let options = GifOptions {
            delay_ms: 120,
            repeat: GifRepeat::Finite(2),
        };
        let gif = to_gif(&frames(), &options).unwrap();

        let decoded = GifDecoder::new(Cursor::new(gif))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].buffer().dimensions(), (4, 2));
        assert_eq!(decoded[1].delay().numer_denom_ms(), (120, 1));
    }

    #[test]
    fn black_and_white_survive_quantization() {
        let frames = vec![GrayImage::from_raw(2, 1, vec![0, 255]).unwrap()];
        let gif = to_gif(&frames, &GifOptions::default()).unwrap();
        let decoded = GifDecoder::new(Cursor::new(gif))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        let pixels = decoded[0].buffer();
        assert_eq!(pixels.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(pixels.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            to_gif(&[], &GifOptions::default()),
            Err(ExportError::NoFrames)
        ));
    }
}
