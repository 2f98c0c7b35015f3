//! MJPEG AVI serializer.
//!
//! Writes a RIFF `AVI ` file with a single video stream whose frames are
//! independent JPEG images:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'
//!     avih                      main header
//!     LIST 'strl'
//!       strh                    stream header ('vids', 'MJPG')
//!       strf                    BITMAPINFOHEADER
//!   LIST 'movi'
//!     00dc ...                  one JPEG per frame
//!   idx1                        keyframe index into 'movi'
//! ```
//!
//! All integers are little-endian. Chunk payloads are padded to an even
//! length.

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use grayfade_pipeline::{Dimensions, GrayImage};

use crate::{ExportError, frame_dimensions};

/// `AVIF_HASINDEX`: the file carries an `idx1` chunk.
const AVIF_HASINDEX: u32 = 0x10;
/// `AVIIF_KEYFRAME`: every MJPEG frame is a keyframe.
const AVIIF_KEYFRAME: u32 = 0x10;

/// Settings for [`to_avi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AviOptions {
    /// Playback rate in frames per second. Zero is treated as one.
    pub fps: u32,
    /// JPEG quality, 1 to 100.
    pub quality: u8,
}

impl AviOptions {
    /// Default playback rate.
    pub const DEFAULT_FPS: u32 = 10;
    /// Default JPEG quality.
    pub const DEFAULT_QUALITY: u8 = 90;
}

impl Default for AviOptions {
    fn default() -> Self {
        Self {
            fps: Self::DEFAULT_FPS,
            quality: Self::DEFAULT_QUALITY,
        }
    }
}

/// Encode `frames` as an MJPEG AVI.
///
/// # Errors
///
/// Returns [`ExportError::NoFrames`] or [`ExportError::FrameSizeMismatch`]
/// for an unusable sequence, [`ExportError::Encode`] if a JPEG fails to
/// encode, and [`ExportError::TooLarge`] if the file would exceed the
/// 4 GiB RIFF limit.
pub fn to_avi(frames: &[GrayImage], options: &AviOptions) -> Result<Vec<u8>, ExportError> {
    let dims = frame_dimensions(frames)?;
    let fps = options.fps.max(1);

    let jpegs = frames
        .iter()
        .map(|frame| encode_jpeg(frame, options.quality))
        .collect::<Result<Vec<_>, _>>()?;

    let mut movi = Vec::new();
    let mut index = Vec::with_capacity(jpegs.len() * 16);
    for jpeg in &jpegs {
        // Offsets are measured from the 'movi' list type.
        let offset = u32_len(movi.len() + 4)?;
        write_chunk(&mut movi, b"00dc", jpeg)?;
        index.extend_from_slice(b"00dc");
        index.extend_from_slice(&AVIIF_KEYFRAME.to_le_bytes());
        index.extend_from_slice(&offset.to_le_bytes());
        index.extend_from_slice(&u32_len(jpeg.len())?.to_le_bytes());
    }

    let largest = jpegs.iter().map(Vec::len).max().unwrap_or(0);
    let header = Header {
        dims,
        fps,
        frame_count: u32_len(jpegs.len())?,
        largest_frame: u32_len(largest)?,
    };

    let mut strl = Vec::new();
    write_chunk(&mut strl, b"strh", &header.stream_header())?;
    write_chunk(&mut strl, b"strf", &header.bitmap_info())?;

    let mut hdrl = Vec::new();
    write_chunk(&mut hdrl, b"avih", &header.main_header())?;
    write_list(&mut hdrl, b"strl", &strl)?;

    let mut body = Vec::new();
    write_list(&mut body, b"hdrl", &hdrl)?;
    write_list(&mut body, b"movi", &movi)?;
    write_chunk(&mut body, b"idx1", &index)?;

    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&u32_len(body.len() + 4)?.to_le_bytes());
    out.extend_from_slice(b"AVI ");
    out.extend_from_slice(&body);
    Ok(out)
}

fn encode_jpeg(frame: &GrayImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode(
        frame.as_raw(),
        frame.width(),
        frame.height(),
        ExtendedColorType::L8,
    )?;
    Ok(buf)
}

/// Values shared by the three header chunks.
struct Header {
    dims: Dimensions,
    fps: u32,
    frame_count: u32,
    largest_frame: u32,
}

impl Header {
    /// `avih`, 56 bytes.
    fn main_header(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(56);
        push_u32(&mut b, 1_000_000 / self.fps);
        push_u32(&mut b, self.largest_frame.saturating_mul(self.fps));
        push_u32(&mut b, 0);
        push_u32(&mut b, AVIF_HASINDEX);
        push_u32(&mut b, self.frame_count);
        push_u32(&mut b, 0);
        push_u32(&mut b, 1);
        push_u32(&mut b, self.largest_frame);
        push_u32(&mut b, self.dims.width);
        push_u32(&mut b, self.dims.height);
        b.extend_from_slice(&[0; 16]);
        b
    }

    /// `strh`, 56 bytes.
    fn stream_header(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(56);
        b.extend_from_slice(b"vids");
        b.extend_from_slice(b"MJPG");
        push_u32(&mut b, 0);
        b.extend_from_slice(&0u16.to_le_bytes());
        b.extend_from_slice(&0u16.to_le_bytes());
        push_u32(&mut b, 0);
        push_u32(&mut b, 1);
        push_u32(&mut b, self.fps);
        push_u32(&mut b, 0);
        push_u32(&mut b, self.frame_count);
        push_u32(&mut b, self.largest_frame);
        push_u32(&mut b, u32::MAX);
        push_u32(&mut b, 0);
        for edge in [0, 0, self.dims.width, self.dims.height] {
            let edge = u16::try_from(edge).unwrap_or(u16::MAX);
            b.extend_from_slice(&edge.to_le_bytes());
        }
        b
    }

    /// `strf`: a 40-byte `BITMAPINFOHEADER`.
    fn bitmap_info(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(40);
        push_u32(&mut b, 40);
        push_u32(&mut b, self.dims.width);
        push_u32(&mut b, self.dims.height);
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&24u16.to_le_bytes());
        b.extend_from_slice(b"MJPG");
        let image_size = self.dims.pixel_count().saturating_mul(3);
        push_u32(&mut b, u32::try_from(image_size).unwrap_or(u32::MAX));
        b.extend_from_slice(&[0; 16]);
        b
    }
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn u32_len(len: usize) -> Result<u32, ExportError> {
    u32::try_from(len).map_err(|_| ExportError::TooLarge(format!("{len} bytes exceeds the RIFF limit")))
}

fn write_chunk(out: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) -> Result<(), ExportError> {
    out.extend_from_slice(id);
    out.extend_from_slice(&u32_len(data.len())?.to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    Ok(())
}

fn write_list(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) -> Result<(), ExportError> {
    out.extend_from_slice(b"LIST");
    out.extend_from_slice(&u32_len(data.len() + 4)?.to_le_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    Ok(())
}
