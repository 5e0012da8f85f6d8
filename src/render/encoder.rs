//! Output encoding via the `image` crate.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::ServeError;
use crate::format::{Cr2Photo, Rgba16Image};

use super::OutputKind;

/// Default JPEG quality for the preview outputs (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Clamp a JPEG quality value to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

/// Encode one decoded output to its transport format.
///
/// JPEG-backed previews re-encode at `jpeg_quality`; the 16-bit outputs
/// encode as PNG to preserve sample depth.
pub fn encode_output(
    photo: &Cr2Photo,
    output: OutputKind,
    jpeg_quality: u8,
) -> Result<Bytes, ServeError> {
    match output {
        OutputKind::LargePreview => encode_jpeg(&photo.large_preview, jpeg_quality),
        OutputKind::Thumbnail => encode_jpeg(&photo.thumbnail, jpeg_quality),
        OutputKind::RgbPreview => encode_png16(&photo.rgb_preview),
        OutputKind::RawRender => encode_png16(&photo.raw_render),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Bytes, ServeError> {
    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, clamp_quality(quality));
    encoder
        .encode_image(image)
        .map_err(|err| ServeError::Encode {
            message: err.to_string(),
        })?;
    Ok(Bytes::from(output))
}

fn encode_png16(image: &Rgba16Image) -> Result<Bytes, ServeError> {
    let mut output = Cursor::new(Vec::new());
    DynamicImage::ImageRgba16(image.clone())
        .write_to(&mut output, ImageFormat::Png)
        .map_err(|err| ServeError::Encode {
            message: err.to_string(),
        })?;
    Ok(Bytes::from(output.into_inner()))
}

// =============================================================================
// Tests
// =============================================================================
