//! Embedded preview decoding.
//!
//! A CR2 carries three preview images besides the RAW payload: two baseline
//! JPEGs (full-size preview and thumbnail), decoded here through the `image`
//! crate, and one uncompressed 16-bit RGB frame.

use std::io::{Cursor, Read};

use image::{DynamicImage, ImageFormat, ImageReader, Rgba};

use crate::error::DecodeError;
use crate::io::StreamReader;

use super::Rgba16Image;

/// Decode an embedded baseline JPEG into a pixel raster.
pub fn decode_jpeg(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    ImageReader::with_format(Cursor::new(bytes), ImageFormat::Jpeg)
        .decode()
        .map_err(|err| DecodeError::BadStream(format!("embedded jpeg: {}", err)))
}

/// Decode the uncompressed RGB preview from IFD#2.
///
/// The payload is `width · height` pixels of three consecutive little-endian
/// u16 samples each — `6 · width · height` bytes in total. Channels are
/// scaled by 4 into the 16-bit output range with opaque alpha.
pub fn decode_rgb16<R: Read>(
    reader: &mut StreamReader<R>,
    width: u16,
    height: u16,
) -> Result<Rgba16Image, DecodeError> {
    let mut image = Rgba16Image::new(width as u32, height as u32);
    for y in 0..height as u32 {
        for x in 0..width as u32 {
            let r = reader.read_u16()?;
            let g = reader.read_u16()?;
            let b = reader.read_u16()?;
            image.put_pixel(
                x,
                y,
                Rgba([
                    r.wrapping_mul(4),
                    g.wrapping_mul(4),
                    b.wrapping_mul(4),
                    0xFFFF,
                ]),
            );
        }
    }
    Ok(image)
}

// =============================================================================
// Tests
// =============================================================================
