//! Frame/scan parsing, DPCM prediction, and slice reassembly.
//!
//! The entropy-coded scan does not walk the output image left-to-right: the
//! sensor image is split into vertical slices that the camera encoded in
//! sequence, so decoded samples fill slice 0 top-to-bottom, then slice 1,
//! and so on. [`SliceCursor`] maps the nested `(line, sample, component)`
//! scan order onto output coordinates.

use std::io::Read;

use image::Rgba;
use tracing::{debug, error};

use crate::error::DecodeError;
use crate::format::Rgba16Image;
use crate::io::StreamReader;

use super::bits::BitReader;
use super::huffman::{read_dht_tables, HuffmanTable};

// =============================================================================
// Markers
// =============================================================================

mod marker {
    /// Start of image.
    pub const SOI: u16 = 0xFFD8;
    /// Define Huffman tables.
    pub const DHT: u16 = 0xFFC4;
    /// Start of frame, lossless (SOF3).
    pub const SOF3: u16 = 0xFFC3;
    /// Start of scan.
    pub const SOS: u16 = 0xFFDA;
    /// End of image.
    pub const EOI: u16 = 0xFFD9;
}

/// Sample precision the decoder supports, in bits.
const SAMPLE_PRECISION: u8 = 14;

// =============================================================================
// SliceGeometry
// =============================================================================

/// CR2 slice geometry from tag 0xC640.
///
/// The output is composed of `count + 1` vertical slices: `count` slices of
/// `width` pixels followed by one of `last_width` pixels, which together
/// cover the padded image width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceGeometry {
    /// Number of full-width slices.
    pub count: u16,

    /// Width of each full slice in pixels.
    pub width: u16,

    /// Width of the final slice in pixels.
    pub last_width: u16,
}

impl SliceGeometry {
    /// Total width covered by all slices.
    pub fn padded_width(&self) -> u32 {
        self.count as u32 * self.width as u32 + self.last_width as u32
    }
}

// =============================================================================
// SliceCursor
// =============================================================================

/// Output-image cursor driven by the scan order.
///
/// After each sample is written the x position advances; crossing the right
/// edge of the current slice wraps to the slice's left edge one row down,
/// and running off the bottom moves to the top of the next slice.
#[derive(Debug)]
struct SliceCursor {
    slice: u32,
    x: u32,
    y: u32,
    slice_width: u32,
    height: u32,
}

impl SliceCursor {
    fn new(slice_width: u16, height: u16) -> Self {
        Self {
            slice: 0,
            x: 0,
            y: 0,
            slice_width: slice_width as u32,
            height: height as u32,
        }
    }

    #[inline]
    fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    fn advance(&mut self) {
        self.x += 1;
        if self.x == self.slice_width * (self.slice + 1) {
            self.x = self.slice_width * self.slice;
            self.y += 1;
        }
        if self.y == self.height {
            self.y = 0;
            self.slice += 1;
            self.x = self.slice_width * self.slice;
        }
    }
}

// =============================================================================
// Frame Header
// =============================================================================

/// Parsed SOF3 frame header.
#[derive(Debug, Clone, Copy)]
struct Sof3Frame {
    precision: u8,
    lines: u16,
    samples_per_line: u16,
    components: u8,
}

// =============================================================================
// Decoder Entry Point
// =============================================================================

/// Decode the RAW lossless-JPEG payload into a Bayer-colored mosaic image.
///
/// `reader` must be positioned at the SOI marker and configured big-endian;
/// `width` and `height` are the RAW IFD's image dimensions.
pub fn decode_raw<R: Read>(
    reader: &mut StreamReader<R>,
    width: u16,
    height: u16,
    slices: SliceGeometry,
) -> Result<Rgba16Image, DecodeError> {
    expect_marker(reader, marker::SOI, "SOI")?;

    expect_marker(reader, marker::DHT, "DHT")?;
    let tables = read_dht_tables(reader)?;

    expect_marker(reader, marker::SOF3, "SOF3")?;
    let frame = read_sof3(reader)?;

    expect_marker(reader, marker::SOS, "SOS")?;
    read_sos(reader, &frame, &tables)?;

    if slices.width == 0 {
        return Err(DecodeError::BadStream(
            "slice width must be non-zero".to_string(),
        ));
    }

    let mut image = Rgba16Image::new(width as u32, height as u32);
    read_scan(reader, &frame, &tables, slices, height, &mut image)?;

    let eoi = reader.read_u16()?;
    if eoi != marker::EOI {
        return Err(DecodeError::BadStream(format!(
            "expected EOI after scan data, read 0x{:04x}",
            eoi
        )));
    }

    Ok(image)
}

fn expect_marker<R: Read>(
    reader: &mut StreamReader<R>,
    expected: u16,
    name: &str,
) -> Result<(), DecodeError> {
    let found = reader.read_u16()?;
    if found != expected {
        return Err(DecodeError::BadStream(format!(
            "expected {} marker 0x{:04x}, read 0x{:04x}",
            name, expected, found
        )));
    }
    Ok(())
}

// =============================================================================
// SOF3 / SOS Headers
// =============================================================================

fn read_sof3<R: Read>(reader: &mut StreamReader<R>) -> Result<Sof3Frame, DecodeError> {
    let length = reader.read_u16()? as usize;
    let mut remaining = length
        .checked_sub(2)
        .ok_or_else(|| DecodeError::BadStream("SOF3 segment length too short".to_string()))?;

    if remaining < 6 {
        return Err(DecodeError::BadStream(
            "SOF3 segment truncated".to_string(),
        ));
    }
    let precision = reader.read_u8()?;
    let lines = reader.read_u16()?;
    let samples_per_line = reader.read_u16()?;
    let components = reader.read_u8()?;
    remaining -= 6;

    debug!(
        precision,
        lines, samples_per_line, components, "SOF3 frame header"
    );

    if precision != SAMPLE_PRECISION {
        return Err(DecodeError::BadStream(format!(
            "unsupported sample precision {} bits",
            precision
        )));
    }

    for _ in 0..components {
        if remaining < 3 {
            return Err(DecodeError::BadStream(
                "SOF3 component descriptors truncated".to_string(),
            ));
        }
        let component_id = reader.read_u8()?;
        let sampling = reader.read_u8()?;
        let quantization = reader.read_u8()?;
        remaining -= 3;

        let horizontal = sampling >> 4;
        let vertical = sampling & 0x0F;
        if horizontal != 1 || vertical != 1 {
            return Err(DecodeError::BadStream(format!(
                "unsupported sampling {}x{} for component {}",
                horizontal, vertical, component_id
            )));
        }
        if quantization != 0 {
            return Err(DecodeError::BadStream(format!(
                "quantization table {} for component {} not supported in lossless stream",
                quantization, component_id
            )));
        }
    }

    if remaining != 0 {
        return Err(DecodeError::BadStream(
            "incomplete read of SOF3 segment".to_string(),
        ));
    }

    Ok(Sof3Frame {
        precision,
        lines,
        samples_per_line,
        components,
    })
}

fn read_sos<R: Read>(
    reader: &mut StreamReader<R>,
    frame: &Sof3Frame,
    tables: &[HuffmanTable],
) -> Result<(), DecodeError> {
    let length = reader.read_u16()? as usize;
    let mut remaining = length
        .checked_sub(2)
        .ok_or_else(|| DecodeError::BadStream("SOS segment length too short".to_string()))?;

    if remaining < 1 {
        return Err(DecodeError::BadStream("SOS segment truncated".to_string()));
    }
    let components = reader.read_u8()?;
    remaining -= 1;
    if components != frame.components {
        return Err(DecodeError::BadStream(format!(
            "component count mismatch between SOF3 and SOS: {} vs {}",
            frame.components, components
        )));
    }

    for _ in 0..components {
        if remaining < 2 {
            return Err(DecodeError::BadStream(
                "SOS component selectors truncated".to_string(),
            ));
        }
        let component_id = reader.read_u8()?;
        let selectors = reader.read_u8()?;
        remaining -= 2;

        // The low nibble selects an AC table, which lossless decoding never
        // consults.
        let dc_table = selectors >> 4;
        if tables.get(dc_table as usize).is_none() {
            return Err(DecodeError::BadStream(format!(
                "unknown DC table {} for component {}",
                dc_table, component_id
            )));
        }
    }

    if remaining < 3 {
        return Err(DecodeError::BadStream("SOS footer truncated".to_string()));
    }
    let spectral_start = reader.read_u8()?;
    let spectral_end = reader.read_u8()?;
    let approximation = reader.read_u8()?;
    remaining -= 3;

    if spectral_start != 1 {
        return Err(DecodeError::BadStream(format!(
            "unsupported start of spectral selection {} (predictor 1 only)",
            spectral_start
        )));
    }
    if spectral_end != 0 {
        return Err(DecodeError::BadStream(format!(
            "unsupported end of spectral selection {}",
            spectral_end
        )));
    }
    if approximation != 0 {
        return Err(DecodeError::BadStream(format!(
            "unsupported successive approximation {}",
            approximation
        )));
    }

    if remaining != 0 {
        return Err(DecodeError::BadStream(
            "incomplete read of SOS segment".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Scan Loop
// =============================================================================

fn read_scan<R: Read>(
    reader: &mut StreamReader<R>,
    frame: &Sof3Frame,
    tables: &[HuffmanTable],
    slices: SliceGeometry,
    image_height: u16,
    image: &mut Rgba16Image,
) -> Result<(), DecodeError> {
    let components = frame.components as usize;
    // Row 0 predicts from the mid-range default: (1 << 13) - 1 for 14 bits.
    let default_value = ((1u32 << (frame.precision - 1)) - 1) as u16;

    let mut bits = BitReader::new();
    let mut previous = vec![0u16; components];
    let mut row_first = vec![0u16; components];
    let mut cursor = SliceCursor::new(slices.width, image_height);

    for line in 0..frame.lines {
        for component in 0..components {
            previous[component] = if line == 0 {
                default_value
            } else {
                row_first[component]
            };
        }

        for sample in 0..frame.samples_per_line {
            for component in 0..components {
                let table = tables.get(component % 2).ok_or_else(|| {
                    DecodeError::BadStream(format!(
                        "no huffman table for component {}",
                        component
                    ))
                })?;

                let value =
                    match decode_sample(reader, &mut bits, table, previous[component]) {
                        Ok(value) => value,
                        Err(err) => {
                            // Failure cursor for post-mortem analysis.
                            error!(line, sample, component, "raw scan aborted: {}", err);
                            return Err(err);
                        }
                    };

                if sample == 0 {
                    row_first[component] = value;
                }
                previous[component] = value;

                paint(image, &cursor, component, value);
                cursor.advance();
            }
        }
    }

    Ok(())
}

/// Decode one DPCM sample: Huffman symbol, difference bits, prediction, and
/// range check.
fn decode_sample<R: Read>(
    reader: &mut StreamReader<R>,
    bits: &mut BitReader,
    table: &HuffmanTable,
    predictor: u16,
) -> Result<u16, DecodeError> {
    let diff = read_diff(reader, bits, table)?;
    let value = predictor as i32 + diff;
    if value < 0 {
        return Err(DecodeError::BadStream(format!(
            "sample underflow: {} {:+}",
            predictor, diff
        )));
    }
    // The upper check is strict: exactly 1 << 14 is tolerated.
    if value > (1 << SAMPLE_PRECISION) {
        return Err(DecodeError::BadStream(format!(
            "sample exceeds 14-bit range: {} {:+} = {}",
            predictor, diff, value
        )));
    }
    Ok(value as u16)
}

/// Decode one difference value.
///
/// The Huffman symbol is the bit length `k` of the difference codeword. A
/// codeword with its top bit set is the positive difference directly;
/// otherwise the difference is `v - (2^k - 1)`.
fn read_diff<R: Read>(
    reader: &mut StreamReader<R>,
    bits: &mut BitReader,
    table: &HuffmanTable,
) -> Result<i32, DecodeError> {
    let code_length = table.decode_symbol(bits, reader)?;
    if code_length == 0 {
        return Ok(0);
    }
    if code_length > 16 {
        return Err(DecodeError::BadStream(format!(
            "difference code length {} exceeds 16 bits",
            code_length
        )));
    }

    let code = bits.read_bits(reader, code_length)?;
    let sign_bit = 1u16 << (code_length - 1);
    if code & sign_bit != 0 {
        Ok(code as i32)
    } else {
        Ok(code as i32 - ((1i32 << code_length) - 1))
    }
}

/// Write one sample into the mosaic at the cursor position.
///
/// Even rows carry the red/green sensor pair, odd rows green/blue. The
/// channel scaling (4x, and 6x for blue) is a visualisation gain and wraps
/// at 16 bits like the original renderer. Positions outside the declared
/// image dimensions are dropped.
fn paint(image: &mut Rgba16Image, cursor: &SliceCursor, component: usize, value: u16) {
    let (x, y) = cursor.position();
    if x >= image.width() || y >= image.height() {
        return;
    }

    let pixel = if y % 2 == 0 {
        if component % 2 == 0 {
            Rgba([value.wrapping_mul(4), 0, 0, 0xFFFF])
        } else {
            Rgba([0, value.wrapping_mul(4), 0, 0xFFFF])
        }
    } else if component % 2 == 0 {
        Rgba([0, value.wrapping_mul(4), 0, 0xFFFF])
    } else {
        Rgba([0, 0, value.wrapping_mul(6), 0xFFFF])
    };

    image.put_pixel(x, y, pixel);
}

// =============================================================================
// Tests
// =============================================================================
