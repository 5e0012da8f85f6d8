//! Shared helpers: a synthetic CR2 fixture builder.
//!
//! The fixture is a complete, minimal CR2 file: TIFF + CR2 headers, the five
//! chained directories with out-of-line values placed to exercise the
//! deferred-extraction order, two embedded baseline JPEGs, a 2x2
//! uncompressed RGB preview, and an 8x2 RAW payload encoded with a
//! hand-rolled lossless-JPEG entropy encoder.

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};

// Fixture geometry.
pub const THUMB_SIZE: u32 = 4;
pub const PREVIEW_SIZE: u32 = 8;
pub const RGB_WIDTH: u16 = 2;
pub const RGB_HEIGHT: u16 = 2;
pub const RAW_WIDTH: u16 = 8;
pub const RAW_HEIGHT: u16 = 2;
pub const SLICE_COUNT: u16 = 1;
pub const SLICE_WIDTH: u16 = 4;
pub const LAST_SLICE_WIDTH: u16 = 4;

/// RGB preview samples, row-major.
pub const RGB_SAMPLES: [[u16; 3]; 4] = [
    [100, 200, 300],
    [400, 500, 600],
    [700, 800, 900],
    [1000, 1100, 1200],
];

// =============================================================================
// Baseline JPEG helper
// =============================================================================

/// Encode a small grayscale test JPEG.
pub fn make_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) * 16) as u8]));
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

// =============================================================================
// Lossless-JPEG encoder
// =============================================================================

/// RAW sample matrix: `[line][sample][component]`.
///
/// Values stay near the 14-bit mid-range default predictor (8191) so every
/// difference fits the 3-bit symbol table below.
pub fn raw_sample_matrix() -> Vec<Vec<[u16; 2]>> {
    vec![
        vec![[8200, 8191], [8200, 8195], [8100, 8195], [8100, 8190]],
        vec![[8205, 8191], [8205, 8191], [8205, 8191], [8205, 8191]],
    ]
}

/// Expected mosaic pixels for [`raw_sample_matrix`] after slice reassembly
/// and Bayer coloring (4x red/green gain, 6x blue gain).
pub fn expected_raw_pixels() -> Vec<((u32, u32), [u16; 4])> {
    vec![
        // Slice 0 (columns 0..4), filled by scan line 0.
        ((0, 0), [32800, 0, 0, 0xFFFF]),
        ((1, 0), [0, 32764, 0, 0xFFFF]),
        ((2, 0), [32800, 0, 0, 0xFFFF]),
        ((3, 0), [0, 32780, 0, 0xFFFF]),
        ((0, 1), [0, 32400, 0, 0xFFFF]),
        ((1, 1), [0, 0, 49170, 0xFFFF]),
        ((2, 1), [0, 32400, 0, 0xFFFF]),
        ((3, 1), [0, 0, 49140, 0xFFFF]),
        // Slice 1 (columns 4..8), filled by scan line 1.
        ((4, 0), [32820, 0, 0, 0xFFFF]),
        ((5, 0), [0, 32764, 0, 0xFFFF]),
        ((6, 0), [32820, 0, 0, 0xFFFF]),
        ((7, 0), [0, 32764, 0, 0xFFFF]),
        ((4, 1), [0, 32820, 0, 0xFFFF]),
        ((5, 1), [0, 0, 49146, 0xFFFF]),
        ((6, 1), [0, 32820, 0, 0xFFFF]),
        ((7, 1), [0, 0, 49146, 0xFFFF]),
    ]
}

/// MSB-first bit writer with JPEG 0xFF byte stuffing.
struct BitWriter {
    out: Vec<u8>,
    acc: u8,
    nbits: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            nbits: 0,
        }
    }

    fn push_bits(&mut self, value: u16, count: u8) {
        for i in (0..count).rev() {
            let bit = ((value >> i) & 1) as u8;
            self.acc = (self.acc << 1) | bit;
            self.nbits += 1;
            if self.nbits == 8 {
                self.out.push(self.acc);
                if self.acc == 0xFF {
                    self.out.push(0x00);
                }
                self.acc = 0;
                self.nbits = 0;
            }
        }
    }

    /// Pad the final partial byte with zero bits and return the stream.
    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push(self.acc << (8 - self.nbits));
        }
        self.out
    }
}

/// Encode one DPCM difference: a 3-bit symbol (the code length k, which in
/// the identity table below equals its own code) followed by k value bits.
fn push_diff(writer: &mut BitWriter, diff: i32) {
    let k = if diff == 0 {
        0u8
    } else {
        (32 - diff.unsigned_abs().leading_zeros()) as u8
    };
    assert!(k <= 7, "fixture differences must fit the 3-bit symbol table");

    writer.push_bits(k as u16, 3);
    if k > 0 {
        let value = if diff > 0 {
            diff as u16
        } else {
            (diff + ((1i32 << k) - 1)) as u16
        };
        writer.push_bits(value, k);
    }
}

/// Encode a complete lossless-JPEG stream (SOI..EOI) for a two-component
/// frame with predictor 1.
///
/// Both Huffman tables map every 3-bit code to itself, so symbols 0..=7 are
/// directly addressable.
pub fn encode_lossless_jpeg(samples: &[Vec<[u16; 2]>]) -> Vec<u8> {
    let lines = samples.len() as u16;
    let samples_per_line = samples[0].len() as u16;

    let mut out = Vec::new();
    out.extend_from_slice(&0xFFD8u16.to_be_bytes()); // SOI

    // DHT: two identical DC tables with eight 3-bit codes (symbols 0..=7).
    out.extend_from_slice(&0xFFC4u16.to_be_bytes());
    out.extend_from_slice(&(2u16 + 2 * (1 + 16 + 8)).to_be_bytes());
    for index in 0..2u8 {
        out.push(index);
        let mut counts = [0u8; 16];
        counts[2] = 8;
        out.extend_from_slice(&counts);
        out.extend_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    // SOF3: 14-bit precision, two 1x1 components without quantization.
    out.extend_from_slice(&0xFFC3u16.to_be_bytes());
    out.extend_from_slice(&14u16.to_be_bytes());
    out.push(14);
    out.extend_from_slice(&lines.to_be_bytes());
    out.extend_from_slice(&samples_per_line.to_be_bytes());
    out.push(2);
    out.extend_from_slice(&[1, 0x11, 0]);
    out.extend_from_slice(&[2, 0x11, 0]);

    // SOS: component 1 → DC table 0, component 2 → DC table 1.
    out.extend_from_slice(&0xFFDAu16.to_be_bytes());
    out.extend_from_slice(&10u16.to_be_bytes());
    out.push(2);
    out.extend_from_slice(&[1, 0x00]);
    out.extend_from_slice(&[2, 0x10]);
    out.extend_from_slice(&[1, 0, 0]);

    // Entropy-coded scan: predictor 1 with row-start prediction from the
    // first sample of the previous row.
    let mut writer = BitWriter::new();
    let mut previous = [0i32; 2];
    let mut row_first = [0i32; 2];
    for (line, row) in samples.iter().enumerate() {
        for c in 0..2 {
            previous[c] = if line == 0 { 8191 } else { row_first[c] };
        }
        for (sample, pair) in row.iter().enumerate() {
            for c in 0..2 {
                let value = pair[c] as i32;
                push_diff(&mut writer, value - previous[c]);
                if sample == 0 {
                    row_first[c] = value;
                }
                previous[c] = value;
            }
        }
    }
    out.extend_from_slice(&writer.finish());

    out.extend_from_slice(&0xFFD9u16.to_be_bytes()); // EOI
    out
}

// =============================================================================
// CR2 container builder
// =============================================================================

const IFD_ENTRY_SIZE: u32 = 12;

fn ifd_size(entries: u32) -> u32 {
    2 + entries * IFD_ENTRY_SIZE + 4
}

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_entry(buf: &mut Vec<u8>, tag: u16, tag_type: u16, count: u32, value: u32) {
    push_u16(buf, tag);
    push_u16(buf, tag_type);
    push_u32(buf, count);
    push_u32(buf, value);
}

/// Offsets of the fixture's sections, for tests that patch bytes.
#[allow(dead_code)]
pub struct FixtureLayout {
    pub make: u32,
    pub exif_ifd: u32,
    pub maker_note_ifd: u32,
    pub ifd3: u32,
    pub raw: u32,
}

/// Build a complete synthetic CR2 file.
pub fn build_cr2_fixture() -> Vec<u8> {
    build_cr2_fixture_with_layout().0
}

/// Build the fixture and return the section offsets alongside.
pub fn build_cr2_fixture_with_layout() -> (Vec<u8>, FixtureLayout) {
    let thumb = make_test_jpeg(THUMB_SIZE, THUMB_SIZE);
    let preview = make_test_jpeg(PREVIEW_SIZE, PREVIEW_SIZE);
    let raw = encode_lossless_jpeg(&raw_sample_matrix());

    let mut rgb = Vec::new();
    for pixel in RGB_SAMPLES {
        for sample in pixel {
            push_u16(&mut rgb, sample);
        }
    }

    let make_str = b"Canon\0";
    let image_type_str = b"Canon CR2\0";

    // Section offsets, in file order.
    let o_ifd0: u32 = 16;
    let o_make = o_ifd0 + ifd_size(4);
    let o_exif = o_make + make_str.len() as u32;
    let o_exposure = o_exif + ifd_size(2);
    let o_maker = o_exposure + 8;
    let o_imgtype = o_maker + ifd_size(1);
    let o_ifd1 = o_imgtype + image_type_str.len() as u32;
    let o_ifd2 = o_ifd1 + ifd_size(2);
    let o_ifd3 = o_ifd2 + ifd_size(3);
    let o_slice = o_ifd3 + ifd_size(5);
    let o_thumb = o_slice + 6;
    let o_preview = o_thumb + thumb.len() as u32;
    let o_rgb = o_preview + preview.len() as u32;
    let o_raw = o_rgb + rgb.len() as u32;

    let mut buf = Vec::new();

    // TIFF header: "II", magic, first IFD at 16.
    buf.extend_from_slice(b"II");
    push_u16(&mut buf, 0x002A);
    push_u32(&mut buf, o_ifd0);

    // CR2 header: "CR", version 2.0, RAW IFD offset.
    buf.extend_from_slice(b"CR");
    buf.push(2);
    buf.push(0);
    push_u32(&mut buf, o_ifd3);

    // IFD#0: Make (out-of-line string), preview strip, Exif pointer.
    assert_eq!(buf.len() as u32, o_ifd0);
    push_u16(&mut buf, 4);
    push_entry(&mut buf, 0x010F, 2, make_str.len() as u32, o_make);
    push_entry(&mut buf, 0x0111, 4, 1, o_preview);
    push_entry(&mut buf, 0x0117, 4, 1, preview.len() as u32);
    push_entry(&mut buf, 0x8769, 4, 1, o_exif);
    push_u32(&mut buf, o_ifd1); // next IFD

    buf.extend_from_slice(make_str);

    // Exif sub-IFD: ExposureTime (rational) and the MakerNote pointer.
    assert_eq!(buf.len() as u32, o_exif);
    push_u16(&mut buf, 2);
    push_entry(&mut buf, 0x829A, 5, 1, o_exposure);
    push_entry(&mut buf, 0x927C, 7, ifd_size(1), o_maker);
    push_u32(&mut buf, 0);

    // ExposureTime = 1/250.
    push_u32(&mut buf, 1);
    push_u32(&mut buf, 250);

    // MakerNote sub-IFD: ImageType string.
    assert_eq!(buf.len() as u32, o_maker);
    push_u16(&mut buf, 1);
    push_entry(&mut buf, 0x0006, 2, image_type_str.len() as u32, o_imgtype);
    push_u32(&mut buf, 0);

    buf.extend_from_slice(image_type_str);

    // IFD#1: thumbnail location.
    assert_eq!(buf.len() as u32, o_ifd1);
    push_u16(&mut buf, 2);
    push_entry(&mut buf, 0x0201, 4, 1, o_thumb);
    push_entry(&mut buf, 0x0202, 4, 1, thumb.len() as u32);
    push_u32(&mut buf, o_ifd2);

    // IFD#2: uncompressed RGB preview.
    assert_eq!(buf.len() as u32, o_ifd2);
    push_u16(&mut buf, 3);
    push_entry(&mut buf, 0x0100, 3, 1, RGB_WIDTH as u32);
    push_entry(&mut buf, 0x0101, 3, 1, RGB_HEIGHT as u32);
    push_entry(&mut buf, 0x0111, 4, 1, o_rgb);
    push_u32(&mut buf, o_ifd3);

    // IFD#3: RAW geometry, strip location, slice tag.
    assert_eq!(buf.len() as u32, o_ifd3);
    push_u16(&mut buf, 5);
    push_entry(&mut buf, 0x0100, 3, 1, RAW_WIDTH as u32);
    push_entry(&mut buf, 0x0101, 3, 1, RAW_HEIGHT as u32);
    push_entry(&mut buf, 0x0111, 4, 1, o_raw);
    push_entry(&mut buf, 0x0117, 4, 1, raw.len() as u32);
    push_entry(&mut buf, 0xC640, 3, 3, o_slice);
    push_u32(&mut buf, 0);

    // CR2 slice values.
    assert_eq!(buf.len() as u32, o_slice);
    push_u16(&mut buf, SLICE_COUNT);
    push_u16(&mut buf, SLICE_WIDTH);
    push_u16(&mut buf, LAST_SLICE_WIDTH);

    // Image payloads, in offset order.
    assert_eq!(buf.len() as u32, o_thumb);
    buf.extend_from_slice(&thumb);
    assert_eq!(buf.len() as u32, o_preview);
    buf.extend_from_slice(&preview);
    assert_eq!(buf.len() as u32, o_rgb);
    buf.extend_from_slice(&rgb);
    assert_eq!(buf.len() as u32, o_raw);
    buf.extend_from_slice(&raw);

    let layout = FixtureLayout {
        make: o_make,
        exif_ifd: o_exif,
        maker_note_ifd: o_maker,
        ifd3: o_ifd3,
        raw: o_raw,
    };
    (buf, layout)
}
