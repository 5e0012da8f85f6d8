//! RAW decoding integration tests: slice reassembly, Bayer coloring, and
//! the RGB preview.

use std::io::Cursor;

use cr2_streamer::{Cr2Photo, DecodeError};

use super::test_utils::{
    build_cr2_fixture, expected_raw_pixels, RAW_HEIGHT, RAW_WIDTH, RGB_SAMPLES,
};

#[test]
fn test_raw_render_pixels() {
    let bytes = build_cr2_fixture();
    let photo = Cr2Photo::decode(Cursor::new(bytes)).unwrap();

    let render = &photo.raw_render;
    assert_eq!(render.width(), RAW_WIDTH as u32);
    assert_eq!(render.height(), RAW_HEIGHT as u32);

    for ((x, y), expected) in expected_raw_pixels() {
        assert_eq!(
            render.get_pixel(x, y).0,
            expected,
            "mosaic pixel ({}, {})",
            x,
            y
        );
    }
}

#[test]
fn test_raw_render_red_sites() {
    // Red intensity appears exactly where an even row meets component 0,
    // which lands on even columns; everywhere else red must be zero.
    let bytes = build_cr2_fixture();
    let photo = Cr2Photo::decode(Cursor::new(bytes)).unwrap();

    for y in 0..RAW_HEIGHT as u32 {
        for x in 0..RAW_WIDTH as u32 {
            let red = photo.raw_render.get_pixel(x, y).0[0];
            if y % 2 == 0 && x % 2 == 0 {
                assert!(red > 0, "expected red at ({}, {})", x, y);
            } else {
                assert_eq!(red, 0, "unexpected red at ({}, {})", x, y);
            }
        }
    }
}

#[test]
fn test_raw_render_alpha_opaque() {
    let bytes = build_cr2_fixture();
    let photo = Cr2Photo::decode(Cursor::new(bytes)).unwrap();
    assert!(photo.raw_render.pixels().all(|p| p.0[3] == 0xFFFF));
}

#[test]
fn test_rgb_preview_pixels() {
    let bytes = build_cr2_fixture();
    let photo = Cr2Photo::decode(Cursor::new(bytes)).unwrap();

    for (index, [r, g, b]) in RGB_SAMPLES.into_iter().enumerate() {
        let x = index as u32 % 2;
        let y = index as u32 / 2;
        assert_eq!(
            photo.rgb_preview.get_pixel(x, y).0,
            [r * 4, g * 4, b * 4, 0xFFFF],
            "rgb preview pixel ({}, {})",
            x,
            y
        );
    }
}

#[test]
fn test_corrupted_eoi_rejected() {
    let mut bytes = build_cr2_fixture();
    // The RAW payload is the last section; its final two bytes are the EOI
    // marker.
    let len = bytes.len();
    bytes[len - 2] = 0xFF;
    bytes[len - 1] = 0xC4;

    let result = Cr2Photo::decode(Cursor::new(bytes));
    assert!(
        matches!(result, Err(DecodeError::BadStream(ref msg)) if msg.contains("EOI")),
        "got {:?}",
        result
    );
}
