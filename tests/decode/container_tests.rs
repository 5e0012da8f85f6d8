//! Container-level integration tests against the synthetic CR2 fixture.

use std::io::Cursor;

use cr2_streamer::{Cr2Photo, DecodeError, TagValue};

use super::test_utils::{
    build_cr2_fixture, build_cr2_fixture_with_layout, LAST_SLICE_WIDTH, PREVIEW_SIZE, RGB_HEIGHT,
    RGB_WIDTH, SLICE_COUNT, SLICE_WIDTH, THUMB_SIZE,
};

#[test]
fn test_decode_full_fixture() {
    let bytes = build_cr2_fixture();
    let photo = Cr2Photo::decode(Cursor::new(bytes)).unwrap();

    // Headers.
    assert_eq!(photo.tiff.first_ifd_offset, 16);
    assert_eq!(photo.header.major, 2);
    assert_eq!(photo.header.minor, 0);

    // Directory structure.
    assert_eq!(photo.ifd0.entry_count(), 4);
    assert_eq!(photo.exif.entry_count(), 2);
    assert_eq!(photo.maker_note.entry_count(), 1);
    assert_eq!(photo.ifd3.next_ifd_offset, 0);

    // Slice geometry.
    assert_eq!(photo.slices.count, SLICE_COUNT);
    assert_eq!(photo.slices.width, SLICE_WIDTH);
    assert_eq!(photo.slices.last_width, LAST_SLICE_WIDTH);

    // Output dimensions match the declared IFD values.
    assert_eq!(photo.thumbnail.width(), THUMB_SIZE);
    assert_eq!(photo.thumbnail.height(), THUMB_SIZE);
    assert_eq!(photo.large_preview.width(), PREVIEW_SIZE);
    assert_eq!(photo.large_preview.height(), PREVIEW_SIZE);
    assert_eq!(photo.rgb_preview.width(), RGB_WIDTH as u32);
    assert_eq!(photo.rgb_preview.height(), RGB_HEIGHT as u32);
}

#[test]
fn test_out_of_line_values_resolve() {
    let (bytes, layout) = build_cr2_fixture_with_layout();
    let photo = Cr2Photo::decode(Cursor::new(bytes)).unwrap();

    // The camera make came from an out-of-line string in IFD#0.
    assert_eq!(photo.camera_make(), Some("Canon"));
    assert_eq!(
        photo.values.get(layout.make),
        Some(&TagValue::Str("Canon".to_string()))
    );

    // The MakerNote string resolved through the Canon dictionary.
    let image_type = photo
        .maker_note
        .entry_by_name("Exif.Canon.ImageType")
        .unwrap();
    assert_eq!(image_type.string_value(&photo.values).unwrap(), "Canon CR2");

    // The exposure time rational from the Exif sub-IFD.
    let exposure = photo
        .exif
        .entry_by_name("Exif.Photo.ExposureTime")
        .unwrap();
    assert_eq!(exposure.rational(&photo.values).unwrap(), (1, 250));
}

#[test]
fn test_bad_cr2_magic_rejected() {
    let mut bytes = build_cr2_fixture();
    // The CR2 magic lives at bytes 8-9.
    bytes[8] = 0x00;
    let result = Cr2Photo::decode(Cursor::new(bytes));
    assert!(matches!(result, Err(DecodeError::BadHeader(_))));
}

#[test]
fn test_raw_ifd_offset_mismatch_rejected() {
    let mut bytes = build_cr2_fixture();
    // The CR2 header's RAW IFD offset lives at bytes 12-15; point it one
    // byte late so it disagrees with IFD#2's next-IFD pointer.
    let declared = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    bytes[12..16].copy_from_slice(&(declared + 1).to_le_bytes());

    let result = Cr2Photo::decode(Cursor::new(bytes));
    assert!(matches!(result, Err(DecodeError::BadOffset(_))));
}

#[test]
fn test_truncated_file_is_io_error() {
    let bytes = build_cr2_fixture();
    let truncated = bytes[..bytes.len() / 2].to_vec();
    let result = Cr2Photo::decode(Cursor::new(truncated));
    assert!(result.is_err());
}

#[test]
fn test_missing_slice_tag_rejected() {
    let (mut bytes, layout) = build_cr2_fixture_with_layout();
    // Rewrite the slice tag's ID (first entry field) so IFD#3 no longer
    // carries tag 0xC640. The entry is the fifth in IFD#3.
    let slice_entry = layout.ifd3 as usize + 2 + 4 * 12;
    bytes[slice_entry..slice_entry + 2].copy_from_slice(&0xC641u16.to_le_bytes());

    let result = Cr2Photo::decode(Cursor::new(bytes));
    assert!(matches!(result, Err(DecodeError::BadTag(_))));
}
