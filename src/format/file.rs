//! The CR2 container orchestrator.
//!
//! A CR2 file chains five metadata directories behind the two fixed headers:
//! IFD#0 (camera metadata plus the full-size preview strip), the Exif
//! sub-IFD, the Canon MakerNote sub-IFD, IFD#1 (thumbnail), IFD#2
//! (uncompressed RGB preview) and IFD#3 (the RAW payload). Directory
//! payloads reference forward offsets, so the walk alternates between
//! structural reads and limit-bounded flushes of the deferred-extraction
//! ledger, keeping the reader moving strictly forward.

use std::io::{Cursor, Read};

use image::DynamicImage;
use tracing::debug;

use crate::error::DecodeError;
use crate::io::{ByteOrder, StreamReader};

use super::header::{Cr2Header, TiffHeader};
use super::ifd::Ifd;
use super::preview;
use super::raw::{self, SliceGeometry};
use super::tags::{Cr2Tag, TagDictionary};
use super::values::{ValueLedger, ValueStore};
use super::Rgba16Image;

// =============================================================================
// Cr2Photo
// =============================================================================

/// A fully decoded CR2 photograph.
///
/// Constructed in a single parse pass and immutable afterwards; the four
/// decoded images correspond to the service outputs `0`..`3`.
#[derive(Debug)]
pub struct Cr2Photo {
    /// The TIFF file header.
    pub tiff: TiffHeader,

    /// The CR2 header following it.
    pub header: Cr2Header,

    /// IFD#0: camera metadata and the full-size preview strip.
    pub ifd0: Ifd,

    /// The Exif sub-IFD pointed to by IFD#0.
    pub exif: Ifd,

    /// The Canon MakerNote sub-IFD pointed to by the Exif sub-IFD.
    pub maker_note: Ifd,

    /// IFD#1: embedded thumbnail metadata.
    pub ifd1: Ifd,

    /// IFD#2: uncompressed RGB preview metadata.
    pub ifd2: Ifd,

    /// IFD#3: RAW geometry and strip location.
    pub ifd3: Ifd,

    /// All extracted out-of-line tag values, by file offset.
    pub values: ValueStore,

    /// CR2 slice geometry of the RAW payload.
    pub slices: SliceGeometry,

    /// Output 0: the full-size preview JPEG, decoded.
    pub large_preview: DynamicImage,

    /// Output 1: the embedded thumbnail JPEG, decoded.
    pub thumbnail: DynamicImage,

    /// Output 2: the uncompressed 16-bit RGB preview.
    pub rgb_preview: Rgba16Image,

    /// Output 3: the RAW payload rendered as a Bayer-colored mosaic.
    pub raw_render: Rgba16Image,
}

impl Cr2Photo {
    /// Decode a complete CR2 file from a byte source.
    ///
    /// The source is read strictly forward in one pass.
    pub fn decode<R: Read>(source: R) -> Result<Self, DecodeError> {
        let mut reader = StreamReader::new(source, ByteOrder::LittleEndian);
        let mut ledger = ValueLedger::new();

        let tiff = TiffHeader::read(&mut reader)?;
        let header = Cr2Header::read(&mut reader)?;
        if reader.offset() != tiff.first_ifd_offset as u64 {
            return Err(DecodeError::BadOffset(format!(
                "first IFD expected at offset {}, reader is at {}",
                tiff.first_ifd_offset,
                reader.offset()
            )));
        }

        // IFD#0 carries the Exif sub-IFD pointer and the full-size preview
        // strip location.
        let ifd0 = Ifd::read(&mut reader, "IFD#0", TagDictionary::Exif, &mut ledger)?;
        let exif_offset = ifd0.require(Cr2Tag::ExifIfdPointer)?.u32_value()?;
        let preview_offset = ifd0.require(Cr2Tag::StripOffsets)?.u32_value()?;
        let preview_length = ifd0.require(Cr2Tag::StripByteCounts)?.u32_value()?;
        ledger.flush(&mut reader, exif_offset)?;
        if exif_offset > ifd0.next_ifd_offset {
            return Err(DecodeError::BadOffset(format!(
                "Exif sub-IFD offset {} lies beyond IFD#1 at {}",
                exif_offset, ifd0.next_ifd_offset
            )));
        }

        reader.move_to("IFD#0.ExifIfdPointer", exif_offset as u64)?;
        let exif = Ifd::read(&mut reader, "ExifSubIFD", TagDictionary::Exif, &mut ledger)?;
        if exif.next_ifd_offset != 0 {
            return Err(DecodeError::BadOffset(
                "unexpected next-IFD pointer in Exif sub-IFD".to_string(),
            ));
        }
        // The MakerNote entry's inline field is the sub-IFD's offset.
        let maker_note_offset = exif.require(Cr2Tag::MakerNote)?.offset();
        ledger.flush(&mut reader, maker_note_offset)?;

        reader.move_to("Exif.MakerNote", maker_note_offset as u64)?;
        let maker_note = Ifd::read(
            &mut reader,
            "MakerNoteIFD",
            TagDictionary::Canon,
            &mut ledger,
        )?;
        if maker_note.next_ifd_offset != 0 {
            return Err(DecodeError::BadOffset(
                "unexpected next-IFD pointer in MakerNote sub-IFD".to_string(),
            ));
        }
        ledger.flush(&mut reader, ifd0.next_ifd_offset)?;

        reader.move_to("IFD#0.NextIFD", ifd0.next_ifd_offset as u64)?;
        let ifd1 = Ifd::read(&mut reader, "IFD#1", TagDictionary::Exif, &mut ledger)?;
        ledger.flush(&mut reader, ifd1.next_ifd_offset)?;
        let thumbnail_offset = ifd1.require(Cr2Tag::ThumbnailOffset)?.u32_value()?;
        let thumbnail_length = ifd1.require(Cr2Tag::ThumbnailLength)?.u32_value()?;

        reader.move_to("IFD#1.NextIFD", ifd1.next_ifd_offset as u64)?;
        let ifd2 = Ifd::read(&mut reader, "IFD#2", TagDictionary::Exif, &mut ledger)?;
        let rgb_width = ifd2.require(Cr2Tag::ImageWidth)?.u16_value()?;
        let rgb_height = ifd2.require(Cr2Tag::ImageLength)?.u16_value()?;
        let rgb_offset = ifd2.require(Cr2Tag::StripOffsets)?.u32_value()?;
        ledger.flush(&mut reader, ifd2.next_ifd_offset)?;

        reader.move_to("IFD#2.NextIFD", ifd2.next_ifd_offset as u64)?;
        if header.raw_ifd_offset as u64 != reader.offset() {
            return Err(DecodeError::BadOffset(format!(
                "IFD#3 at offset {} disagrees with CR2 header RAW IFD offset {}",
                reader.offset(),
                header.raw_ifd_offset
            )));
        }
        let ifd3 = Ifd::read(&mut reader, "IFD#3", TagDictionary::Exif, &mut ledger)?;
        let raw_width = ifd3.require(Cr2Tag::ImageWidth)?.u16_value()?;
        let raw_height = ifd3.require(Cr2Tag::ImageLength)?.u16_value()?;
        let raw_offset = ifd3.require(Cr2Tag::StripOffsets)?.u32_value()?;
        let raw_length = ifd3.require(Cr2Tag::StripByteCounts)?.u32_value()?;
        ledger.flush(&mut reader, thumbnail_offset)?;
        let slices = read_slice_geometry(&ifd3, &ledger)?;
        if ifd3.next_ifd_offset != 0 {
            return Err(DecodeError::BadOffset(
                "unexpected IFD after IFD#3".to_string(),
            ));
        }

        if ledger.pending_len() > 0 {
            debug!(
                pending = ledger.pending_len(),
                "tag values past the image data were not extracted"
            );
        }

        // Embedded images, in ascending offset order.
        reader.move_to("IFD#1.ThumbnailOffset", thumbnail_offset as u64)?;
        let thumbnail = preview::decode_jpeg(&reader.read_bytes(thumbnail_length as usize)?)?;

        reader.move_to("IFD#0.StripOffsets", preview_offset as u64)?;
        let large_preview = preview::decode_jpeg(&reader.read_bytes(preview_length as usize)?)?;

        reader.move_to("IFD#2.StripOffsets", rgb_offset as u64)?;
        let rgb_preview = preview::decode_rgb16(&mut reader, rgb_width, rgb_height)?;

        // The RAW strip is snapshotted into its own buffer: the lossless
        // JPEG inside is big-endian, unlike the container.
        reader.move_to("IFD#3.StripOffsets", raw_offset as u64)?;
        debug!(bytes = raw_length, "reading RAW strip");
        let strip = reader.read_bytes(raw_length as usize)?;
        let mut raw_reader = StreamReader::new(Cursor::new(strip), ByteOrder::BigEndian);
        let raw_render = raw::decode_raw(&mut raw_reader, raw_width, raw_height, slices)?;

        Ok(Cr2Photo {
            tiff,
            header,
            ifd0,
            exif,
            maker_note,
            ifd1,
            ifd2,
            ifd3,
            values: ledger.into_store(),
            slices,
            large_preview,
            thumbnail,
            rgb_preview,
            raw_render,
        })
    }

    /// The camera manufacturer from IFD#0, if recorded.
    pub fn camera_make(&self) -> Option<&str> {
        self.ifd0
            .entry(Cr2Tag::Make)
            .and_then(|entry| entry.string_value(&self.values).ok())
    }

    /// The camera model from IFD#0, if recorded.
    pub fn camera_model(&self) -> Option<&str> {
        self.ifd0
            .entry(Cr2Tag::Model)
            .and_then(|entry| entry.string_value(&self.values).ok())
    }
}

/// Read the three-element CR2 slice tag from IFD#3.
fn read_slice_geometry(ifd3: &Ifd, ledger: &ValueLedger) -> Result<SliceGeometry, DecodeError> {
    let values = ifd3
        .require(Cr2Tag::Cr2Slice)?
        .u16_array(ledger.store())?;
    if values.len() != 3 {
        return Err(DecodeError::BadTag(format!(
            "CR2 slice tag has {} elements, expected 3",
            values.len()
        )));
    }
    Ok(SliceGeometry {
        count: values[0],
        width: values[1],
        last_width: values[2],
    })
}
