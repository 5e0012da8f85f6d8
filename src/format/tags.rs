//! TIFF tag and tag-type definitions for the CR2 container.
//!
//! This module defines the vocabulary for container parsing:
//! - Tag types that determine how values are encoded
//! - Tag IDs the orchestrator navigates by
//! - The two fixed tag-name dictionaries (general Exif and Canon MakerNote)

// =============================================================================
// Tag Types
// =============================================================================

/// TIFF tag types found in CR2 files.
///
/// Each type has a fixed element size, which together with the value count
/// decides whether a tag's payload fits inline in the entry's 4-byte field or
/// lives elsewhere in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TagType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// NUL-terminated ASCII string (1 byte per character)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Unsigned rational: numerator and denominator u32 (8 bytes)
    Rational = 5,

    /// Opaque byte sequence (1 byte per element)
    Undefined = 7,

    /// Signed rational: numerator and denominator i32 (8 bytes)
    SRational = 10,
}

impl TagType {
    /// Size of a single element of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            TagType::Byte | TagType::Ascii | TagType::Undefined => 1,
            TagType::Short => 2,
            TagType::Long => 4,
            TagType::Rational | TagType::SRational => 8,
        }
    }

    /// Create a TagType from its numeric code.
    ///
    /// Returns `None` for unknown codes; entries with unknown types are
    /// logged and skipped during parsing.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(TagType::Byte),
            2 => Some(TagType::Ascii),
            3 => Some(TagType::Short),
            4 => Some(TagType::Long),
            5 => Some(TagType::Rational),
            7 => Some(TagType::Undefined),
            10 => Some(TagType::SRational),
            _ => None,
        }
    }
}

// =============================================================================
// Navigational Tags
// =============================================================================

/// Tag IDs the container orchestrator navigates and extracts by.
///
/// The full tag universe is resolved through the name dictionaries below;
/// this enum covers only the tags the ordered walk depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Cr2Tag {
    /// Image width in pixels
    ImageWidth = 0x0100,

    /// Image height (length) in pixels
    ImageLength = 0x0101,

    /// Camera manufacturer string
    Make = 0x010F,

    /// Camera model string
    Model = 0x0110,

    /// Byte offset of the image strip
    StripOffsets = 0x0111,

    /// Byte count of the image strip
    StripByteCounts = 0x0117,

    /// Byte offset of the embedded thumbnail JPEG
    ThumbnailOffset = 0x0201,

    /// Byte length of the embedded thumbnail JPEG
    ThumbnailLength = 0x0202,

    /// Offset of the Exif sub-IFD
    ExifIfdPointer = 0x8769,

    /// Canon MakerNote sub-IFD (opaque bytes; the inline field is its offset)
    MakerNote = 0x927C,

    /// CR2 slice geometry: slice count, slice width, last slice width
    Cr2Slice = 0xC640,
}

impl Cr2Tag {
    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Tag Name Dictionaries
// =============================================================================

/// One of the two fixed tag-name dictionaries.
///
/// IFD#0, the Exif sub-IFD and IFD#1..#3 resolve names through the general
/// Exif dictionary; the MakerNote sub-IFD uses the Canon dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDictionary {
    /// General TIFF/Exif tag names.
    Exif,
    /// Canon MakerNote tag names.
    Canon,
}

impl TagDictionary {
    /// Resolve a tag ID to a human-readable name.
    ///
    /// Unknown tag IDs render as `Exif.Tag-0x<hex>` or
    /// `Exif.Canon.Tag-0x<hex>` respectively.
    pub fn name(self, tag_id: u16) -> String {
        match self {
            TagDictionary::Exif => exif_tag_name(tag_id)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Exif.Tag-0x{:04x}", tag_id)),
            TagDictionary::Canon => canon_tag_name(tag_id)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Exif.Canon.Tag-0x{:04x}", tag_id)),
        }
    }
}

/// General Exif tag names, exiv2 style.
fn exif_tag_name(tag_id: u16) -> Option<&'static str> {
    match tag_id {
        0x0100 => Some("Exif.Image.ImageWidth"),
        0x0101 => Some("Exif.Image.ImageLength"),
        0x0102 => Some("Exif.Image.BitsPerSample"),
        0x0103 => Some("Exif.Image.Compression"),
        0x010F => Some("Exif.Image.Make"),
        0x0110 => Some("Exif.Image.Model"),
        0x0111 => Some("Exif.Image.StripOffsets"),
        0x0112 => Some("Exif.Image.Orientation"),
        0x0116 => Some("Exif.Image.RowsPerStrip"),
        0x0117 => Some("Exif.Image.StripByteCounts"),
        0x011A => Some("Exif.Image.XResolution"),
        0x011B => Some("Exif.Image.YResolution"),
        0x0128 => Some("Exif.Image.ResolutionUnit"),
        0x0132 => Some("Exif.Image.DateTime"),
        0x013B => Some("Exif.Image.Artist"),
        0x0201 => Some("Exif.Image.JPEGInterchangeFormat"),
        0x0202 => Some("Exif.Image.JPEGInterchangeFormatLength"),
        0x8298 => Some("Exif.Image.Copyright"),
        0x829A => Some("Exif.Photo.ExposureTime"),
        0x829D => Some("Exif.Photo.FNumber"),
        0x8769 => Some("Exif.Image.ExifTag"),
        0x8822 => Some("Exif.Photo.ExposureProgram"),
        0x8827 => Some("Exif.Photo.ISOSpeedRatings"),
        0x8830 => Some("Exif.Photo.SensitivityType"),
        0x8832 => Some("Exif.Photo.RecommendedExposureIndex"),
        0x9000 => Some("Exif.Photo.ExifVersion"),
        0x9003 => Some("Exif.Photo.DateTimeOriginal"),
        0x9004 => Some("Exif.Photo.DateTimeDigitized"),
        0x9201 => Some("Exif.Photo.ShutterSpeedValue"),
        0x9202 => Some("Exif.Photo.ApertureValue"),
        0x9204 => Some("Exif.Photo.ExposureBiasValue"),
        0x9207 => Some("Exif.Photo.MeteringMode"),
        0x9209 => Some("Exif.Photo.Flash"),
        0x920A => Some("Exif.Photo.FocalLength"),
        0x927C => Some("Exif.Photo.MakerNote"),
        0x9286 => Some("Exif.Photo.UserComment"),
        0xA000 => Some("Exif.Photo.FlashpixVersion"),
        0xA001 => Some("Exif.Photo.ColorSpace"),
        0xA002 => Some("Exif.Photo.PixelXDimension"),
        0xA003 => Some("Exif.Photo.PixelYDimension"),
        0xA005 => Some("Exif.Photo.InteroperabilityTag"),
        0xA20E => Some("Exif.Photo.FocalPlaneXResolution"),
        0xA20F => Some("Exif.Photo.FocalPlaneYResolution"),
        0xA210 => Some("Exif.Photo.FocalPlaneResolutionUnit"),
        0xA401 => Some("Exif.Photo.CustomRendered"),
        0xA402 => Some("Exif.Photo.ExposureMode"),
        0xA403 => Some("Exif.Photo.WhiteBalance"),
        0xA406 => Some("Exif.Photo.SceneCaptureType"),
        0xA430 => Some("Exif.Photo.CameraOwnerName"),
        0xA431 => Some("Exif.Photo.BodySerialNumber"),
        0xA434 => Some("Exif.Photo.LensModel"),
        0xA435 => Some("Exif.Photo.LensSerialNumber"),
        0xC640 => Some("Exif.Image.CR2Slice"),
        _ => None,
    }
}

/// Canon MakerNote tag names.
fn canon_tag_name(tag_id: u16) -> Option<&'static str> {
    match tag_id {
        0x0001 => Some("Exif.Canon.CameraSettings"),
        0x0002 => Some("Exif.Canon.FocalLength"),
        0x0004 => Some("Exif.Canon.ShotInfo"),
        0x0005 => Some("Exif.Canon.Panorama"),
        0x0006 => Some("Exif.Canon.ImageType"),
        0x0007 => Some("Exif.Canon.FirmwareVersion"),
        0x0008 => Some("Exif.Canon.FileNumber"),
        0x0009 => Some("Exif.Canon.OwnerName"),
        0x000C => Some("Exif.Canon.SerialNumber"),
        0x000D => Some("Exif.Canon.CameraInfo"),
        0x000F => Some("Exif.Canon.CustomFunctions"),
        0x0010 => Some("Exif.Canon.ModelID"),
        0x0013 => Some("Exif.Canon.ThumbnailImageValidArea"),
        0x0019 => Some("Exif.Canon.SuperMacro"),
        0x0026 => Some("Exif.Canon.AFInfo"),
        0x0035 => Some("Exif.Canon.TimeInfo"),
        0x0083 => Some("Exif.Canon.OriginalDecisionDataOffset"),
        0x0093 => Some("Exif.Canon.FileInfo"),
        0x0095 => Some("Exif.Canon.LensModel"),
        0x0096 => Some("Exif.Canon.InternalSerialNumber"),
        0x0097 => Some("Exif.Canon.DustRemovalData"),
        0x0099 => Some("Exif.Canon.CustomFunctions2"),
        0x00A0 => Some("Exif.Canon.ProcessingInfo"),
        0x00AA => Some("Exif.Canon.MeasuredColor"),
        0x00B4 => Some("Exif.Canon.ColorSpace"),
        0x00D0 => Some("Exif.Canon.VRDOffset"),
        0x00E0 => Some("Exif.Canon.SensorInfo"),
        0x4001 => Some("Exif.Canon.ColorData"),
        0x4008 => Some("Exif.Canon.BlackLevel"),
        0x4019 => Some("Exif.Canon.LensInfo"),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
