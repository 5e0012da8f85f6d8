//! TIFF and CR2 file headers.
//!
//! A CR2 file opens with two fixed 8-byte headers:
//!
//! ```text
//! Bytes 0-1:   Byte order mark ("II" — this decoder is little-endian only)
//! Bytes 2-3:   TIFF magic (0x002A)
//! Bytes 4-7:   Offset to first IFD
//! Bytes 8-9:   CR2 magic ("CR" = 0x5243 little-endian)
//! Bytes 10-11: Major/minor version (must be 2.0)
//! Bytes 12-15: Offset to the RAW IFD (IFD#3)
//! ```

use std::io::Read;

use crate::error::DecodeError;
use crate::io::{ByteOrder, StreamReader};

/// Magic value for classic TIFF.
const TIFF_MAGIC: u16 = 0x002A;

/// CR2 magic: the bytes "CR" read as a little-endian u16.
const CR2_MAGIC: u16 = 0x5243;

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all container values (always little-endian here).
    pub byte_order: ByteOrder,

    /// Offset to the first IFD (IFD#0).
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Read and validate the 8-byte TIFF header.
    ///
    /// # Errors
    /// `BadHeader` if the byte order mark is not `II` or the magic is not
    /// 0x002A.
    pub fn read<R: Read>(reader: &mut StreamReader<R>) -> Result<Self, DecodeError> {
        let mut mark = [0u8; 2];
        reader.read_exact_into(&mut mark)?;
        if mark != *b"II" {
            return Err(DecodeError::BadHeader(format!(
                "unsupported byte order mark {:02x}{:02x}",
                mark[0], mark[1]
            )));
        }

        let magic = reader.read_u16()?;
        if magic != TIFF_MAGIC {
            return Err(DecodeError::BadHeader(format!(
                "invalid TIFF magic 0x{:04x}",
                magic
            )));
        }

        let first_ifd_offset = reader.read_u32()?;

        Ok(TiffHeader {
            byte_order: ByteOrder::LittleEndian,
            first_ifd_offset,
        })
    }
}

// =============================================================================
// Cr2Header
// =============================================================================

/// Parsed CR2 header, immediately following the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cr2Header {
    /// CR2 major version.
    pub major: u8,

    /// CR2 minor version.
    pub minor: u8,

    /// Offset to the RAW IFD (IFD#3). IFD#2's next-IFD pointer must agree
    /// with this value.
    pub raw_ifd_offset: u32,
}

impl Cr2Header {
    /// Read and validate the 8-byte CR2 header.
    ///
    /// # Errors
    /// `BadHeader` if the magic is not `CR` or the version is not 2.0.
    pub fn read<R: Read>(reader: &mut StreamReader<R>) -> Result<Self, DecodeError> {
        let magic = reader.read_u16()?;
        if magic != CR2_MAGIC {
            return Err(DecodeError::BadHeader(format!(
                "invalid CR2 magic 0x{:04x}",
                magic
            )));
        }

        let major = reader.read_u8()?;
        let minor = reader.read_u8()?;
        if major != 2 || minor != 0 {
            return Err(DecodeError::BadHeader(format!(
                "unsupported CR2 version {}.{}",
                major, minor
            )));
        }

        let raw_ifd_offset = reader.read_u32()?;

        Ok(Cr2Header {
            major,
            minor,
            raw_ifd_offset,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
