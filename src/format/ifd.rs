//! Image File Directory reading.
//!
//! An IFD is a 16-bit entry count, that many 12-byte entries, and a 32-bit
//! pointer to the next directory (0 = terminal):
//!
//! ```text
//! Bytes 0-1:  Tag ID (u16)
//! Bytes 2-3:  Tag type (u16)
//! Bytes 4-7:  Value count (u32)
//! Bytes 8-11: Inline value or file offset (u32)
//! ```
//!
//! The inline field holds the value itself when the total payload fits in
//! 4 bytes; otherwise it is a file offset, and the entry is registered with
//! the container's [`ValueSink`] for deferred extraction.

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::io::StreamReader;

use super::tags::{Cr2Tag, TagDictionary, TagType};
use super::values::{TagValue, ValueSink, ValueStore};

// =============================================================================
// IfdEntry
// =============================================================================

/// A single 12-byte directory entry.
#[derive(Debug, Clone)]
pub struct IfdEntry {
    /// The tag ID.
    pub tag_id: u16,

    /// The tag type (None if the type code is unknown).
    pub tag_type: Option<TagType>,

    /// Raw tag type code, kept for diagnostics.
    pub tag_type_raw: u16,

    /// Number of values (not bytes).
    pub count: u32,

    /// Inline value or file offset, depending on type and count.
    pub data_or_offset: u32,
}

impl IfdEntry {
    /// Read one entry from the stream.
    pub fn read<R: Read>(reader: &mut StreamReader<R>) -> Result<Self, DecodeError> {
        let tag_id = reader.read_u16()?;
        let tag_type_raw = reader.read_u16()?;
        let count = reader.read_u32()?;
        let data_or_offset = reader.read_u32()?;

        Ok(IfdEntry {
            tag_id,
            tag_type: TagType::from_u16(tag_type_raw),
            tag_type_raw,
            count,
            data_or_offset,
        })
    }

    /// Whether this entry's payload lives out of line and must be fetched.
    ///
    /// Scalar u16/u32 values are inline; any u16/u32 array is treated as
    /// out-of-line for uniformity. Rationals are always 8 bytes and never
    /// fit. Unknown types are never registered.
    pub fn needs_extraction(&self) -> bool {
        match self.tag_type {
            Some(TagType::Ascii) => self.data_or_offset != 0 && self.count > 4,
            Some(TagType::Short) | Some(TagType::Long) => self.count > 1,
            Some(TagType::Byte) | Some(TagType::Undefined) => self.count > 4,
            Some(TagType::Rational) | Some(TagType::SRational) => true,
            None => false,
        }
    }

    /// The raw inline-value-or-offset field, read as an offset.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.data_or_offset
    }

    /// Scalar u16 value (requires type Short, count 1).
    pub fn u16_value(&self) -> Result<u16, DecodeError> {
        self.expect_type(TagType::Short)?;
        self.expect_scalar()?;
        Ok(self.data_or_offset as u16)
    }

    /// Scalar u32 value (requires type Long, count 1).
    pub fn u32_value(&self) -> Result<u32, DecodeError> {
        self.expect_type(TagType::Long)?;
        self.expect_scalar()?;
        Ok(self.data_or_offset)
    }

    /// String value (requires type Ascii). An entry with a zero inline field
    /// yields the empty string.
    pub fn string_value<'a>(&self, store: &'a ValueStore) -> Result<&'a str, DecodeError> {
        self.expect_type(TagType::Ascii)?;
        if self.data_or_offset == 0 {
            return Ok("");
        }
        match store.get(self.data_or_offset) {
            Some(TagValue::Str(s)) => Ok(s),
            Some(_) => Err(self.mismatch("string")),
            None => Err(self.unresolved()),
        }
    }

    /// u8 array value (requires type Byte).
    pub fn u8_array<'a>(&self, store: &'a ValueStore) -> Result<&'a [u8], DecodeError> {
        self.expect_type(TagType::Byte)?;
        match store.get(self.data_or_offset) {
            Some(TagValue::U8Array(values)) => Ok(values),
            Some(_) => Err(self.mismatch("u8 array")),
            None => Err(self.unresolved()),
        }
    }

    /// u16 array value (requires type Short, count > 1).
    pub fn u16_array<'a>(&self, store: &'a ValueStore) -> Result<&'a [u16], DecodeError> {
        self.expect_type(TagType::Short)?;
        if self.count <= 1 {
            return Err(DecodeError::BadTag(format!(
                "tag 0x{:04x} is a scalar, not an array",
                self.tag_id
            )));
        }
        match store.get(self.data_or_offset) {
            Some(TagValue::U16Array(values)) => Ok(values),
            Some(_) => Err(self.mismatch("u16 array")),
            None => Err(self.unresolved()),
        }
    }

    /// u32 array value (requires type Long, count > 1).
    pub fn u32_array<'a>(&self, store: &'a ValueStore) -> Result<&'a [u32], DecodeError> {
        self.expect_type(TagType::Long)?;
        if self.count <= 1 {
            return Err(DecodeError::BadTag(format!(
                "tag 0x{:04x} is a scalar, not an array",
                self.tag_id
            )));
        }
        match store.get(self.data_or_offset) {
            Some(TagValue::U32Array(values)) => Ok(values),
            Some(_) => Err(self.mismatch("u32 array")),
            None => Err(self.unresolved()),
        }
    }

    /// Opaque byte sequence value (requires type Undefined).
    pub fn byte_sequence<'a>(&self, store: &'a ValueStore) -> Result<&'a [u8], DecodeError> {
        self.expect_type(TagType::Undefined)?;
        match store.get(self.data_or_offset) {
            Some(TagValue::Bytes(bytes)) => Ok(bytes),
            Some(_) => Err(self.mismatch("byte sequence")),
            None => Err(self.unresolved()),
        }
    }

    /// Unsigned rational value (requires type Rational).
    pub fn rational(&self, store: &ValueStore) -> Result<(u32, u32), DecodeError> {
        self.expect_type(TagType::Rational)?;
        match store.get(self.data_or_offset) {
            Some(&TagValue::Rational { num, den }) => Ok((num, den)),
            Some(_) => Err(self.mismatch("rational")),
            None => Err(self.unresolved()),
        }
    }

    /// Signed rational value (requires type SRational).
    pub fn srational(&self, store: &ValueStore) -> Result<(i32, i32), DecodeError> {
        self.expect_type(TagType::SRational)?;
        match store.get(self.data_or_offset) {
            Some(&TagValue::SRational { num, den }) => Ok((num, den)),
            Some(_) => Err(self.mismatch("signed rational")),
            None => Err(self.unresolved()),
        }
    }

    fn expect_type(&self, expected: TagType) -> Result<(), DecodeError> {
        if self.tag_type != Some(expected) {
            return Err(DecodeError::BadTag(format!(
                "tag 0x{:04x} has type {}, expected {:?}",
                self.tag_id, self.tag_type_raw, expected
            )));
        }
        Ok(())
    }

    fn expect_scalar(&self) -> Result<(), DecodeError> {
        if self.count != 1 {
            return Err(DecodeError::BadTag(format!(
                "tag 0x{:04x} has count {}, expected a scalar",
                self.tag_id, self.count
            )));
        }
        Ok(())
    }

    fn mismatch(&self, wanted: &str) -> DecodeError {
        DecodeError::BadTag(format!(
            "extracted value for tag 0x{:04x} is not a {}",
            self.tag_id, wanted
        ))
    }

    fn unresolved(&self) -> DecodeError {
        DecodeError::BadTag(format!(
            "out-of-line value for tag 0x{:04x} at offset 0x{:x} was never resolved",
            self.tag_id, self.data_or_offset
        ))
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
///
/// Entries are stored in file order and indexed both by tag ID and by the
/// name the directory's dictionary resolves for each tag.
#[derive(Debug, Clone)]
pub struct Ifd {
    /// Directory name for diagnostics ("IFD#0", "MakerNoteIFD", ...).
    pub name: String,

    /// All entries, in file order.
    pub entries: Vec<IfdEntry>,

    /// Offset to the next IFD (0 if this directory is terminal).
    pub next_ifd_offset: u32,

    dictionary: TagDictionary,
    by_id: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl Ifd {
    /// Read a directory at the reader's current position.
    ///
    /// Each entry is classified for deferred extraction and, when
    /// out-of-line, registered with `sink`. After the call the reader sits
    /// exactly `2 + 12·count + 4` bytes past the entry point.
    pub fn read<R: Read>(
        reader: &mut StreamReader<R>,
        name: &str,
        dictionary: TagDictionary,
        sink: &mut dyn ValueSink,
    ) -> Result<Self, DecodeError> {
        let entry_count = reader.read_u16()?;
        debug!(ifd = name, entries = entry_count, "reading directory");

        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut by_id = HashMap::with_capacity(entry_count as usize);
        let mut by_name = HashMap::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            let entry = IfdEntry::read(reader)?;

            if entry.tag_type.is_none() {
                warn!(
                    ifd = name,
                    tag = %dictionary.name(entry.tag_id),
                    tag_type = entry.tag_type_raw,
                    "unknown tag type, skipping entry"
                );
            } else if entry.needs_extraction() {
                sink.register_out_of_line(&entry);
            }

            by_id.insert(entry.tag_id, entries.len());
            by_name.insert(dictionary.name(entry.tag_id), entries.len());
            entries.push(entry);
        }

        let next_ifd_offset = reader.read_u32()?;

        Ok(Ifd {
            name: name.to_string(),
            entries,
            next_ifd_offset,
            dictionary,
            by_id,
            by_name,
        })
    }

    /// The dictionary this directory resolves tag names with.
    pub fn dictionary(&self) -> TagDictionary {
        self.dictionary
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Look up an entry by raw tag ID.
    pub fn entry_by_id(&self, tag_id: u16) -> Option<&IfdEntry> {
        self.by_id.get(&tag_id).map(|&idx| &self.entries[idx])
    }

    /// Look up an entry by resolved tag name.
    pub fn entry_by_name(&self, name: &str) -> Option<&IfdEntry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Look up an entry by navigational tag.
    pub fn entry(&self, tag: Cr2Tag) -> Option<&IfdEntry> {
        self.entry_by_id(tag.as_u16())
    }

    /// Look up a required entry, failing with `BadTag` when absent.
    pub fn require(&self, tag: Cr2Tag) -> Result<&IfdEntry, DecodeError> {
        self.entry(tag).ok_or_else(|| {
            DecodeError::BadTag(format!(
                "{} is missing required tag {} (0x{:04x})",
                self.name,
                self.dictionary.name(tag.as_u16()),
                tag.as_u16()
            ))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
