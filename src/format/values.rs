//! Out-of-line tag values: dynamic representation, storage, and deferred
//! extraction.
//!
//! Tag payloads larger than the 4-byte inline field live elsewhere in the
//! file, usually at offsets past the directory that references them. To keep
//! reading strictly forward, directories register such entries with a
//! [`ValueSink`]; the orchestrator then drains the pending list in ascending
//! offset order, stopping at a limit offset before each structural read.

use std::collections::HashMap;
use std::io::Read;

use tracing::warn;

use crate::error::DecodeError;
use crate::io::StreamReader;

use super::ifd::IfdEntry;
use super::tags::{TagDictionary, TagType};

// =============================================================================
// TagValue
// =============================================================================

/// A decoded tag value.
///
/// The concrete representation depends on the entry's tag type; accessors on
/// [`IfdEntry`] demand a specific variant and fail with `BadTag` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    U8(u8),
    U8Array(Vec<u8>),
    U16(u16),
    U16Array(Vec<u16>),
    U32(u32),
    U32Array(Vec<u32>),
    Str(String),
    Bytes(Vec<u8>),
    Rational { num: u32, den: u32 },
    SRational { num: i32, den: i32 },
}

// =============================================================================
// ValueSink
// =============================================================================

/// The container as seen by a directory being read.
///
/// Directories register out-of-line entries here and later resolve values by
/// offset; neither side owns the other.
pub trait ValueSink {
    /// Register an entry whose payload must be fetched later.
    fn register_out_of_line(&mut self, entry: &IfdEntry);

    /// Look up a previously extracted value by its file offset.
    fn get_value(&self, offset: u32) -> Option<&TagValue>;
}

// =============================================================================
// ValueStore
// =============================================================================

/// Mapping from out-of-line file offset to decoded value.
///
/// At most one value may exist per offset; a second write at the same offset
/// is a structural violation.
#[derive(Debug, Default)]
pub struct ValueStore {
    by_offset: HashMap<u32, TagValue>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value at an offset.
    ///
    /// # Errors
    /// `BadOffset` if the offset already holds a value.
    pub fn insert(&mut self, offset: u32, value: TagValue) -> Result<(), DecodeError> {
        if self.by_offset.contains_key(&offset) {
            return Err(DecodeError::BadOffset(format!(
                "value already extracted at offset 0x{:x}",
                offset
            )));
        }
        self.by_offset.insert(offset, value);
        Ok(())
    }

    /// Look up a value by offset.
    pub fn get(&self, offset: u32) -> Option<&TagValue> {
        self.by_offset.get(&offset)
    }

    pub fn len(&self) -> usize {
        self.by_offset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_offset.is_empty()
    }
}

// =============================================================================
// ValueLedger
// =============================================================================

/// The value store plus the ordered list of entries awaiting extraction.
///
/// Owned by the container orchestrator; directories only see it through the
/// [`ValueSink`] trait.
#[derive(Debug, Default)]
pub struct ValueLedger {
    store: ValueStore,
    pending: Vec<IfdEntry>,
}

impl ValueSink for ValueLedger {
    fn register_out_of_line(&mut self, entry: &IfdEntry) {
        // An offset that already resolved (e.g. two tags sharing a payload)
        // needs no second fetch.
        if self.store.get(entry.data_or_offset).is_some() {
            return;
        }
        self.pending.push(entry.clone());
    }

    fn get_value(&self, offset: u32) -> Option<&TagValue> {
        self.store.get(offset)
    }
}

impl ValueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved values.
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// Consume the ledger, keeping only the resolved values.
    pub fn into_store(self) -> ValueStore {
        self.store
    }

    /// Number of entries still awaiting extraction.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain pending extractions whose offsets lie before `limit`.
    ///
    /// Entries are processed in ascending offset order so the reader only
    /// ever moves forward. A `limit` of 0 means no limit. Entries at or past
    /// the limit are kept for a later flush; entries pointing before the
    /// current reader position are skipped with a diagnostic.
    pub fn flush<R: Read>(
        &mut self,
        reader: &mut StreamReader<R>,
        limit: u32,
    ) -> Result<(), DecodeError> {
        let mut queue = std::mem::take(&mut self.pending);
        queue.sort_by_key(|entry| entry.data_or_offset);

        for (index, entry) in queue.iter().enumerate() {
            let name = TagDictionary::Exif.name(entry.tag_id);

            if limit != 0 && entry.data_or_offset >= limit {
                self.pending = queue[index..].to_vec();
                return Ok(());
            }

            if (entry.data_or_offset as u64) < reader.offset() {
                warn!(
                    tag = %name,
                    offset = entry.data_or_offset,
                    position = reader.offset(),
                    "tag value points before the current read position, skipping"
                );
                continue;
            }

            reader.move_to(&name, entry.data_or_offset as u64)?;
            let value = read_value(reader, entry)?;
            self.store.insert(entry.data_or_offset, value)?;
        }

        Ok(())
    }
}

/// Decode one out-of-line payload at the reader's current position.
fn read_value<R: Read>(
    reader: &mut StreamReader<R>,
    entry: &IfdEntry,
) -> Result<TagValue, DecodeError> {
    let count = entry.count as usize;
    match entry.tag_type {
        Some(TagType::Ascii) => {
            let bytes = reader.read_bytes(count)?;
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Ok(TagValue::Str(
                String::from_utf8_lossy(&bytes[..end]).into_owned(),
            ))
        }
        Some(TagType::Short) => Ok(TagValue::U16Array(reader.read_u16_array(count)?)),
        Some(TagType::Long) => Ok(TagValue::U32Array(reader.read_u32_array(count)?)),
        Some(TagType::Rational) => Ok(TagValue::Rational {
            num: reader.read_u32()?,
            den: reader.read_u32()?,
        }),
        Some(TagType::SRational) => Ok(TagValue::SRational {
            num: reader.read_i32()?,
            den: reader.read_i32()?,
        }),
        Some(TagType::Byte) => Ok(TagValue::U8Array(reader.read_bytes(count)?)),
        Some(TagType::Undefined) => Ok(TagValue::Bytes(reader.read_bytes(count)?)),
        None => Err(DecodeError::BadTag(format!(
            "cannot extract tag 0x{:04x} with unknown type {}",
            entry.tag_id, entry.tag_type_raw
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================
