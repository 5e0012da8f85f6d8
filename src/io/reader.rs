//! Buffered positional reading over a forward-only byte source.
//!
//! CR2 layouts reference arbitrary forward offsets, so full random access is
//! not required: the parser gathers out-of-line references, sorts them by
//! offset, and drains them in order. [`StreamReader`] supports exactly that
//! model — typed primitive reads in a fixed byte order, plus a forward-only
//! `move_to` that refuses to rewind. Rewind attempts surface as
//! [`DecodeError::BadOffset`], which catches ill-formed files with crossed
//! references.

use std::io::Read;

use tracing::warn;

use crate::error::DecodeError;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order for multi-byte primitive reads.
///
/// The CR2 container is little-endian TIFF; the embedded RAW segment is a
/// big-endian JPEG stream. Each [`StreamReader`] is fixed to one order at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Interpret two bytes as a u16 in this byte order.
    #[inline]
    pub fn u16_from(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
        }
    }

    /// Interpret four bytes as a u32 in this byte order.
    #[inline]
    pub fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
        }
    }

    /// Interpret four bytes as an i32 in this byte order.
    #[inline]
    pub fn i32_from(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::LittleEndian => i32::from_le_bytes(bytes),
            ByteOrder::BigEndian => i32::from_be_bytes(bytes),
        }
    }
}

// =============================================================================
// StreamReader
// =============================================================================

/// A byte source with a declared byte order and a monotonically increasing
/// offset.
///
/// The offset after any read equals the offset before plus the number of
/// bytes consumed.
pub struct StreamReader<R> {
    inner: R,
    order: ByteOrder,
    offset: u64,
}

impl<R: Read> StreamReader<R> {
    /// Wrap a byte source with the given byte order, starting at offset 0.
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self {
            inner,
            order,
            offset: 0,
        }
    }

    /// Current offset in bytes from the start of the source.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The byte order fixed at construction.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Read exactly `buf.len()` bytes into `buf`, advancing the offset.
    pub fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.inner.read_exact(buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    /// Read and return exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = vec![0u8; count];
        self.read_exact_into(&mut buf)?;
        Ok(buf)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.read_exact_into(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a u16 in the configured byte order.
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let mut buf = [0u8; 2];
        self.read_exact_into(&mut buf)?;
        Ok(self.order.u16_from(buf))
    }

    /// Read a u32 in the configured byte order.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        self.read_exact_into(&mut buf)?;
        Ok(self.order.u32_from(buf))
    }

    /// Read an i32 in the configured byte order.
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let mut buf = [0u8; 4];
        self.read_exact_into(&mut buf)?;
        Ok(self.order.i32_from(buf))
    }

    /// Read `count` consecutive u16 values.
    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>, DecodeError> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_u16()?);
        }
        Ok(values)
    }

    /// Read `count` consecutive u32 values.
    pub fn read_u32_array(&mut self, count: usize) -> Result<Vec<u32>, DecodeError> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_u32()?);
        }
        Ok(values)
    }

    /// Advance to `target`, consuming and discarding the bytes in between.
    ///
    /// A no-op when already at `target`. Moving backwards fails with
    /// [`DecodeError::BadOffset`]. Discarded bytes that are not all zero are
    /// reported as a diagnostic but do not fail the parse; `label` names the
    /// structure being sought for that diagnostic.
    pub fn move_to(&mut self, label: &str, target: u64) -> Result<(), DecodeError> {
        if target == self.offset {
            return Ok(());
        }
        if target < self.offset {
            return Err(DecodeError::BadOffset(format!(
                "target offset for {} already passed: {} < {}",
                label, target, self.offset
            )));
        }

        let discarded = self.read_bytes((target - self.offset) as usize)?;
        if let Some(first) = discarded.iter().position(|&b| b != 0) {
            warn!(
                label,
                target,
                non_zero_from = first,
                "discarded {} bytes with non-zero content while moving to {}",
                discarded.len(),
                label
            );
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
