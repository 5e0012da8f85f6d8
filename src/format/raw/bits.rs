//! Bit-level reading of the entropy-coded scan data.

use std::io::Read;

use crate::error::DecodeError;
use crate::io::StreamReader;

/// A bit queue over the entropy-coded segment.
///
/// Maintains a 32-bit staging queue with the valid bits kept at the top.
/// Whole bytes are pulled from the underlying reader on demand; a 0xFF data
/// byte must be followed by a 0x00 stuff byte, which is consumed and
/// discarded. The queue is per-decoder state, so concurrent decodes of
/// separate files cannot interfere.
#[derive(Debug, Default)]
pub struct BitReader {
    queue: u32,
    len: u8,
}

impl BitReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `count` bits (at most 16) from the stream.
    ///
    /// # Errors
    /// `BadStream` if a 0xFF byte is followed by anything but 0x00 — a 0xD9
    /// follower is an end-of-image marker inside the scan, anything else is
    /// a stuffing violation. I/O errors propagate.
    pub fn read_bits<R: Read>(
        &mut self,
        reader: &mut StreamReader<R>,
        count: u8,
    ) -> Result<u16, DecodeError> {
        debug_assert!(count <= 16);
        if count == 0 {
            return Ok(0);
        }

        while self.len < count {
            let byte = reader.read_u8()?;
            if byte == 0xFF {
                let stuffed = reader.read_u8()?;
                if stuffed != 0x00 {
                    if stuffed == 0xD9 {
                        return Err(DecodeError::BadStream(
                            "unexpected end of image in scan data".to_string(),
                        ));
                    }
                    return Err(DecodeError::BadStream(format!(
                        "non-zero byte stuffing 0x{:02x} in scan data",
                        stuffed
                    )));
                }
            }

            self.queue |= (byte as u32) << (24 - self.len);
            self.len += 8;
        }

        let output = ((self.queue >> (32 - count)) & ((1u32 << count) - 1)) as u16;
        self.queue <<= count;
        self.len -= count;
        Ok(output)
    }
}

// =============================================================================
// Tests
// =============================================================================
