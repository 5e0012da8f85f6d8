//! Huffman table construction and symbol decoding.
//!
//! Lossless JPEG uses DC tables only; each decoded symbol is the bit length
//! of the next DPCM difference codeword. Tables are built with the canonical
//! construction: within a bit length successive codes increment by one, and
//! between bit lengths the running code is left-shifted by one.

use std::collections::HashMap;
use std::io::Read;

use crate::error::DecodeError;
use crate::io::StreamReader;

use super::bits::BitReader;

/// Longest legal Huffman code in bits.
const MAX_CODE_LENGTH: u8 = 16;

// =============================================================================
// HuffmanTable
// =============================================================================

/// A canonical Huffman decoding table keyed by `(bit length, code value)`.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    codes: HashMap<(u8, u16), u8>,
}

impl HuffmanTable {
    /// Build a table from the 16 per-length code counts and the concatenated
    /// symbol list, in DHT order.
    ///
    /// # Errors
    /// `BadStream` if the symbol list does not match the declared counts.
    pub fn build(counts: &[u8; 16], symbols: &[u8]) -> Result<Self, DecodeError> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if symbols.len() != total {
            return Err(DecodeError::BadStream(format!(
                "huffman table declares {} codes but carries {} symbols",
                total,
                symbols.len()
            )));
        }

        let mut codes = HashMap::with_capacity(total);
        let mut code: u16 = 0;
        let mut next_symbol = symbols.iter();

        for (index, &count) in counts.iter().enumerate() {
            let bit_length = (index + 1) as u8;
            for _ in 0..count {
                if let Some(&symbol) = next_symbol.next() {
                    codes.insert((bit_length, code), symbol);
                    code = code.wrapping_add(1);
                }
            }
            code = code.wrapping_shl(1);
        }

        Ok(HuffmanTable { codes })
    }

    /// Look up a symbol by code length and value.
    pub fn lookup(&self, bit_length: u8, code: u16) -> Option<u8> {
        self.codes.get(&(bit_length, code)).copied()
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Decode the next symbol from the bit stream.
    ///
    /// Bits are appended one at a time to a growing code until the table
    /// matches; a code that grows past 16 bits fails with `BadStream`.
    pub fn decode_symbol<R: Read>(
        &self,
        bits: &mut BitReader,
        reader: &mut StreamReader<R>,
    ) -> Result<u8, DecodeError> {
        let mut code: u16 = 0;
        for bit_length in 1..=MAX_CODE_LENGTH {
            code = (code << 1) | bits.read_bits(reader, 1)?;
            if let Some(symbol) = self.lookup(bit_length, code) {
                return Ok(symbol);
            }
        }
        Err(DecodeError::BadStream(
            "huffman code exceeds 16 bits".to_string(),
        ))
    }
}

// =============================================================================
// DHT Segment Parsing
// =============================================================================

/// Read the Huffman tables packed into one DHT segment.
///
/// The caller has already consumed the 0xFFC4 marker; the segment length
/// covers every table that follows. Each table must declare class 0 (DC) and
/// an index equal to its position — tables appear strictly in 0, 1, 2, …
/// order.
pub fn read_dht_tables<R: Read>(
    reader: &mut StreamReader<R>,
) -> Result<Vec<HuffmanTable>, DecodeError> {
    let length = reader.read_u16()?;
    let mut remaining = (length as usize)
        .checked_sub(2)
        .ok_or_else(|| DecodeError::BadStream(format!("DHT segment length {} too short", length)))?;

    let mut tables = Vec::new();

    while remaining > 0 {
        let class_and_index = reader.read_u8()?;
        remaining -= 1;

        let table_class = class_and_index >> 4;
        let table_index = class_and_index & 0x0F;
        if table_class != 0 {
            return Err(DecodeError::BadStream(format!(
                "unexpected huffman table class {} in lossless stream",
                table_class
            )));
        }
        if table_index as usize != tables.len() {
            return Err(DecodeError::BadStream(format!(
                "huffman table index {} out of order, expected {}",
                table_index,
                tables.len()
            )));
        }

        if remaining < 16 {
            return Err(DecodeError::BadStream(
                "DHT segment truncated in code counts".to_string(),
            ));
        }
        let mut counts = [0u8; 16];
        reader.read_exact_into(&mut counts)?;
        remaining -= 16;

        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if remaining < total {
            return Err(DecodeError::BadStream(
                "DHT segment truncated in symbol list".to_string(),
            ));
        }
        let symbols = reader.read_bytes(total)?;
        remaining -= total;

        tables.push(HuffmanTable::build(&counts, &symbols)?);
    }

    Ok(tables)
}

// =============================================================================
// Tests
// =============================================================================
