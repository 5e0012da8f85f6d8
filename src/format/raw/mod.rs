//! Lossless-JPEG decoding of the CR2 RAW payload.
//!
//! The RAW sensor data is a standalone ITU-T T.81 lossless JPEG (SOF3,
//! Huffman-coded DPCM) read with big-endian byte order, independent of the
//! little-endian container around it. Decoded samples are projected onto the
//! output mosaic through the CR2 slice geometry.

mod bits;
mod huffman;
mod scan;

pub use bits::BitReader;
pub use huffman::{read_dht_tables, HuffmanTable};
pub use scan::{decode_raw, SliceGeometry};
