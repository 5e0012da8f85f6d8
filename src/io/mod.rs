//! Byte-level I/O for CR2 parsing.

mod reader;

pub use reader::{ByteOrder, StreamReader};
