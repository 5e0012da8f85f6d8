//! CR2 Streamer - a preview and RAW render server for Canon CR2 photographs.
//!
//! This library decodes Canon CR2 raw files — the TIFF/EP container, its
//! embedded previews, and the lossless-JPEG RAW sensor payload — and serves
//! the four decoded outputs over HTTP.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod photo;
pub mod render;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::{DecodeError, IoError, PhotoError, ServeError};
pub use format::{
    Cr2Header, Cr2Photo, Cr2Tag, Ifd, IfdEntry, Rgba16Image, SliceGeometry, TagDictionary,
    TagType, TagValue, TiffHeader, ValueLedger, ValueSink, ValueStore,
};
pub use io::{ByteOrder, StreamReader};
pub use photo::{DirectorySource, PhotoRegistry, PhotoSource};
pub use render::{OutputKind, RenderService, RenderedOutput};
pub use server::{create_router, AppState, RouterConfig};
