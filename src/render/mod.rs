//! Rendering decoded outputs to transport encodings.
//!
//! A decoded photo exposes four outputs keyed `0`..`3`: the full-size
//! preview JPEG, the embedded thumbnail JPEG, the uncompressed RGB preview,
//! and the RAW Bayer-mosaic render. The JPEG-backed outputs are served
//! re-encoded as JPEG; the 16-bit outputs are served as PNG, which keeps
//! their full sample depth.

mod cache;
mod encoder;
mod service;

pub use cache::{RenderCache, RenderCacheKey, DEFAULT_RENDER_CACHE_CAPACITY};
pub use encoder::{clamp_quality, encode_output, DEFAULT_JPEG_QUALITY};
pub use service::{RenderService, RenderedOutput};

// =============================================================================
// OutputKind
// =============================================================================

/// One of the four decoded outputs of a CR2 photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Output 0: the full-size preview JPEG from IFD#0.
    LargePreview,
    /// Output 1: the embedded thumbnail JPEG from IFD#1.
    Thumbnail,
    /// Output 2: the uncompressed 16-bit RGB preview from IFD#2.
    RgbPreview,
    /// Output 3: the RAW payload rendered as a Bayer mosaic.
    RawRender,
}

impl OutputKind {
    /// All outputs in key order.
    pub const ALL: [OutputKind; 4] = [
        OutputKind::LargePreview,
        OutputKind::Thumbnail,
        OutputKind::RgbPreview,
        OutputKind::RawRender,
    ];

    /// Parse the output key used in URLs ("0".."3").
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "0" => Some(OutputKind::LargePreview),
            "1" => Some(OutputKind::Thumbnail),
            "2" => Some(OutputKind::RgbPreview),
            "3" => Some(OutputKind::RawRender),
            _ => None,
        }
    }

    /// The numeric output key.
    #[inline]
    pub const fn key(self) -> u8 {
        match self {
            OutputKind::LargePreview => 0,
            OutputKind::Thumbnail => 1,
            OutputKind::RgbPreview => 2,
            OutputKind::RawRender => 3,
        }
    }

    /// The media type this output is served as.
    #[inline]
    pub const fn media_type(self) -> &'static str {
        match self {
            OutputKind::LargePreview | OutputKind::Thumbnail => "image/jpeg",
            OutputKind::RgbPreview | OutputKind::RawRender => "image/png",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
