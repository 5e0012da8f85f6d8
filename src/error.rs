use thiserror::Error;

/// Errors raised while decoding a CR2 container or its RAW payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// TIFF or CR2 header magic/version is wrong.
    #[error("bad header: {0}")]
    BadHeader(String),

    /// Tag type mismatch, missing required tag, impossible count, or an
    /// out-of-line value that was never resolved.
    #[error("bad tag: {0}")]
    BadTag(String),

    /// Structural offset inconsistency, or a forward move that targets an
    /// already-passed position.
    #[error("bad offset: {0}")]
    BadOffset(String),

    /// Lossless-JPEG stream violation: wrong marker, Huffman overrun,
    /// byte-stuffing violation, unexpected EOI, sample out of range.
    #[error("bad stream: {0}")]
    BadStream(String),

    /// The underlying byte source failed or was truncated.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// I/O errors from a photo source.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// No photo with the given identifier exists in the source.
    #[error("photo not found: {0}")]
    NotFound(String),

    /// The identifier is not a plain file name.
    #[error("invalid photo id: {0}")]
    InvalidId(String),

    /// Reading the photo bytes failed.
    #[error("read failed: {0}")]
    Read(String),
}

/// Errors from the photo registry.
///
/// Variants carry rendered messages rather than source errors so results can
/// be cloned to every waiter of an in-flight decode.
#[derive(Debug, Clone, Error)]
pub enum PhotoError {
    /// No photo with the given identifier exists.
    #[error("photo not found: {photo_id}")]
    NotFound { photo_id: String },

    /// The identifier is not a plain file name.
    #[error("invalid photo id: {photo_id}")]
    InvalidId { photo_id: String },

    /// The file exists but is not a decodable CR2 (bad header, bad tag,
    /// malformed RAW stream, truncated payload).
    #[error("unsupported photo: {message}")]
    Unsupported { message: String },

    /// Decoding failed for a reason unrelated to the file contents.
    #[error("decode failed: {message}")]
    Decode { message: String },
}

impl PhotoError {
    /// Fold a [`DecodeError`] into the registry taxonomy.
    ///
    /// The registry decodes from an owned byte buffer, so any decode failure
    /// is a property of the file itself.
    pub fn from_decode(err: DecodeError) -> Self {
        PhotoError::Unsupported {
            message: err.to_string(),
        }
    }
}

impl From<IoError> for PhotoError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::NotFound(photo_id) => PhotoError::NotFound { photo_id },
            IoError::InvalidId(photo_id) => PhotoError::InvalidId { photo_id },
            IoError::Read(message) => PhotoError::Decode { message },
        }
    }
}

/// Errors from the render service and HTTP layer.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Registry failure (missing photo, undecodable file).
    #[error(transparent)]
    Photo(#[from] PhotoError),

    /// The requested output index is not one of `0`..`3`.
    #[error("invalid output: {output}")]
    InvalidOutput { output: String },

    /// Encoding a decoded output to PNG/JPEG failed.
    #[error("encode failed: {message}")]
    Encode { message: String },
}

// =============================================================================
// Tests
// =============================================================================
