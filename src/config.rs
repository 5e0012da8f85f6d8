//! Configuration management.
//!
//! Configuration comes from command-line arguments via clap, with `CR2_`-
//! prefixed environment variable fallbacks and defaults for everything but
//! the photo directory.
//!
//! # Environment Variables
//!
//! - `CR2_HOST` - Server bind address (default: 0.0.0.0)
//! - `CR2_PORT` - Server port (default: 8888)
//! - `CR2_PHOTO_DIR` - Directory of CR2 files to serve (required)
//! - `CR2_CACHE_PHOTOS` - Max decoded photos to cache (default: 8)
//! - `CR2_CACHE_RENDERS` - Max encoded outputs to cache (default: 64)
//! - `CR2_JPEG_QUALITY` - JPEG quality for preview outputs (default: 90)
//! - `CR2_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `CR2_CORS_ORIGINS` - Comma-separated allowed origins

use std::path::PathBuf;

use clap::Parser;

use crate::photo::DEFAULT_PHOTO_CACHE_CAPACITY;
use crate::render::{DEFAULT_JPEG_QUALITY, DEFAULT_RENDER_CACHE_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// CR2 Streamer - a preview and RAW render server for Canon CR2 photographs.
///
/// Serves the four decoded outputs of each CR2 file in a directory: the
/// full-size preview JPEG, the embedded thumbnail, the uncompressed RGB
/// preview, and the RAW sensor data rendered as a Bayer mosaic.
#[derive(Parser, Debug, Clone)]
#[command(name = "cr2-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CR2_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CR2_PORT")]
    pub port: u16,

    /// Directory containing the CR2 files to serve.
    #[arg(long, env = "CR2_PHOTO_DIR")]
    pub photo_dir: PathBuf,

    /// Maximum number of decoded photos to keep in memory.
    ///
    /// Each decoded photo holds four full pixel buffers; size this to the
    /// available memory.
    #[arg(long, default_value_t = DEFAULT_PHOTO_CACHE_CAPACITY, env = "CR2_CACHE_PHOTOS")]
    pub cache_photos: usize,

    /// Maximum number of encoded outputs to cache.
    #[arg(long, default_value_t = DEFAULT_RENDER_CACHE_CAPACITY, env = "CR2_CACHE_RENDERS")]
    pub cache_renders: usize,

    /// JPEG quality for the preview outputs (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "CR2_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "CR2_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated). Allows any origin when unset.
    #[arg(long, env = "CR2_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.photo_dir.is_dir() {
            return Err(format!(
                "photo directory {} does not exist or is not a directory. \
                 Set --photo-dir or CR2_PHOTO_DIR",
                self.photo_dir.display()
            ));
        }

        if self.cache_photos == 0 {
            return Err("cache_photos must be greater than 0".to_string());
        }
        if self.cache_renders == 0 {
            return Err("cache_renders must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
