//! Render service: registry access plus encoded-output caching.
//!
//! The service is the entry point for output requests. It checks the
//! encoded-bytes cache, fetches the decoded photo from the registry on a
//! miss, and encodes the requested output on the blocking pool (PNG encoding
//! of a full-resolution 16-bit mosaic is CPU-bound).

use std::sync::Arc;

use crate::error::ServeError;
use crate::format::Cr2Photo;
use crate::photo::{PhotoRegistry, PhotoSource};

use super::cache::{RenderCache, RenderCacheKey};
use super::encoder::{clamp_quality, encode_output, DEFAULT_JPEG_QUALITY};
use super::OutputKind;

// =============================================================================
// RenderedOutput
// =============================================================================

/// An encoded output ready to serve.
#[derive(Debug, Clone)]
pub struct RenderedOutput {
    /// The encoded image payload.
    pub data: bytes::Bytes,

    /// Media type of the payload.
    pub media_type: &'static str,

    /// Whether the payload came from the render cache.
    pub cache_hit: bool,
}

// =============================================================================
// RenderService
// =============================================================================

/// Service producing encoded outputs for photos in a registry.
pub struct RenderService<S: PhotoSource> {
    registry: Arc<PhotoRegistry<S>>,
    cache: RenderCache,
    jpeg_quality: u8,
}

impl<S: PhotoSource + 'static> RenderService<S> {
    /// Create a service with default cache capacity and JPEG quality.
    pub fn new(registry: PhotoRegistry<S>) -> Self {
        Self {
            registry: Arc::new(registry),
            cache: RenderCache::new(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Create a service with explicit cache capacity and JPEG quality.
    pub fn with_settings(
        registry: PhotoRegistry<S>,
        cache_capacity: usize,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            cache: RenderCache::with_capacity(cache_capacity),
            jpeg_quality: clamp_quality(jpeg_quality),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<PhotoRegistry<S>> {
        &self.registry
    }

    /// List servable photos.
    pub async fn list_photos(&self) -> Result<Vec<String>, ServeError> {
        Ok(self.registry.list_photos().await?)
    }

    /// Get the decoded photo itself (for metadata queries).
    pub async fn photo(&self, photo_id: &str) -> Result<Arc<Cr2Photo>, ServeError> {
        Ok(self.registry.get_photo(photo_id).await?)
    }

    /// Produce the encoded bytes for one output of one photo.
    pub async fn render(
        &self,
        photo_id: &str,
        output: OutputKind,
    ) -> Result<RenderedOutput, ServeError> {
        let key = RenderCacheKey::new(photo_id, output, self.jpeg_quality);

        if let Some(data) = self.cache.get(&key).await {
            return Ok(RenderedOutput {
                data,
                media_type: output.media_type(),
                cache_hit: true,
            });
        }

        let photo = self.registry.get_photo(photo_id).await?;

        let quality = self.jpeg_quality;
        let data = tokio::task::spawn_blocking(move || encode_output(&photo, output, quality))
            .await
            .map_err(|err| ServeError::Encode {
                message: format!("encode task failed: {}", err),
            })??;

        self.cache.put(key, data.clone()).await;

        Ok(RenderedOutput {
            data,
            media_type: output.media_type(),
            cache_hit: false,
        })
    }
}
