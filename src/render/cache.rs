//! LRU cache of encoded output bytes.

use std::num::NonZeroUsize;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;

use super::OutputKind;

/// Default number of encoded outputs to cache.
pub const DEFAULT_RENDER_CACHE_CAPACITY: usize = 64;

// =============================================================================
// RenderCacheKey
// =============================================================================

/// Cache key for one encoded output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderCacheKey {
    photo_id: String,
    output: OutputKind,
    jpeg_quality: u8,
}

impl RenderCacheKey {
    pub fn new(photo_id: &str, output: OutputKind, jpeg_quality: u8) -> Self {
        Self {
            photo_id: photo_id.to_string(),
            output,
            jpeg_quality,
        }
    }
}

// =============================================================================
// RenderCache
// =============================================================================

/// Thread-safe LRU cache of encoded output payloads.
pub struct RenderCache {
    entries: Mutex<LruCache<RenderCacheKey, Bytes>>,
}

impl RenderCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RENDER_CACHE_CAPACITY)
    }

    /// Create a cache holding up to `capacity` encoded outputs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).unwrap(),
            )),
        }
    }

    /// Look up an encoded output.
    pub async fn get(&self, key: &RenderCacheKey) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;
        entries.get(key).cloned()
    }

    /// Store an encoded output.
    pub async fn put(&self, key: RenderCacheKey, data: Bytes) {
        let mut entries = self.entries.lock().await;
        entries.put(key, data);
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
