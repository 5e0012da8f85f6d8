//! Photo registry: decode-on-demand with caching.
//!
//! Decoding a CR2 is expensive (the RAW scan alone touches tens of millions
//! of samples), so decoded photos are kept in an LRU cache and concurrent
//! requests for the same photo are collapsed into a single decode
//! (singleflight). The decode itself is synchronous CPU work and runs on the
//! blocking pool.

use std::collections::HashMap;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::info;

use crate::error::PhotoError;
use crate::format::Cr2Photo;

use super::source::PhotoSource;

/// Default number of decoded photos to keep in memory.
///
/// A decoded photo holds four full pixel buffers, so the default is small.
pub const DEFAULT_PHOTO_CACHE_CAPACITY: usize = 8;

// =============================================================================
// PhotoRegistry
// =============================================================================

/// Registry of decoded photos with LRU eviction and singleflight decodes.
pub struct PhotoRegistry<S: PhotoSource> {
    source: S,
    cache: RwLock<LruCache<String, Arc<Cr2Photo>>>,
    in_flight: Mutex<HashMap<String, Arc<InFlightState>>>,
}

/// State shared between the leader of an in-flight decode and its waiters.
struct InFlightState {
    notify: Notify,
    result: Mutex<Option<Result<Arc<Cr2Photo>, PhotoError>>>,
}

impl<S: PhotoSource> PhotoRegistry<S> {
    /// Create a registry with the default cache capacity.
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_PHOTO_CACHE_CAPACITY)
    }

    /// Create a registry caching up to `capacity` decoded photos.
    pub fn with_capacity(source: S, capacity: usize) -> Self {
        Self {
            source,
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).unwrap(),
            )),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// List the photos the underlying source can serve.
    pub async fn list_photos(&self) -> Result<Vec<String>, PhotoError> {
        Ok(self.source.list().await?)
    }

    /// Get a decoded photo, decoding it on first access.
    ///
    /// Concurrent callers for the same photo share one decode; every waiter
    /// receives the same result.
    pub async fn get_photo(&self, photo_id: &str) -> Result<Arc<Cr2Photo>, PhotoError> {
        // Fast path: cache hit.
        {
            let mut cache = self.cache.write().await;
            if let Some(photo) = cache.get(photo_id) {
                return Ok(photo.clone());
            }
        }

        // Slow path: join an in-flight decode or become the leader.
        loop {
            let state = {
                let mut in_flight = self.in_flight.lock().await;

                if let Some(state) = in_flight.get(photo_id) {
                    state.clone()
                } else {
                    let state = Arc::new(InFlightState {
                        notify: Notify::new(),
                        result: Mutex::new(None),
                    });
                    in_flight.insert(photo_id.to_string(), state.clone());
                    drop(in_flight);

                    let result = self.decode_photo(photo_id).await;

                    {
                        let mut result_guard = state.result.lock().await;
                        *result_guard = Some(result.clone());
                    }

                    if let Ok(ref photo) = result {
                        let mut cache = self.cache.write().await;
                        cache.put(photo_id.to_string(), photo.clone());
                    }

                    {
                        let mut in_flight = self.in_flight.lock().await;
                        in_flight.remove(photo_id);
                    }
                    state.notify.notify_waiters();

                    return result;
                }
            };

            state.notify.notified().await;

            let result_guard = state.result.lock().await;
            if let Some(ref result) = *result_guard {
                return result.clone();
            }
        }
    }

    /// Fetch and decode a photo without touching the cache.
    async fn decode_photo(&self, photo_id: &str) -> Result<Arc<Cr2Photo>, PhotoError> {
        let bytes = self.source.read(photo_id).await?;

        let photo = tokio::task::spawn_blocking(move || Cr2Photo::decode(Cursor::new(bytes)))
            .await
            .map_err(|err| PhotoError::Decode {
                message: format!("decode task failed: {}", err),
            })?
            .map_err(PhotoError::from_decode)?;

        info!(
            photo_id,
            raw_width = photo.raw_render.width(),
            raw_height = photo.raw_render.height(),
            "decoded CR2 photo"
        );
        Ok(Arc::new(photo))
    }

    /// Drop a photo from the cache, forcing a re-decode on next access.
    pub async fn invalidate(&self, photo_id: &str) {
        let mut cache = self.cache.write().await;
        cache.pop(photo_id);
    }

    /// Number of decoded photos currently cached.
    pub async fn cached_count(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
