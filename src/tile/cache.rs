//! Size-bounded LRU caches for encoded images.
//!
//! Both rendered tiles and zoomed floor crops are cached as encoded PNG bytes
//! under a byte budget. [`ByteCache`] is generic over the key so the same
//! eviction and single-flight logic serves both.
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached values in bytes and evicts
//! least-recently-used entries when the capacity is exceeded. A single value
//! larger than the whole budget is returned to its caller but not retained.
//!
//! # Single-Flight Computation
//!
//! [`ByteCache::get_or_compute`] guarantees that concurrent misses for the
//! same key run the computation once:
//!
//! ```text
//! Request A ──► miss ──► register cell ──► compute ──► store ──► value
//!                              │
//! Request B ──► miss ──► find cell ─────── wait ──────────────► same value
//! ```
//!
//! Failures are shared with the callers that were waiting, but they are not
//! cached: the next request for the key computes again.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::{Mutex, OnceCell, RwLock};

use crate::error::TileError;

/// Default tile cache capacity: 256MB
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

/// Default zoomed floor cache capacity: 256MB
pub const DEFAULT_ZOOMED_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 100_000;

type Flight = Arc<OnceCell<Result<Bytes, TileError>>>;

// =============================================================================
// Cache Statistics
// =============================================================================

/// Point-in-time occupancy of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Number of cached entries
    pub entries: usize,

    /// Total size of cached values in bytes
    pub size: usize,

    /// Maximum total size in bytes
    pub capacity: usize,
}

// =============================================================================
// Byte Cache
// =============================================================================

/// LRU cache of encoded bytes with a size budget and single-flight fills.
///
/// # Example
///
/// ```
/// use campus_tiles::tile::ByteCache;
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let cache: ByteCache<String> = ByteCache::with_capacity(1024 * 1024);
///
///     let tile = cache
///         .get_or_compute("19_82654_179471_1".to_string(), || async {
///             Ok(Bytes::from_static(b"png"))
///         })
///         .await
///         .unwrap();
///
///     assert_eq!(tile, Bytes::from_static(b"png"));
///     assert!(cache.contains(&"19_82654_179471_1".to_string()).await);
/// }
/// ```
pub struct ByteCache<K> {
    /// The underlying LRU cache
    cache: RwLock<LruCache<K, Bytes>>,

    /// Maximum total size in bytes
    max_size: usize,

    /// Current total size in bytes
    current_size: RwLock<usize>,

    /// Computations currently running, keyed by what they will produce
    in_flight: Mutex<HashMap<K, Flight>>,
}

impl<K> ByteCache<K>
where
    K: Hash + Eq + Clone,
{
    /// Create a new cache with the specified capacity in bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new cache with specified capacity and maximum entries.
    ///
    /// A `max_entries` of zero is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            )),
            max_size,
            current_size: RwLock::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get a value from the cache, marking it as recently used.
    pub async fn get(&self, key: &K) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        cache.get(key).cloned()
    }

    /// Check if a key is cached without updating LRU order.
    pub async fn contains(&self, key: &K) -> bool {
        let cache = self.cache.read().await;
        cache.contains(key)
    }

    /// Store a value in the cache.
    ///
    /// If the cache is over capacity after insertion, least-recently-used
    /// entries are evicted until the cache is within capacity.
    pub async fn put(&self, key: K, data: Bytes) {
        let data_size = data.len();
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        if cache.contains(&key) {
            if let Some(old_data) = cache.put(key, data) {
                *current_size = current_size.saturating_sub(old_data.len());
            }
        } else if let Some((_, evicted)) = cache.push(key, data) {
            // The entry-count bound pushed out the LRU entry
            *current_size = current_size.saturating_sub(evicted.len());
        }
        *current_size += data_size;

        while *current_size > self.max_size {
            if let Some((_, evicted_data)) = cache.pop_lru() {
                *current_size = current_size.saturating_sub(evicted_data.len());
            } else {
                break;
            }
        }
    }

    /// Remove a value from the cache.
    pub async fn remove(&self, key: &K) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        let data = cache.pop(key)?;
        *current_size = current_size.saturating_sub(data.len());
        Some(data)
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Get the current number of cached entries.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Get the current total size of cached values in bytes.
    pub async fn size(&self) -> usize {
        *self.current_size.read().await
    }

    /// Get the maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Occupancy snapshot.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            size: self.size().await,
            capacity: self.max_size,
        }
    }

    /// Return the cached value for `key`, computing it at most once across
    /// concurrent callers.
    ///
    /// Successful results are inserted into the cache. Errors are handed to
    /// every caller of the same flight and then forgotten.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<Bytes, TileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, TileError>>,
    {
        if let Some(data) = self.get(&key).await {
            return Ok(data);
        }

        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = flight
            .get_or_init(|| async {
                // A flight that finished between our miss and registering
                // this cell has already stored the value
                if let Some(data) = self.get(&key).await {
                    return Ok(data);
                }

                let result = compute().await;
                if let Ok(data) = &result {
                    self.put(key.clone(), data.clone()).await;
                }
                result
            })
            .await
            .clone();

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &flight))
        {
            in_flight.remove(&key);
        }

        result
    }

    /// Number of computations currently running.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
