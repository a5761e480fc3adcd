//! Tile lookup in three tiers: memory, the disk store, then a fresh render.
//!
//! A request for `(z, x, y, floor)` is answered from the in-memory
//! [`ByteCache`] when possible. On a miss one caller per key reads the disk
//! store (skipped in debug mode) and falls back to the compositor. Rendered
//! tiles that are not blank go back to the store; every outcome is tagged
//! with a [`TileOrigin`] so the HTTP layer can report where it came from.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::TileError;
use crate::floor::ImageSource;
use crate::geo::TileAddress;

use super::cache::{ByteCache, CacheStats, DEFAULT_TILE_CACHE_CAPACITY};
use super::compositor::TileCompositor;
use super::store::DiskTileStore;

// =============================================================================
// Tile Key
// =============================================================================

/// Identity of a rendered tile: a grid address plus a floor name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub address: TileAddress,
    pub floor: Arc<str>,
}

impl TileKey {
    pub fn new(address: TileAddress, floor: impl Into<Arc<str>>) -> Self {
        Self {
            address,
            floor: floor.into(),
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.address.zoom, self.address.x, self.address.y, self.floor
        )
    }
}

// =============================================================================
// Tile Request
// =============================================================================

/// A request for a tile, as received from a client.
///
/// Coordinates are not validated until the request reaches the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
    pub floor: String,
}

impl TileRequest {
    pub fn new(zoom: u32, x: u32, y: u32, floor: impl Into<String>) -> Self {
        Self {
            zoom,
            x,
            y,
            floor: floor.into(),
        }
    }

    /// Validate the request into a cache key.
    pub fn key(&self) -> Result<TileKey, TileError> {
        let address = TileAddress::new(self.zoom, self.x, self.y)?;

        if self.floor.is_empty() {
            return Err(TileError::InvalidRequest {
                message: "floor name is empty".to_string(),
            });
        }
        // The floor name becomes part of a file name in the tile store
        if self
            .floor
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
            || self.floor.starts_with('.')
        {
            return Err(TileError::InvalidRequest {
                message: format!("invalid floor name: {:?}", self.floor),
            });
        }

        Ok(TileKey::new(address, self.floor.as_str()))
    }
}

// =============================================================================
// Tile Response
// =============================================================================

/// Where the bytes of a tile response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOrigin {
    /// The in-memory tile cache
    Memory,
    /// The on-disk tile store
    Disk,
    /// Composited for this request
    Rendered,
    /// No floor overlaps the tile
    Blank,
}

impl TileOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileOrigin::Memory => "memory",
            TileOrigin::Disk => "disk",
            TileOrigin::Rendered => "rendered",
            TileOrigin::Blank => "blank",
        }
    }
}

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// The encoded PNG tile data
    pub data: Bytes,

    pub origin: TileOrigin,
}

impl TileResponse {
    /// Whether this tile was served from the memory cache.
    pub fn cache_hit(&self) -> bool {
        self.origin == TileOrigin::Memory
    }
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service for generating and caching tiles.
///
/// # Type Parameters
///
/// * `S` - Where floor images are loaded from
///
/// # Example
///
/// ```ignore
/// use campus_tiles::tile::{TileCompositor, TileRequest, TileService, ZoomedFloorCache};
///
/// let zoomed = ZoomedFloorCache::new(source, 256 * 1024 * 1024);
/// let compositor = TileCompositor::new(dataset, zoomed)?;
/// let service = TileService::new(compositor)
///     .with_store(DiskTileStore::new("static/api/tiles"));
///
/// let response = service.get_tile(TileRequest::new(19, 82654, 179471, "1")).await?;
/// println!("{} bytes from {}", response.data.len(), response.origin.as_str());
/// ```
pub struct TileService<S: ?Sized> {
    /// Cache for encoded tiles
    cache: ByteCache<TileKey>,

    compositor: TileCompositor<S>,

    /// Persistent store for rendered tiles
    store: Option<DiskTileStore>,

    /// Skip store reads (writes still happen)
    debug: bool,
}

impl<S> TileService<S>
where
    S: ImageSource + ?Sized,
{
    /// Create a new tile service with default cache settings and no store.
    pub fn new(compositor: TileCompositor<S>) -> Self {
        Self::with_cache_capacity(compositor, DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Create a new tile service with a custom tile cache capacity in bytes.
    pub fn with_cache_capacity(compositor: TileCompositor<S>, cache_capacity: usize) -> Self {
        Self {
            cache: ByteCache::with_capacity(cache_capacity),
            compositor,
            store: None,
            debug: false,
        }
    }

    /// Persist rendered tiles to `store` and serve them from it on later misses.
    pub fn with_store(mut self, store: DiskTileStore) -> Self {
        self.store = Some(store);
        self
    }

    /// In debug mode stored tiles are ignored and every miss is re-rendered.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Get a tile, using caches when available.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The address is outside the grid or the floor name is invalid
    /// - A floor image cannot be loaded or decoded
    /// - The tile cannot be encoded
    pub async fn get_tile(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        let key = request.key()?;

        if let Some(data) = self.cache.get(&key).await {
            return Ok(TileResponse {
                data,
                origin: TileOrigin::Memory,
            });
        }

        debug!(tile = %key, "Tile cache miss");

        // Only the caller that runs the computation learns where the bytes
        // came from; callers that waited on it see a memory hit.
        let origin = Mutex::new(TileOrigin::Memory);
        let data = self
            .cache
            .get_or_compute(key.clone(), || async {
                let (data, computed) = self.load_or_render(&key).await?;
                if let Ok(mut origin) = origin.lock() {
                    *origin = computed;
                }
                Ok(data)
            })
            .await?;

        let origin = origin
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(TileResponse { data, origin })
    }

    async fn load_or_render(&self, key: &TileKey) -> Result<(Bytes, TileOrigin), TileError> {
        if let Some(store) = self.store.as_ref().filter(|_| !self.debug) {
            if let Some(data) = store.read(key).await {
                debug!(tile = %key, "Serving stored tile");
                return Ok((data, TileOrigin::Disk));
            }
        }

        let composed = self.compositor.compose(key.address, &key.floor).await?;
        if composed.blank {
            return Ok((composed.data, TileOrigin::Blank));
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.write(key, &composed.data).await {
                warn!(
                    tile = %key,
                    path = %store.path_for(key).display(),
                    error = %e,
                    "Failed to persist tile"
                );
            }
        }

        Ok((composed.data, TileOrigin::Rendered))
    }

    /// Tile cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Zoomed floor cache statistics.
    pub async fn zoomed_stats(&self) -> CacheStats {
        self.compositor.zoomed().stats().await
    }

    /// Clear the tile cache and the zoomed floor cache.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        self.compositor.zoomed().clear().await;
    }

    pub fn compositor(&self) -> &TileCompositor<S> {
        &self.compositor
    }

    pub fn store(&self) -> Option<&DiskTileStore> {
        self.store.as_ref()
    }
}

// =============================================================================
// Tests
// =============================================================================
