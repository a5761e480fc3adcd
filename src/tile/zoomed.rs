//! Floor images resized to a zoom level.
//!
//! A floor contributes to every tile it overlaps at a zoom level, always at
//! the same scale, so the resized crop is computed once per
//! `(building, floor, zoom)` and kept as a fast-compressed PNG.

use std::sync::Arc;

use bytes::Bytes;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::dataset::FloorRef;
use crate::error::TileError;
use crate::floor::ImageSource;
use crate::geo::{BoundingBox, TILE_SIZE};

use super::cache::{ByteCache, CacheStats};
use super::encoder::encode_png_fast;

/// Largest zoomed floor image rendered, in pixels (64 MiB of RGBA).
///
/// A floor's zoomed size grows fourfold per zoom level; past this budget the
/// request fails instead of allocating the image.
pub const MAX_ZOOMED_PIXELS: u64 = 16 * 1024 * 1024;

/// Cache key for a floor image resized to a zoom level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoomedFloorKey {
    pub building_id: Arc<str>,
    pub floor: Arc<str>,
    pub zoom: u32,
}

impl ZoomedFloorKey {
    pub fn new(building_id: impl Into<Arc<str>>, floor: impl Into<Arc<str>>, zoom: u32) -> Self {
        Self {
            building_id: building_id.into(),
            floor: floor.into(),
            zoom,
        }
    }
}

/// Pixel size of a floor drawn at the scale of `tile_bounds`.
///
/// Each axis is truncated and clamped to at least one pixel.
pub fn zoomed_dimensions(floor_bounds: &BoundingBox, tile_bounds: &BoundingBox) -> (u32, u32) {
    let px_per_lng = TILE_SIZE as f64 / tile_bounds.d_lng();
    let px_per_lat = TILE_SIZE as f64 / tile_bounds.d_lat();

    let width = (floor_bounds.d_lng() * px_per_lng) as u32;
    let height = (floor_bounds.d_lat() * px_per_lat) as u32;

    (width.max(1), height.max(1))
}

/// Bounded cache of floor images resized per zoom level.
pub struct ZoomedFloorCache<S: ?Sized> {
    source: Arc<S>,
    cache: ByteCache<ZoomedFloorKey>,
}

impl<S> ZoomedFloorCache<S>
where
    S: ImageSource + ?Sized,
{
    /// Create a cache reading floor images from `source`, holding at most
    /// `capacity` bytes of encoded crops.
    pub fn new(source: Arc<S>, capacity: usize) -> Self {
        Self {
            source,
            cache: ByteCache::with_capacity(capacity),
        }
    }

    /// The encoded floor image at `zoom`.
    ///
    /// `tile_bounds` is the extent of the tile being composited; it fixes the
    /// pixels-per-degree scale when the entry is first computed.
    pub async fn get(
        &self,
        floor: &FloorRef,
        zoom: u32,
        tile_bounds: &BoundingBox,
    ) -> Result<Bytes, TileError> {
        let key = ZoomedFloorKey::new(
            floor.building.id.as_str(),
            floor.floor.name.as_str(),
            zoom,
        );

        self.cache
            .get_or_compute(key, || self.render(floor, zoom, tile_bounds))
            .await
    }

    async fn render(
        &self,
        floor: &FloorRef,
        zoom: u32,
        tile_bounds: &BoundingBox,
    ) -> Result<Bytes, TileError> {
        let (width, height) = zoomed_dimensions(&floor.floor.coords, tile_bounds);
        if u64::from(width) * u64::from(height) > MAX_ZOOMED_PIXELS {
            return Err(TileError::CropTooLarge {
                floor: format!("{}/{}", floor.building.id, floor.floor.name),
                zoom,
                width,
                height,
                max_pixels: MAX_ZOOMED_PIXELS,
            });
        }

        let prepared = floor.floor.prepared_image(self.source.as_ref()).await?;

        debug!(
            building = %floor.building.id,
            floor = %floor.floor.name,
            zoom,
            width,
            height,
            "Resizing floor image"
        );

        tokio::task::spawn_blocking(move || {
            let resized = imageops::resize(&*prepared, width, height, FilterType::Nearest);
            encode_png_fast(&resized)
        })
        .await?
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }
}
