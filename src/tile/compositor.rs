//! Tile synthesis from overlapping floor plans.
//!
//! # Placement
//!
//! Each overlapping floor contributes its zoomed image, positioned so that
//! the tile's north-west corner lands on canvas pixel `(0, 0)`:
//!
//! ```text
//!        floor west                  tile west
//!            │◄──── offset_x ───────►│
//!   ┌────────┼───────────────────────┼──────────┐ floor north
//!   │ zoomed │                       │          │      ▲
//!   │ floor  │                       ┌──────────┼──   offset_y
//!   │ image  │                       │  tile    │      ▼
//!   └────────┴───────────────────────┼──────────┘ ...
//! ```
//!
//! A negative offset shifts the floor right or down into the tile.

use std::sync::Arc;

use bytes::Bytes;
use image::{imageops, RgbaImage};
use tracing::debug;

use crate::dataset::SpatialIndex;
use crate::error::TileError;
use crate::floor::ImageSource;
use crate::geo::{BoundingBox, TileAddress, TILE_SIZE};

use super::encoder::{blank_tile, decode_png, encode_png};
use super::zoomed::ZoomedFloorCache;

/// Offset of the tile's north-west corner inside a zoomed floor image of
/// `crop_width` x `crop_height` pixels, truncated toward zero.
pub fn floor_offset(
    crop_width: u32,
    crop_height: u32,
    floor: &BoundingBox,
    tile: &BoundingBox,
) -> (i64, i64) {
    let cw = crop_width as f64;
    let ch = crop_height as f64;

    let offset_x = cw - cw / floor.d_lng() * (floor.east - tile.east) - TILE_SIZE as f64;
    let offset_y = ch / floor.d_lat() * (floor.north - tile.north);

    (offset_x as i64, offset_y as i64)
}

/// A rendered tile.
#[derive(Debug, Clone)]
pub struct Composed {
    /// Encoded PNG
    pub data: Bytes,

    /// No floor contributed; `data` is the shared blank tile
    pub blank: bool,
}

/// Renders tiles by overlaying every floor that intersects them.
pub struct TileCompositor<S: ?Sized> {
    index: Arc<dyn SpatialIndex>,
    zoomed: ZoomedFloorCache<S>,
    blank: Bytes,
}

impl<S> TileCompositor<S>
where
    S: ImageSource + ?Sized,
{
    /// Create a compositor; the blank tile is encoded here, once.
    pub fn new(index: Arc<dyn SpatialIndex>, zoomed: ZoomedFloorCache<S>) -> Result<Self, TileError> {
        Ok(Self {
            index,
            zoomed,
            blank: blank_tile()?,
        })
    }

    /// Render the tile at `address` for floors named `floor_name`.
    pub async fn compose(
        &self,
        address: TileAddress,
        floor_name: &str,
    ) -> Result<Composed, TileError> {
        let tile_bounds = address.bounds();
        let floors = self.index.overlapping_floors(&tile_bounds, floor_name);

        if floors.is_empty() {
            return Ok(Composed {
                data: self.blank.clone(),
                blank: true,
            });
        }

        debug!(
            zoom = address.zoom,
            x = address.x,
            y = address.y,
            floor = floor_name,
            floors = floors.len(),
            "Compositing tile"
        );

        let mut layers = Vec::with_capacity(floors.len());
        for floor in &floors {
            let crop = self.zoomed.get(floor, address.zoom, &tile_bounds).await?;
            layers.push((crop, floor.floor.coords));
        }

        let data = tokio::task::spawn_blocking(move || {
            let mut canvas = RgbaImage::new(TILE_SIZE, TILE_SIZE);
            for (crop, floor_bounds) in layers {
                let crop = decode_png(&crop)?;
                let (offset_x, offset_y) =
                    floor_offset(crop.width(), crop.height(), &floor_bounds, &tile_bounds);
                imageops::overlay(&mut canvas, &crop, -offset_x, -offset_y);
            }
            encode_png(&canvas)
        })
        .await??;

        Ok(Composed { data, blank: false })
    }

    /// The shared transparent tile.
    pub fn blank(&self) -> &Bytes {
        &self.blank
    }

    pub fn zoomed(&self) -> &ZoomedFloorCache<S> {
        &self.zoomed
    }

    pub fn index(&self) -> &Arc<dyn SpatialIndex> {
        &self.index
    }
}
