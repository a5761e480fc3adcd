//! Web Mercator slippy-tile projection.
//!
//! Converts between tile addresses and geographic coordinates. A tile's north
//! west corner is the projection of `(x, y)` and its south east corner is the
//! projection of `(x + 1, y + 1)`, so neighbouring tiles compute their shared
//! edge from the same inputs and agree on it exactly.

use std::f64::consts::PI;

use crate::error::TileError;

use super::bounds::{BoundingBox, LatLng};

/// Width and height of a rendered tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest supported zoom level (keeps `2^zoom` inside `u32`).
pub const MAX_ZOOM: u32 = 30;

/// Address of a tile in the slippy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    /// Create an address, rejecting coordinates outside `0..2^zoom`.
    pub fn new(zoom: u32, x: u32, y: u32) -> Result<Self, TileError> {
        if zoom > MAX_ZOOM {
            return Err(TileError::InvalidRequest {
                message: format!("zoom {} exceeds maximum of {}", zoom, MAX_ZOOM),
            });
        }

        let tiles = tiles_per_axis(zoom);
        if u64::from(x) >= tiles || u64::from(y) >= tiles {
            return Err(TileError::TileOutOfBounds {
                zoom,
                x,
                y,
                max: tiles - 1,
            });
        }

        Ok(Self { zoom, x, y })
    }

    /// Geographic extent of this tile.
    pub fn bounds(&self) -> BoundingBox {
        tile_to_bounding_box(self.x, self.y, self.zoom)
    }
}

/// Number of tiles along each axis at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u32) -> u64 {
    1u64 << zoom
}

/// Project a tile-space corner to latitude/longitude.
///
/// `x` and `y` may equal `2^zoom` (the far edge of the last tile).
pub fn tile_corner(x: u32, y: u32, zoom: u32) -> LatLng {
    let n = 2f64.powi(zoom as i32);
    let lng = f64::from(x) / n * 360.0 - 180.0;
    let lat = (PI - 2.0 * PI * f64::from(y) / n).sinh().atan() * 180.0 / PI;
    LatLng { lat, lng }
}

/// Geographic bounding box of tile `(x, y)` at `zoom`.
pub fn tile_to_bounding_box(x: u32, y: u32, zoom: u32) -> BoundingBox {
    let north_west = tile_corner(x, y, zoom);
    let south_east = tile_corner(x + 1, y + 1, zoom);

    BoundingBox {
        north: north_west.lat,
        south: south_east.lat,
        east: south_east.lng,
        west: north_west.lng,
    }
}

/// Forward projection: fractional tile coordinates of a point at `zoom`.
///
/// The integer parts are the address of the tile containing the point.
pub fn lat_lng_to_tile(lat: f64, lng: f64, zoom: u32) -> (f64, f64) {
    let n = 2f64.powi(zoom as i32);
    let x = (lng + 180.0) / 360.0 * n;
    let lat_rad = lat.to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    (x, y)
}
