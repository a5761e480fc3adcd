//! Geographic primitives and slippy-map projection math.
//!
//! - [`BoundingBox`] and [`LatLng`] describe regions and points in degrees
//! - [`tile_to_bounding_box`] maps a tile address to its geographic extent
//! - [`TileAddress`] is a validated `(zoom, x, y)` triple

mod bounds;
mod projection;

pub use bounds::{BoundingBox, LatLng};
pub use projection::{
    lat_lng_to_tile, tile_corner, tile_to_bounding_box, tiles_per_axis, TileAddress, MAX_ZOOM,
    TILE_SIZE,
};
