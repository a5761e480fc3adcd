//! # Campus Tiles
//!
//! A slippy-map tile server that composites building floor plans.
//!
//! Each floor of each building is a raster image pinned to a geographic
//! bounding box. Given a tile address `(zoom, x, y)` and a floor name, the
//! server finds every floor with that name overlapping the tile, scales and
//! crops the floor images into place, and serves the composited 256×256 PNG.
//!
//! ## Features
//!
//! - **Web Mercator projection**: tile addresses to geographic bounds
//! - **North-aligned floors**: floor images are rotated once and memoized
//! - **Two cache tiers**: zoomed floor images and finished tiles, both
//!   byte-bounded LRU with single-flight fills
//! - **Disk store**: rendered tiles persist as `{z}_{x}_{y}_{floor}.png`
//! - **Bounded workers**: a fixed pool of tile workers behind a request queue
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`geo`] - Bounding boxes and slippy-map projection math
//! - [`floor`] - Floor image sources and one-time preparation
//! - [`dataset`] - Buildings, floors, rooms and spatial queries
//! - [`tile`] - Compositing, caching, disk store and worker pool
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use campus_tiles::{
//!     Dataset, FsImageSource, SpatialIndex, TileCompositor, TileDispatcher, TileRequest,
//!     TileService, ZoomedFloorCache,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Arc::new(Dataset::load("static/maps/map.json")?);
//!     let source = Arc::new(FsImageSource::new("static"));
//!     let index: Arc<dyn SpatialIndex> = dataset.clone();
//!
//!     let compositor = TileCompositor::new(index, ZoomedFloorCache::new(source, 64 << 20))?;
//!     let dispatcher = TileDispatcher::spawn(Arc::new(TileService::new(compositor)), 4);
//!
//!     let tile = dispatcher.submit(TileRequest::new(19, 82654, 179471, "1")).await?;
//!     println!("{} bytes from {}", tile.data.len(), tile.origin.as_str());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod floor;
pub mod geo;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use dataset::{Building, Dataset, Floor, FloorRef, Room, SpatialIndex};
pub use error::{AssetError, DatasetError, TileError};
pub use floor::{FsImageSource, ImageSource, PreparedImage};
pub use geo::{tile_to_bounding_box, BoundingBox, LatLng, TileAddress, MAX_ZOOM, TILE_SIZE};
pub use server::{create_router, AppState, RouterConfig};
pub use tile::{
    ByteCache, CacheStats, DiskTileStore, TileCompositor, TileDispatcher, TileKey, TileOrigin,
    TileRequest, TileResponse, TileService, ZoomedFloorCache,
};
