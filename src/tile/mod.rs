//! Tile service layer.
//!
//! This module turns slippy-map tile requests into composited PNG tiles and
//! caches the expensive intermediate and final results.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ submit
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     TileDispatcher (N worker tasks)     │
//! └────────────────────┬────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  ByteCache   │  │  DiskTileStore  │  │
//! │  │  (tiles)     │  │  (z_x_y_f.png)  │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             TileCompositor              │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ SpatialIndex │  │ZoomedFloorCache │  │
//! │  └──────────────┘  └────────┬────────┘  │
//! └─────────────────────────────┼───────────┘
//!                               ▼
//!                  Floor::prepared_image (once per floor)
//! ```
//!
//! # Components
//!
//! - [`TileDispatcher`]: bounded worker pool with a reply slot per request
//! - [`TileService`]: cache, store and compositor orchestration
//! - [`ByteCache`]: size-bounded LRU with single-flight fills
//! - [`TileCompositor`]: overlays overlapping floors onto a 256×256 canvas
//! - [`ZoomedFloorCache`]: floor images resized per zoom level
//! - [`DiskTileStore`]: persisted tiles named `{z}_{x}_{y}_{floor}.png`

mod cache;
mod compositor;
mod dispatcher;
mod encoder;
mod service;
mod store;
mod zoomed;

pub use cache::{ByteCache, CacheStats, DEFAULT_TILE_CACHE_CAPACITY, DEFAULT_ZOOMED_CACHE_CAPACITY};
pub use compositor::{floor_offset, Composed, TileCompositor};
pub use dispatcher::{TileDispatcher, TileHandler, DEFAULT_TILE_WORKERS};
pub use encoder::{blank_tile, decode_png, encode_png, encode_png_fast, is_png};
pub use service::{TileKey, TileOrigin, TileRequest, TileResponse, TileService};
pub use store::DiskTileStore;
pub use zoomed::{zoomed_dimensions, ZoomedFloorCache, ZoomedFloorKey, MAX_ZOOMED_PIXELS};
