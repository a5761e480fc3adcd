//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET /api/tiles/{z}_{x}_{y}_{floor}.png   GET /api/view/{json} │
//! │   GET /api/item/{id}                       GET /api/dump        │
//! │                                                                 │
//! │  ┌─────────────────────────┐  ┌──────────────────────────────┐  │
//! │  │        handlers         │  │            routes            │  │
//! │  │ (requests, error map)   │  │ (router, CORS, tracing)      │  │
//! │  └─────────────────────────┘  └──────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    dump_handler, health_handler, item_handler, parse_tile_filename, tile_handler, view_handler,
    visible_items, AppState, ErrorResponse, HealthResponse, ViewRequest, ViewResponse, ROOM_DETAIL_ZOOM,
};
pub use routes::{create_router, RouterConfig};
