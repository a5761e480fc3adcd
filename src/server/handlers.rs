//! HTTP request handlers for the campus map API.
//!
//! # Endpoints
//!
//! - `GET /api/tiles/{z}_{x}_{y}_{floor}.png` - Serve a composited tile
//! - `GET /api/view/{json}` - Floors, rooms and buildings visible in a viewport
//! - `GET /api/item/{id}` - One building or room by id
//! - `GET /api/dump` - The whole building dataset
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::dataset::{Building, Dataset, Item, Room};
use crate::error::{AssetError, TileError};
use crate::geo::BoundingBox;
use crate::tile::{TileDispatcher, TileRequest};

/// Rooms are only listed once the map is zoomed in this far.
pub const ROOM_DETAIL_ZOOM: u32 = 19;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Worker pool serving tile requests
    pub dispatcher: Arc<TileDispatcher>,

    /// The building dataset
    pub dataset: Arc<Dataset>,

    /// Cache-Control max-age for tiles, in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl AppState {
    pub fn new(dispatcher: Arc<TileDispatcher>, dataset: Arc<Dataset>) -> Self {
        Self {
            dispatcher,
            dataset,
            cache_max_age: 3600,
        }
    }

    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Parse a tile file name of the form `{z}_{x}_{y}_{floor}.png`.
///
/// The floor name is everything after the third underscore, so it may itself
/// contain underscores.
pub fn parse_tile_filename(filename: &str) -> Result<TileRequest, TileError> {
    let invalid = |reason: &str| TileError::InvalidRequest {
        message: format!("invalid tile name {:?}: {}", filename, reason),
    };

    let stem = filename
        .strip_suffix(".png")
        .ok_or_else(|| invalid("expected a .png file"))?;

    let mut parts = stem.splitn(4, '_');
    let mut coordinate = |name: &str| -> Result<u32, TileError> {
        parts
            .next()
            .ok_or_else(|| invalid(&format!("missing {}", name)))?
            .parse()
            .map_err(|_| invalid(&format!("{} is not a non-negative integer", name)))
    };

    let zoom = coordinate("zoom")?;
    let x = coordinate("x")?;
    let y = coordinate("y")?;
    let floor = parts.next().ok_or_else(|| invalid("missing floor"))?;

    Ok(TileRequest::new(zoom, x, y, floor))
}

/// Viewport description sent by the map client.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewRequest {
    #[serde(flatten)]
    pub bounds: BoundingBox,

    #[serde(default)]
    pub zoom: u32,

    #[serde(default)]
    pub floor: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_request", "asset_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// What the client should draw for a viewport.
///
/// Keys are capitalized to match what existing map clients read.
#[derive(Debug, Default, Serialize)]
pub struct ViewResponse {
    /// Distinct floor names of the buildings in view
    #[serde(rename = "Floors")]
    pub floors: Vec<String>,

    /// Rooms on the requested floor inside the viewport
    #[serde(rename = "Rooms")]
    pub rooms: Vec<Room>,

    /// Summaries of buildings whose position is inside the viewport
    #[serde(rename = "Buildings")]
    pub buildings: Vec<Building>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
            TileError::TileOutOfBounds { .. } => (StatusCode::BAD_REQUEST, "tile_out_of_bounds"),
            TileError::CropTooLarge { .. } => (StatusCode::BAD_REQUEST, "crop_too_large"),
            TileError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, "item_not_found"),
            TileError::Asset(AssetError::NotFound(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "asset_not_found")
            }
            TileError::Asset(_) => (StatusCode::INTERNAL_SERVER_ERROR, "asset_error"),
            TileError::DecodeError { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
            TileError::EncodeError { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "encode_error"),
            TileError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            TileError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status.is_client_error() {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /api/tiles/{z}_{x}_{y}_{floor}.png`
///
/// # Response
///
/// `200 OK` with an `image/png` body. `X-Tile-Origin` tells where the bytes
/// came from (`memory`, `disk`, `rendered` or `blank`).
///
/// # Errors
///
/// - `400` for non-integer or out-of-range coordinates
/// - `500` when a floor image cannot be loaded or the tile cannot be built
/// - `503` when the tile workers have stopped
pub async fn tile_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, TileError> {
    let request = parse_tile_filename(&filename)?;
    let response = state.dispatcher.submit(request).await?;

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
    ];

    Ok((
        StatusCode::OK,
        headers,
        [("X-Tile-Origin", response.origin.as_str())],
        response.data,
    )
        .into_response())
}

/// Handle viewport queries.
///
/// # Endpoint
///
/// `GET /api/view/{json}` where `{json}` is
/// `{"north":..,"south":..,"east":..,"west":..,"zoom":..,"floor":".."}`
///
/// Floor names and rooms are only reported at zoom 19 and above.
pub async fn view_handler(
    State(state): State<AppState>,
    Path(json): Path<String>,
) -> Result<Json<ViewResponse>, TileError> {
    let view: ViewRequest =
        serde_json::from_str(&json).map_err(|e| TileError::InvalidRequest {
            message: format!("invalid view: {}", e),
        })?;

    debug!(?view, "View query");
    Ok(Json(visible_items(&state.dataset, &view)))
}

/// Collect what is visible in `view`.
pub fn visible_items(dataset: &Dataset, view: &ViewRequest) -> ViewResponse {
    use crate::dataset::SpatialIndex;

    let mut response = ViewResponse::default();

    for building in dataset.overlapping_buildings(&view.bounds) {
        if building
            .position
            .is_some_and(|p| view.bounds.contains(&p))
        {
            response.buildings.push(building.meta());
        }

        if view.zoom < ROOM_DETAIL_ZOOM {
            continue;
        }

        for floor in &building.floors {
            if floor.name == view.floor {
                response.rooms.extend(
                    floor
                        .rooms
                        .iter()
                        .filter(|room| room.position.is_some_and(|p| view.bounds.contains(&p)))
                        .cloned(),
                );
            }
            if !response.floors.contains(&floor.name) {
                response.floors.push(floor.name.clone());
            }
        }
    }

    response
}

/// Look up a building by its code or a room by `"{code} {room id}"`.
///
/// # Endpoint
///
/// `GET /api/item/{id}`
///
/// # Errors
///
/// - `404` when no building or room has that id
pub async fn item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, TileError> {
    state
        .dataset
        .item(&id)
        .cloned()
        .map(Json)
        .ok_or(TileError::ItemNotFound { id })
}

/// Dump the whole dataset.
///
/// # Endpoint
///
/// `GET /api/dump`
pub async fn dump_handler(State(state): State<AppState>) -> Json<Vec<Arc<Building>>> {
    Json(state.dataset.buildings().to_vec())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
