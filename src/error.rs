use thiserror::Error;

/// Errors that can occur when loading or decoding a floor's raster asset.
///
/// These are recorded once per floor and handed to every caller waiting on
/// the floor's preparation, so they must be cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The image reference does not resolve to a readable asset
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Reading the asset failed
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    /// The asset was read but could not be decoded as an image
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
}

/// Errors raised while loading or saving the building dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Reading or writing the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid building list
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A floor declares a bounding box with north <= south or east <= west
    #[error("Invalid geometry for building {building}, floor {floor}: {reason}")]
    InvalidGeometry {
        building: String,
        floor: String,
        reason: String,
    },

    /// A building lists two floors with the same name
    #[error("Building {building} has more than one floor named {floor}")]
    DuplicateFloor { building: String, floor: String },
}

/// Errors that can occur while serving a tile request.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The request could not be parsed (non-integer coordinates, bad name)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Tile coordinates are outside the slippy grid for the zoom level
    #[error("Tile ({x}, {y}) out of bounds at zoom {zoom} (max index {max})")]
    TileOutOfBounds { zoom: u32, x: u32, y: u32, max: u64 },

    /// The zoomed floor image would exceed the pixel budget
    #[error("Floor {floor} at zoom {zoom} would be {width}x{height} pixels (limit {max_pixels})")]
    CropTooLarge {
        floor: String,
        zoom: u32,
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    /// No building or room has the requested id
    #[error("Item not found: {id}")]
    ItemNotFound { id: String },

    /// A floor image could not be loaded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Failed to decode an intermediate image
    #[error("Decode error: {message}")]
    DecodeError { message: String },

    /// Failed to encode an image
    #[error("Encode error: {message}")]
    EncodeError { message: String },

    /// A background computation failed to complete (e.g. panicked)
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// The worker pool is no longer accepting requests
    #[error("Tile workers are not running")]
    Unavailable,
}

impl From<tokio::task::JoinError> for TileError {
    fn from(err: tokio::task::JoinError) -> Self {
        TileError::Internal {
            message: err.to_string(),
        }
    }
}
