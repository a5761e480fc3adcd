//! PNG encoding for tiles and intermediate floor crops.
//!
//! Two profiles are used:
//!
//! - **Fast**: zoomed floor images are re-decoded for every tile they
//!   contribute to, so they favor encode/decode speed over size.
//! - **Best**: tiles that leave the server (and the shared blank tile) are
//!   compressed properly.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, ImageFormat, ImageReader, RgbaImage};

use crate::error::TileError;
use crate::geo::TILE_SIZE;

// =============================================================================
// Encoding
// =============================================================================

fn encode_with(
    img: &RgbaImage,
    compression: CompressionType,
    filter: FilterType,
) -> Result<Bytes, TileError> {
    let mut output = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut output, compression, filter);

    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| TileError::EncodeError {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

/// Encode an RGBA image as PNG optimized for speed.
pub fn encode_png_fast(img: &RgbaImage) -> Result<Bytes, TileError> {
    encode_with(img, CompressionType::Fast, FilterType::NoFilter)
}

/// Encode an RGBA image as a compact PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Bytes, TileError> {
    encode_with(img, CompressionType::Best, FilterType::Adaptive)
}

/// Decode PNG bytes to RGBA.
pub fn decode_png(data: &[u8]) -> Result<RgbaImage, TileError> {
    let reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Png);
    let img = reader.decode().map_err(|e| TileError::DecodeError {
        message: e.to_string(),
    })?;
    Ok(img.to_rgba8())
}

/// Whether `data` decodes to a complete 256×256 tile.
pub fn is_complete_tile(data: &[u8]) -> bool {
    is_png(data)
        && decode_png(data)
            .map(|img| img.dimensions() == (TILE_SIZE, TILE_SIZE))
            .unwrap_or(false)
}

/// A fully transparent tile, encoded once and shared.
pub fn blank_tile() -> Result<Bytes, TileError> {
    encode_png(&RgbaImage::new(TILE_SIZE, TILE_SIZE))
}

/// Check if data looks like a PNG (signature check).
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}

// =============================================================================
// Tests
// =============================================================================
