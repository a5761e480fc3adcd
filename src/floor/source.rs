//! Byte sources for floor-plan raster assets.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::AssetError;

/// Trait for fetching the raw bytes of a floor image by its reference.
///
/// The reference is the `image` field of a floor (e.g. `maps/hebb/1.png`).
/// Implementations decide how that maps onto storage.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Load the encoded image bytes for `image_ref`.
    async fn load(&self, image_ref: &str) -> Result<Bytes, AssetError>;
}

/// Image source backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    /// Create a source that resolves references relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory references are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path under the root.
    ///
    /// Absolute paths and `..` components are refused so a reference cannot
    /// point outside the asset directory.
    pub fn resolve(&self, image_ref: &str) -> Option<PathBuf> {
        let relative = Path::new(image_ref);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if image_ref.is_empty() || !safe {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn load(&self, image_ref: &str) -> Result<Bytes, AssetError> {
        let path = self
            .resolve(image_ref)
            .ok_or_else(|| AssetError::NotFound(image_ref.to_string()))?;

        debug!(path = %path.display(), "Loading floor image");

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(image_ref.to_string()))
            }
            Err(e) => Err(AssetError::Io {
                path: image_ref.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
