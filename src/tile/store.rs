//! On-disk store of rendered tiles.
//!
//! Tiles are kept as flat files named `{z}_{x}_{y}_{floor}.png`, the same
//! name the HTTP route uses, so the directory can also be served statically.
//! Writes go through a temporary file and a rename, and reads discard files
//! that do not decode to a whole tile.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};

use super::encoder::is_complete_tile;
use super::service::TileKey;

/// Flat directory of rendered tile PNGs.
#[derive(Debug, Clone)]
pub struct DiskTileStore {
    dir: PathBuf,
}

impl DiskTileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of a tile inside the store.
    pub fn file_name(key: &TileKey) -> String {
        format!(
            "{}_{}_{}_{}.png",
            key.address.zoom, key.address.x, key.address.y, key.floor
        )
    }

    pub fn path_for(&self, key: &TileKey) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }

    /// Read a stored tile.
    ///
    /// A missing, unreadable or truncated file is a miss.
    pub async fn read(&self, key: &TileKey) -> Option<Bytes> {
        let path = self.path_for(key);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "Unreadable stored tile");
                }
                return None;
            }
        };

        let check = data.clone();
        let complete = tokio::task::spawn_blocking(move || is_complete_tile(&check))
            .await
            .unwrap_or(false);
        if !complete {
            warn!(path = %path.display(), len = data.len(), "Ignoring corrupt stored tile");
            return None;
        }

        Some(data)
    }

    /// Write a tile, creating the store directory if needed.
    ///
    /// The bytes land in a temporary sibling first and are renamed into
    /// place, so a reader sees either the old file or the complete new one.
    pub async fn write(&self, key: &TileKey, data: &[u8]) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(
            ".{}.{}.tmp",
            Self::file_name(key),
            std::process::id()
        ));

        if let Err(e) = tokio::fs::write(&tmp_path, data).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        tokio::fs::rename(&tmp_path, &path).await
    }
}
