//! Tile store and cache tier tests.
//!
//! Tests verify:
//! - Rendered tiles are persisted as `{z}_{x}_{y}_{floor}.png`
//! - Stored tiles are served without touching floor images
//! - Debug mode ignores stored tiles but still writes them
//! - Blank tiles are never persisted
//! - Truncated stored tiles are ignored and replaced

use axum::http::StatusCode;
use campus_tiles::geo::TileAddress;
use campus_tiles::tile::{DiskTileStore, TileKey};
use tempfile::TempDir;

use super::test_utils::{
    build_server, campus_dataset, campus_source, decode, get, solid_png, tile_uri,
    ServerOptions, HEBB_TILE,
};

fn hebb_key() -> TileKey {
    let (z, x, y) = HEBB_TILE;
    TileKey::new(TileAddress::new(z, x, y).unwrap(), "1")
}

fn stored_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_rendered_tile_is_persisted() {
    let dir = TempDir::new().unwrap();
    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(DiskTileStore::new(dir.path())),
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;

    let (status, _, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(stored_files(&dir), vec!["19_82654_179471_1.png".to_string()]);
    let on_disk = std::fs::read(dir.path().join("19_82654_179471_1.png")).unwrap();
    assert_eq!(on_disk, body.to_vec());
}

#[tokio::test]
async fn test_stored_tile_served_from_disk() {
    let dir = TempDir::new().unwrap();
    let store = DiskTileStore::new(dir.path());
    let stored = solid_png(256, 256, [0, 255, 0, 255]);
    store.write(&hebb_key(), &stored).await.unwrap();

    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(store),
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;
    let uri = tile_uri(z, x, y, "1");

    let (status, headers, body) = get(&server.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "disk");
    assert_eq!(body, stored);
    assert_eq!(server.source.load_count(), 0);

    // Promoted into memory
    let (_, headers, body) = get(&server.router, &uri).await;
    assert_eq!(headers.get("x-tile-origin").unwrap(), "memory");
    assert_eq!(body, stored);
}

#[tokio::test]
async fn test_truncated_stored_tile_is_rerendered() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("19_82654_179471_1.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n truncated").unwrap();

    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(DiskTileStore::new(dir.path())),
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;

    let (status, headers, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "rendered");
    assert_eq!(decode(&body).dimensions(), (256, 256));
    assert_eq!(server.source.load_count(), 1);

    // The damaged file was replaced by the fresh render
    assert_eq!(std::fs::read(&path).unwrap(), body.to_vec());
}

#[tokio::test]
async fn test_debug_mode_ignores_store() {
    let dir = TempDir::new().unwrap();
    let store = DiskTileStore::new(dir.path());
    let stale = solid_png(256, 256, [0, 255, 0, 255]);
    store.write(&hebb_key(), &stale).await.unwrap();

    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(store),
            debug: true,
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;

    let (status, headers, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "rendered");
    assert_ne!(body, stale);
    assert_eq!(server.source.load_count(), 1);

    // The fresh render replaced the stale file
    let on_disk = std::fs::read(dir.path().join("19_82654_179471_1.png")).unwrap();
    assert_eq!(on_disk, body.to_vec());
}

#[tokio::test]
async fn test_blank_tile_not_persisted() {
    let dir = TempDir::new().unwrap();
    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(DiskTileStore::new(dir.path())),
            ..Default::default()
        },
    );

    let (status, headers, _) = get(&server.router, &tile_uri(3, 1, 1, "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "blank");

    // A floor name nothing has is blank too
    let (z, x, y) = HEBB_TILE;
    let (_, headers, _) = get(&server.router, &tile_uri(z, x, y, "9")).await;
    assert_eq!(headers.get("x-tile-origin").unwrap(), "blank");

    assert!(stored_files(&dir).is_empty());
}

#[tokio::test]
async fn test_failed_render_not_persisted() {
    let dir = TempDir::new().unwrap();
    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(DiskTileStore::new(dir.path())),
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;

    let (status, _, _) = get(&server.router, &tile_uri(z, x, y, "2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(stored_files(&dir).is_empty());
}

#[tokio::test]
async fn test_unwritable_store_does_not_fail_request() {
    let dir = TempDir::new().unwrap();
    // A regular file where the tiles directory should be
    let blocker = dir.path().join("tiles");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            store: Some(DiskTileStore::new(&blocker)),
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;

    let (status, headers, _) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "rendered");
}
