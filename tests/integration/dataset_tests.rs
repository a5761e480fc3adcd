//! Dataset persistence and serving a dataset loaded from disk.

use axum::http::StatusCode;
use campus_tiles::dataset::Dataset;
use campus_tiles::error::DatasetError;
use tempfile::TempDir;

use super::test_utils::{
    build_server, campus_dataset, campus_source, decode, get, tile_uri, ServerOptions, HEBB_TILE,
};

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("maps").join("map.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    campus_dataset().save(&path).unwrap();
    let reloaded = Dataset::load(&path).unwrap();

    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.floor_count(), 3);

    let hebb = reloaded.floor("HEBB", "1").unwrap();
    assert_eq!(hebb.floor.rooms.len(), 1);
    assert_eq!(hebb.floor.rooms[0].building_id, "HEBB");
    assert_eq!(hebb.floor.rooms[0].floor, "1");
    assert_eq!(reloaded.building("HEBB").unwrap().address, "2045 East Mall");
}

#[test]
fn test_load_rejects_inverted_floor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.json");
    std::fs::write(
        &path,
        r#"[{"sis": "HEBB", "floors": [{"floor": "3", "image": "x.png",
            "coords": {"north": 49.2605, "south": 49.2607, "east": -123.2456, "west": -123.2460}}]}]"#,
    )
    .unwrap();

    match Dataset::load(&path) {
        Err(DatasetError::InvalidGeometry {
            building, floor, ..
        }) => {
            assert_eq!(building, "HEBB");
            assert_eq!(floor, "3");
        }
        other => panic!("expected invalid geometry, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = Dataset::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(DatasetError::Io(_))));
}

#[tokio::test]
async fn test_serve_reloaded_dataset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.json");
    campus_dataset().save(&path).unwrap();

    let server = build_server(
        Dataset::load(&path).unwrap(),
        campus_source(),
        ServerOptions::default(),
    );
    let (z, x, y) = HEBB_TILE;

    let (status, _, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode(&body).get_pixel(75, 240).0[3], 255);
}
