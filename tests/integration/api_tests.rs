//! API integration tests for tile retrieval, viewport queries and errors.
//!
//! Tests verify:
//! - Tile retrieval and response headers
//! - Error cases (malformed names, out-of-range coordinates, missing assets)
//! - Viewport, item, dump and health endpoints

use axum::http::StatusCode;
use campus_tiles::geo::lat_lng_to_tile;
use serde_json::Value;

use super::test_utils::{campus_server, decode, get, is_valid_png, tile_uri, HEBB_TILE};

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;

    let (status, headers, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "image/png");
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(headers.get("x-tile-origin").unwrap(), "rendered");

    assert!(is_valid_png(&body));
    let img = decode(&body);
    assert_eq!(img.dimensions(), (256, 256));
}

#[tokio::test]
async fn test_cache_hit_header() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;
    let uri = tile_uri(z, x, y, "1");

    let (_, first_headers, first) = get(&server.router, &uri).await;
    let (_, second_headers, second) = get(&server.router, &uri).await;

    assert_eq!(first_headers.get("x-tile-origin").unwrap(), "rendered");
    assert_eq!(second_headers.get("x-tile-origin").unwrap(), "memory");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_tile_is_blank() {
    let server = campus_server();

    let (status, headers, body) = get(&server.router, &tile_uri(3, 1, 1, "1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "blank");
    let img = decode(&body);
    assert_eq!(img.dimensions(), (256, 256));
    assert!(img.pixels().all(|p| p.0[3] == 0));
    assert_eq!(server.source.load_count(), 0);
}

#[tokio::test]
async fn test_floor_name_with_underscore() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;

    // No floor is called "1_annex", so the tile is blank rather than an error
    let (status, headers, _) = get(&server.router, &tile_uri(z, x, y, "1_annex")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tile-origin").unwrap(), "blank");
}

// =============================================================================
// Tile Errors
// =============================================================================

#[tokio::test]
async fn test_non_integer_coordinates() {
    let server = campus_server();

    for uri in [
        "/api/tiles/a_0_0_1.png",
        "/api/tiles/19_x_0_1.png",
        "/api/tiles/19_0_-1_1.png",
        "/api/tiles/19_0_0.png",
        "/api/tiles/19_0_0_1.jpg",
    ] {
        let (status, _, body) = get(&server.router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "invalid_request");
        assert_eq!(json["status"], 400);
    }

    assert_eq!(server.source.load_count(), 0);
}

#[tokio::test]
async fn test_tile_out_of_bounds() {
    let server = campus_server();

    let (status, _, body) = get(&server.router, &tile_uri(2, 4, 0, "1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "tile_out_of_bounds");

    let (status, _, _) = get(&server.router, &tile_uri(31, 0, 0, "1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zoom_too_deep_for_floor() {
    let server = campus_server();
    let (x, y) = lat_lng_to_tile(49.2606, -123.2458, 28);

    let uri = tile_uri(28, x as u32, y as u32, "1");
    let (status, _, body) = get(&server.router, &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "crop_too_large");
    assert_eq!(server.source.load_count(), 0);

    // The server keeps serving
    let (z, x, y) = HEBB_TILE;
    let (status, _, _) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_floor_image() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;

    let (status, _, body) = get(&server.router, &tile_uri(z, x, y, "2")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "asset_not_found");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("maps/hebb/missing.png"));
}

#[tokio::test]
async fn test_workers_stopped() {
    let server = campus_server();
    server.dispatcher.shutdown().await;

    let (z, x, y) = HEBB_TILE;
    let (status, _, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unavailable");
}

// =============================================================================
// Viewport and Dataset
// =============================================================================

#[tokio::test]
async fn test_view_at_room_zoom() {
    let server = campus_server();
    let view = r#"{"north":49.2610,"south":49.2600,"east":-123.2450,"west":-123.2470,"zoom":19,"floor":"1"}"#;

    let uri = format!("/api/view/{}", urlencoding::encode(view));
    let (status, _, body) = get(&server.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["Floors"], serde_json::json!(["1", "2"]));

    let rooms = json["Rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "Lecture Theatre");
    assert_eq!(rooms[0]["floor"], "1");

    let buildings = json["Buildings"].as_array().unwrap();
    assert_eq!(buildings.len(), 1);
    assert_eq!(buildings[0]["sis"], "HEBB");
    assert_eq!(buildings[0]["Address"], "2045 East Mall");
    assert!(buildings[0].get("floors").is_none());
}

#[tokio::test]
async fn test_view_below_room_zoom() {
    let server = campus_server();
    let view = r#"{"north":49.2620,"south":49.2600,"east":-123.2450,"west":-123.2500,"zoom":16,"floor":"1"}"#;

    let uri = format!("/api/view/{}", urlencoding::encode(view));
    let (status, _, body) = get(&server.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["Floors"].as_array().unwrap().is_empty());
    assert!(json["Rooms"].as_array().unwrap().is_empty());
    assert_eq!(json["Buildings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_view_invalid_json() {
    let server = campus_server();

    let (status, _, body) = get(&server.router, "/api/view/not-json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_request");
}

#[tokio::test]
async fn test_item_building() {
    let server = campus_server();

    let (status, _, body) = get(&server.router, "/api/item/HEBB").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["sis"], "HEBB");
    assert_eq!(json["name"], "Hebb");
    assert_eq!(json["Address"], "2045 East Mall");
    assert!(json.get("floors").is_none());
}

#[tokio::test]
async fn test_item_room() {
    let server = campus_server();

    let uri = format!("/api/item/{}", urlencoding::encode("HEBB 100"));
    let (status, _, body) = get(&server.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["id"], "100");
    assert_eq!(json["name"], "Lecture Theatre");
    assert_eq!(json["sis"], "HEBB");
    assert_eq!(json["floor"], "1");
    assert_eq!(json["type"], "classroom");
}

#[tokio::test]
async fn test_item_not_found() {
    let server = campus_server();

    for uri in ["/api/item/NOPE", "/api/item/HEBB%20999", "/api/item/100"] {
        let (status, _, body) = get(&server.router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri {}", uri);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "item_not_found");
    }
}

#[tokio::test]
async fn test_dump() {
    let server = campus_server();

    let (status, _, body) = get(&server.router, "/api/dump").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let buildings = json.as_array().unwrap();
    assert_eq!(buildings.len(), 2);
    assert_eq!(buildings[0]["sis"], "HEBB");
    assert_eq!(buildings[1]["sis"], "LSK");
    assert_eq!(buildings[0]["floors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = campus_server();

    let (status, _, body) = get(&server.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
