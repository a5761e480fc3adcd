//! End-to-end compositing scenarios at zoom 19 over the Hebb footprint.
//!
//! Tile (82654, 179471) covers N 49.26108 S 49.26064 E -123.24532 W -123.24600.
//! At this zoom the floor is drawn 149×114 pixels and its north-west corner
//! lands at canvas (1, 218), so it fills columns 1..150 and rows 218..256.
//! The rest of the floor continues in tile (82654, 179472), rows 0..78.

use axum::http::StatusCode;
use image::Rgba;

use super::test_utils::{
    build_server, campus_dataset, campus_server, campus_source, decode, get, tile_uri,
    ServerOptions, HEBB_TILE,
};

const HEBB_COLOR: Rgba<u8> = Rgba([200, 40, 40, 255]);

fn is_transparent(p: &Rgba<u8>) -> bool {
    p.0[3] == 0
}

#[tokio::test]
async fn test_floor_placement() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;

    let (status, _, body) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);

    let img = decode(&body);
    assert_eq!(img.dimensions(), (256, 256));

    // Inside the floor
    assert_eq!(*img.get_pixel(75, 240), HEBB_COLOR);
    assert_eq!(*img.get_pixel(1, 218), HEBB_COLOR);
    assert_eq!(*img.get_pixel(149, 255), HEBB_COLOR);

    // North of the floor
    assert!(is_transparent(img.get_pixel(75, 100)));
    assert!(is_transparent(img.get_pixel(75, 217)));
    // East of the floor
    assert!(is_transparent(img.get_pixel(200, 240)));
    assert!(is_transparent(img.get_pixel(150, 240)));
    // West of the floor
    assert!(is_transparent(img.get_pixel(0, 240)));
}

#[tokio::test]
async fn test_floor_continues_in_southern_neighbour() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;

    let (status, _, body) = get(&server.router, &tile_uri(z, x, y + 1, "1")).await;
    assert_eq!(status, StatusCode::OK);

    let img = decode(&body);
    assert_eq!(*img.get_pixel(75, 10), HEBB_COLOR);
    assert_eq!(*img.get_pixel(75, 0), HEBB_COLOR);
    assert!(is_transparent(img.get_pixel(75, 100)));
    assert!(is_transparent(img.get_pixel(200, 10)));
}

#[tokio::test]
async fn test_repeat_request_served_from_memory() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;
    let uri = tile_uri(z, x, y, "1");

    let (_, first_headers, first) = get(&server.router, &uri).await;
    assert_eq!(first_headers.get("x-tile-origin").unwrap(), "rendered");
    assert_eq!(server.source.load_count(), 1);

    let (_, second_headers, second) = get(&server.router, &uri).await;
    assert_eq!(second_headers.get("x-tile-origin").unwrap(), "memory");
    assert_eq!(first, second);
    assert_eq!(server.source.load_count(), 1);
}

#[tokio::test]
async fn test_floor_image_loaded_once_across_tiles() {
    let server = campus_server();
    let (z, x, y) = HEBB_TILE;

    get(&server.router, &tile_uri(z, x, y, "1")).await;
    get(&server.router, &tile_uri(z, x, y + 1, "1")).await;
    get(&server.router, &tile_uri(z - 1, x / 2, y / 2, "1")).await;

    assert_eq!(server.source.load_count(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_single_render() {
    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            workers: Some(8),
            ..Default::default()
        },
    );
    let (z, x, y) = HEBB_TILE;
    let uri = tile_uri(z, x, y, "1");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let router = server.router.clone();
        let uri = uri.clone();
        handles.push(tokio::spawn(async move { get(&router, &uri).await }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        let (status, _, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        bodies.push(body);
    }

    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(server.source.load_count(), 1);
}
