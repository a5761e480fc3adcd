//! Worker pool behavior seen through the HTTP surface.

use axum::http::StatusCode;

use super::test_utils::{
    build_server, campus_dataset, campus_source, get, tile_uri, ServerOptions, HEBB_TILE,
};

#[tokio::test]
async fn test_single_worker_serves_many_tiles() {
    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions {
            workers: Some(1),
            ..Default::default()
        },
    );
    assert_eq!(server.dispatcher.worker_count(), 1);

    let (z, x, y) = HEBB_TILE;
    let mut handles = Vec::new();
    for dx in 0..4 {
        for dy in 0..2 {
            let router = server.router.clone();
            let uri = tile_uri(z, x + dx, y + dy, "1");
            handles.push(tokio::spawn(async move { get(&router, &uri).await }));
        }
    }

    for handle in handles {
        let (status, headers, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key("x-tile-origin"));
    }
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = build_server(
        campus_dataset(),
        campus_source(),
        ServerOptions::default(),
    );
    let (z, x, y) = HEBB_TILE;

    let (status, _, _) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::OK);

    server.dispatcher.shutdown().await;
    assert!(!server.dispatcher.is_running());

    // Even a tile already in memory goes through the workers
    let (status, _, _) = get(&server.router, &tile_uri(z, x, y, "1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
