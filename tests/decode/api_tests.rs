//! HTTP API integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use cr2_streamer::photo::{DirectorySource, PhotoRegistry};
use cr2_streamer::render::RenderService;
use cr2_streamer::server::{create_router, RouterConfig};

use super::test_utils::{build_cr2_fixture, RAW_HEIGHT, RAW_WIDTH};

/// Build a router serving a tempdir with one good fixture and one bogus file.
fn test_router() -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("test.cr2"), build_cr2_fixture()).unwrap();
    std::fs::write(dir.path().join("bogus.cr2"), b"not a cr2 at all").unwrap();

    let source = DirectorySource::new(dir.path());
    let registry = PhotoRegistry::new(source);
    let render = RenderService::new(registry);
    let router = create_router(render, RouterConfig::new().with_tracing(false));
    (router, dir)
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec(), content_type)
}

#[tokio::test]
async fn test_health() {
    let (router, _dir) = test_router();
    let (status, body, _) = get(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_photos() {
    let (router, _dir) = test_router();
    let (status, body, _) = get(router, "/photos").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let photos: Vec<&str> = json["photos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(photos.contains(&"test.cr2"));
    assert!(photos.contains(&"bogus.cr2"));
}

#[tokio::test]
async fn test_photo_metadata() {
    let (router, _dir) = test_router();
    let (status, body, _) = get(router, "/photos/test.cr2").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["photo_id"], "test.cr2");
    assert_eq!(json["camera_make"], "Canon");
    assert_eq!(json["slices"][0], 1);
    assert_eq!(json["slices"][1], 4);

    let outputs = json["outputs"].as_array().unwrap();
    assert_eq!(outputs.len(), 4);
    assert_eq!(outputs[3]["output"], 3);
    assert_eq!(outputs[3]["width"], RAW_WIDTH as u64);
    assert_eq!(outputs[3]["height"], RAW_HEIGHT as u64);
    assert_eq!(outputs[3]["media_type"], "image/png");
}

#[tokio::test]
async fn test_raw_render_output_is_png() {
    let (router, _dir) = test_router();
    let (status, body, content_type) = get(router, "/photos/test.cr2/3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));

    let image = image::load_from_memory(&body).unwrap().into_rgba16();
    assert_eq!(image.width(), RAW_WIDTH as u32);
    assert_eq!(image.height(), RAW_HEIGHT as u32);
    // Top-left mosaic site is red: component 0 on an even row.
    assert_eq!(image.get_pixel(0, 0).0, [32800, 0, 0, 0xFFFF]);
}

#[tokio::test]
async fn test_thumbnail_output_is_jpeg() {
    let (router, _dir) = test_router();
    let (status, body, content_type) = get(router, "/photos/test.cr2/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(&body[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_render_cache_hit_on_second_request() {
    let (router, _dir) = test_router();

    let request = Request::builder()
        .uri("/photos/test.cr2/3")
        .body(Body::empty())
        .unwrap();
    let first = router.clone().oneshot(request).await.unwrap();
    assert_eq!(first.headers()["x-cache"], "miss");

    let request = Request::builder()
        .uri("/photos/test.cr2/3")
        .body(Body::empty())
        .unwrap();
    let second = router.oneshot(request).await.unwrap();
    assert_eq!(second.headers()["x-cache"], "hit");
}

#[tokio::test]
async fn test_invalid_output_index() {
    let (router, _dir) = test_router();
    let (status, body, _) = get(router, "/photos/test.cr2/7").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_output");
}

#[tokio::test]
async fn test_missing_photo_is_404() {
    let (router, _dir) = test_router();
    let (status, _, _) = get(router, "/photos/missing.cr2/0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_undecodable_photo_is_415() {
    let (router, _dir) = test_router();
    let (status, body, _) = get(router, "/photos/bogus.cr2/0").await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unsupported_photo");
}
