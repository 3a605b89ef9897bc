//! HTTP tests for image serving and the image API.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use common::{compressible_png, TestHarness};
use http_body_util::BodyExt;
use pixelstore::storage::ImageStorage;
use pixelstore_common::paths::UrlLayout;
use tower::ServiceExt;

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_check() {
    let h = TestHarness::new();
    let response = h.router().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn serves_stored_image_with_cache_header() {
    let h = TestHarness::new();
    let png = compressible_png();
    h.put_file("2024/05/dog.png", &png);

    let response = h
        .router()
        .oneshot(get("/content/images/2024/05/dog.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=31536000"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(body_bytes(response).await, png);
}

#[tokio::test]
async fn serve_router_works_standalone() {
    let h = TestHarness::new();
    h.put_file("a/b.gif", b"GIF89a....");

    let response = h.storage.serve().oneshot(get("/a/b.gif")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"GIF89a....");
}

#[tokio::test]
async fn missing_image_is_404_with_path() {
    let h = TestHarness::new();

    let response = h
        .router()
        .oneshot(get("/content/images/2024/05/nope.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    let json = body_json(response).await;
    assert_eq!(json["code"], "not_found");
    assert!(json["error"].as_str().unwrap().contains("2024/05/nope.png"));
}

#[tokio::test]
async fn other_serve_failures_are_internal_errors() {
    let h = TestHarness::new();
    h.put_file("2024/05/dog.png", b"x");

    let response = h
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/content/images/2024/05/dog.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    let json = body_json(response).await;
    assert_eq!(json["code"], "internal_error");
    assert!(json["error"].as_str().unwrap().contains("2024/05/dog.png"));
}

#[tokio::test]
async fn directories_are_not_listed() {
    let h = TestHarness::new();
    h.put_file("2024/05/dog.png", b"x");

    let response = h
        .router()
        .oneshot(get("/content/images/2024/05/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn serves_under_subdir() {
    let h = TestHarness::with_layout(UrlLayout::new("blog", "content/images"));
    h.put_file("x.png", b"png bytes");

    let response = h
        .router()
        .oneshot(get("/blog/content/images/x.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = h
        .router()
        .oneshot(get("/content/images/x.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_then_serve() {
    let h = TestHarness::new();
    let png = compressible_png();

    let response = h
        .router()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/images/2024/09/upload.png")
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(png.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let url = json["url"].as_str().unwrap().to_string();
    assert_eq!(url, "/content/images/2024/09/upload.png");

    let response = h.router().oneshot(get(&url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, png);
}

#[tokio::test]
async fn upload_outside_root_is_bad_request() {
    let h = TestHarness::new();

    let response = h
        .router()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/images/../../escape.png")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "bad_request");
}

#[tokio::test]
async fn exists_endpoint() {
    let h = TestHarness::new();
    h.put_file("2024/10/here.jpg", b"x");

    let response = h
        .router()
        .oneshot(get("/api/images/2024/10/here.jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["exists"], true);

    let response = h
        .router()
        .oneshot(get("/api/images/2024/10/gone.jpg"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["exists"], false);
}

#[tokio::test]
async fn delete_is_not_implemented() {
    let h = TestHarness::new();
    let stored = h.put_file("keep.png", b"x");

    let response = h
        .router()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/images/keep.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body_json(response).await["code"], "not_implemented");
    assert!(stored.exists());
}
