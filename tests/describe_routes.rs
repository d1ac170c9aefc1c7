//! End-to-end tests for the HTTP surface.
//!
//! The asset, inference and model-serving providers are simulated with
//! wiremock; staging happens in a temporary directory.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use reqwest::Client;
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use verdure::adapters::local::FsStager;
use verdure::adapters::remote::{HttpAssetClient, HttpInferenceClient, ServingClassifier};
use verdure::config::Secret;
use verdure::domain::formats::FormatRegistry;
use verdure::ports::classifier::DiseaseClassifier;
use verdure::{router, AppState, DescribeService};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "verdure-test-boundary";

fn build_app(server: &MockServer, staging: &Path, classifier_url: Option<String>) -> Router {
    let client = Client::new();
    let key = Secret::new("test-key");
    let describe = Arc::new(DescribeService::new(
        FormatRegistry::default(),
        Arc::new(FsStager::new(staging)),
        Arc::new(HttpAssetClient::new(
            client.clone(),
            format!("{}/assets", server.uri()),
            key.clone(),
        )),
        HttpInferenceClient::new(client.clone(), format!("{}/vlm", server.uri()), key),
        "Diagnose the crop.",
    ));
    let classifier = classifier_url
        .map(|url| Arc::new(ServingClassifier::new(client, url)) as Arc<dyn DiseaseClassifier>);
    router(
        AppState {
            describe,
            classifier,
        },
        10 * 1024 * 1024,
    )
}

fn multipart(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (filename, content_type, bytes) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/describe")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request builder must not fail")
}

fn with_uri(mut request: Request<Body>, uri: &str) -> Request<Body> {
    *request.uri_mut() = uri.parse().expect("valid uri");
    request
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body must be collected")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response must be valid JSON")
}

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, Rgb([20, 140, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("png encoding");
    out.into_inner()
}

fn staged_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

async fn mount_asset_service(server: &MockServer, deletes: u64) {
    Mock::given(method("POST"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uploadUrl": format!("{}/upload/asset-1", server.uri()),
            "assetId": "asset-1",
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/asset-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/assets/.+$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(deletes)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_describe_returns_provider_payload_unchanged() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");
    let staging = temp_dir.path().join("staging");
    mount_asset_service(&server, 1).await;

    let payload = json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Common rust pustules on the upper leaf."}}],
        "usage": {"prompt_tokens": 812, "completion_tokens": 14}
    });
    Mock::given(method("POST"))
        .and(path("/vlm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(&server, &staging, None);
    let png = png_bytes();
    let response = app
        .oneshot(multipart(&[("leaf.png", "image/png", png.as_slice())]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, payload);
    assert_eq!(staged_count(&staging), 0);
}

#[tokio::test]
async fn test_describe_rejects_gif_without_side_effects() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");
    let staging = temp_dir.path().join("staging");

    let app = build_app(&server, &staging, None);
    let png = png_bytes();
    let response = app
        .oneshot(multipart(&[
            ("leaf.png", "image/png", png.as_slice()),
            ("animation.gif", "image/gif", &b"GIF89a"[..]),
        ]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("unsupported media format for `animation.gif`"));

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty(), "no provider calls expected: {requests:?}");
    assert_eq!(staged_count(&staging), 0);
}

#[tokio::test]
async fn test_describe_without_files_is_bad_request() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let response = app
        .oneshot(multipart(&[]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("no media files in request"));
}

#[tokio::test]
async fn test_describe_inference_failure_is_bad_gateway_and_cleans_up() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");
    let staging = temp_dir.path().join("staging");
    mount_asset_service(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/vlm"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let app = build_app(&server, &staging, None);
    let response = app
        .oneshot(multipart(&[("clip.mp4", "video/mp4", &b"not really a video"[..])]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error string")
        .contains("model overloaded"));
    assert_eq!(staged_count(&staging), 0);
}

#[tokio::test]
async fn test_describe_asset_rejection_is_bad_gateway() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");
    let staging = temp_dir.path().join("staging");
    Mock::given(method("POST"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vlm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_app(&server, &staging, None);
    let png = png_bytes();
    let response = app
        .oneshot(multipart(&[("leaf.png", "image/png", png.as_slice())]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(staged_count(&staging), 0);
}

#[tokio::test]
async fn test_describe_blank_file_field_is_empty_batch() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let response = app
        .oneshot(multipart(&[("", "application/octet-stream", &b""[..])]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("no media files in request"));
    assert!(server
        .received_requests()
        .await
        .expect("request recording enabled")
        .is_empty());
}

#[tokio::test]
async fn test_describe_failed_transfer_deletes_allocated_asset() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");
    let staging = temp_dir.path().join("staging");
    Mock::given(method("POST"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uploadUrl": format!("{}/upload/asset-x", server.uri()),
            "assetId": "asset-x",
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/assets/asset-x"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vlm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_app(&server, &staging, None);
    let png = png_bytes();
    let response = app
        .oneshot(multipart(&[("a.png", "image/png", png.as_slice())]))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let methods: Vec<String> = server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(methods, ["POST", "PUT", "DELETE"]);
    assert_eq!(staged_count(&staging), 0);
}

#[tokio::test]
async fn test_health_reports_classifier_state() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request builder must not fail"),
        )
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["model_loaded"], json!(false));
    assert_eq!(body["available_classes"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_index_serves_upload_form() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("request builder must not fail"),
        )
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body must be collected")
        .to_bytes();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("action=\"/describe\""));
    assert!(html.contains(".jpeg,.jpg,.mp4,.png"));
}

#[tokio::test]
async fn test_predict_without_model_reports_not_loaded() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let png = png_bytes();
    let response = app
        .oneshot(with_uri(multipart(&[("leaf.png", "image/png", png.as_slice())]), "/predict"))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], json!("Model not loaded"));
}

#[tokio::test]
async fn test_predict_rejects_non_images() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let response = app
        .oneshot(with_uri(
            multipart(&[("notes.txt", "text/plain", &b"hello"[..])]),
            "/predict",
        ))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("File must be an image"));
}

#[tokio::test]
async fn test_predict_rejects_undecodable_image() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");

    let app = build_app(&server, temp_dir.path(), None);
    let response = app
        .oneshot(with_uri(
            multipart(&[("leaf.png", "image/png", &b"not a png"[..])]),
            "/predict",
        ))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error string")
        .starts_with("Error processing image"));
}

#[tokio::test]
async fn test_predict_with_model_returns_prediction() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("tempdir must be created");
    Mock::given(method("POST"))
        .and(path("/v1/models/maize:predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"predictions": [[0.05, 0.1, 0.8, 0.05]]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(
        &server,
        temp_dir.path(),
        Some(format!("{}/v1/models/maize:predict", server.uri())),
    );
    let png = png_bytes();
    let response = app
        .oneshot(with_uri(multipart(&[("leaf.png", "image/png", png.as_slice())]), "/predict"))
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["prediction"], json!("Northern_Leaf_Blight"));
    assert_eq!(body["probabilities"].as_object().map(|o| o.len()), Some(4));
}
