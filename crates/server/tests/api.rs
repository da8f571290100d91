//! Integration tests for the analyze endpoint and infrastructure routes.
//!
//! Every request is driven through the full router with `oneshot`, so the
//! middleware stack (panic containment included) is exercised the way a
//! real client would see it.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

const XMP_APP1_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

fn test_router() -> axum::Router {
    let config = ServerConfig::default();
    build_router(Arc::new(ServerState::new(config, None)))
}

/// Minimal JPEG: SOI, one XMP APP1 segment, EOI.
fn jpeg_with_xmp(packet: &str) -> Vec<u8> {
    let mut payload = XMP_APP1_HEADER.to_vec();
    payload.extend_from_slice(packet.as_bytes());

    let mut out = vec![0xFF, 0xD8];
    out.push(0xFF);
    out.push(0xE1);
    let len = (payload.len() + 2) as u16;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn edited_packet() -> &'static str {
    r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
      <rdf:Description xmlns:xmp="http://ns.adobe.com/xap/1.0/">
        <xmp:CreatorTool>Adobe Photoshop 23.1 (Windows)</xmp:CreatorTool>
        <xmp:CreateDate>2021-03-01T10:00:00</xmp:CreateDate>
        <xmp:ModifyDate>2021-03-02T18:30:00</xmp:ModifyDate>
      </rdf:Description>
    </rdf:RDF>"#
}

fn upload(name: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/{name}"))
        .header("content-type", "application/x-www-form-urlencoded")
        .header("content-length", body.len().to_string())
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> (String, Value) {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let value = serde_json::from_str(&text).unwrap();
    (text, value)
}

#[tokio::test]
async fn valid_jpeg_yields_full_report() {
    let app = test_router();
    let body = jpeg_with_xmp(edited_packet());

    let response = app.oneshot(upload("photo.jpg", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let (_, report) = response_json(response).await;
    assert_eq!(report["is_valid"], true);
    assert_eq!(report["name"], "photo.jpg");
    assert_eq!(report["tests"]["creator_tool_is_photoshop"], true);
    assert_eq!(report["tests"]["create_modify_mismatch"], true);
    assert_eq!(report["tests"]["has_edit_history"], false);
}

#[tokio::test]
async fn report_field_order_is_stable() {
    let app = test_router();
    let body = jpeg_with_xmp(edited_packet());

    let response = app.oneshot(upload("photo.jpg", body)).await.unwrap();
    let (text, _) = response_json(response).await;

    let is_valid = text.find("\"is_valid\"").unwrap();
    let name = text.find("\"name\"").unwrap();
    let tests = text.find("\"tests\"").unwrap();
    assert!(is_valid < name && name < tests);

    // 2-space indented pretty output, not a compact blob.
    assert!(text.starts_with("{\n  \"is_valid\""));
}

#[tokio::test]
async fn non_jpeg_body_reports_invalid_with_name() {
    let app = test_router();

    let response = app
        .oneshot(upload("notes.txt", b"plain text, not an image".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert_eq!(report["name"], "notes.txt");
    assert!(!text.contains("\"tests\""));
}

#[tokio::test]
async fn jpeg_without_xmp_reports_invalid_with_name() {
    let app = test_router();
    let body = vec![0xFF, 0xD8, 0xFF, 0xD9];

    let response = app.oneshot(upload("bare.jpg", body)).await.unwrap();
    let (_, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert_eq!(report["name"], "bare.jpg");
}

#[tokio::test]
async fn bad_filename_reports_minimal_invalid() {
    let app = test_router();

    let response = app
        .oneshot(upload("sp%20ace.jpg", jpeg_with_xmp(edited_packet())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert!(!text.contains("\"name\""));
    assert!(!text.contains("\"tests\""));
}

#[tokio::test]
async fn overlong_filename_reports_minimal_invalid() {
    let app = test_router();
    let name = "x".repeat(65);

    let response = app
        .oneshot(upload(&name, jpeg_with_xmp(edited_packet())))
        .await
        .unwrap();
    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert!(!text.contains("\"name\""));
}

#[tokio::test]
async fn wrong_content_type_reports_minimal_invalid() {
    let app = test_router();
    let body = jpeg_with_xmp(edited_packet());

    let request = Request::builder()
        .method("POST")
        .uri("/photo.jpg")
        .header("content-type", "multipart/form-data")
        .header("content-length", body.len().to_string())
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert!(!text.contains("\"name\""));
}

#[tokio::test]
async fn missing_content_length_reports_minimal_invalid() {
    let app = test_router();

    let request = Request::builder()
        .method("POST")
        .uri("/photo.jpg")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(jpeg_with_xmp(edited_packet())))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert!(!text.contains("\"name\""));
}

#[tokio::test]
async fn oversized_declared_length_reports_minimal_invalid() {
    let app = test_router();

    let request = Request::builder()
        .method("POST")
        .uri("/photo.jpg")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("content-length", (129 * 1024 * 1024u64).to_string())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert!(!text.contains("\"name\""));
}

#[tokio::test]
async fn nested_path_hits_fallback() {
    let app = test_router();

    let request = Request::builder()
        .method("POST")
        .uri("/a/b.jpg")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("content-length", "0")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let (text, report) = response_json(response).await;
    assert_eq!(report["is_valid"], false);
    assert!(!text.contains("\"name\""));
}

#[tokio::test]
async fn any_method_is_accepted_on_analyze() {
    let app = test_router();
    let body = jpeg_with_xmp(edited_packet());

    let request = Request::builder()
        .method("PUT")
        .uri("/photo.jpg")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("content-length", body.len().to_string())
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let (_, report) = response_json(response).await;
    assert_eq!(report["is_valid"], true);
}

#[tokio::test]
async fn health_endpoint() {
    let app = test_router();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = response_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_endpoint() {
    let app = test_router();

    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = response_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["components"]["analyzer"], "ready");
}

#[tokio::test]
async fn root_endpoint_lists_api() {
    let app = test_router();

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = response_json(response).await;
    assert_eq!(body["name"], "retouch server");
}

#[tokio::test]
async fn metrics_endpoint_absent_without_recorder() {
    // The test router installs no Prometheus recorder, so the route
    // reports not found instead of rendering an empty exposition.
    let app = test_router();

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn infrastructure_route_shadows_filename() {
    // GET /health is always the probe, never an analyze of "health".
    let app = test_router();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (text, _) = response_json(response).await;
    assert!(!text.contains("is_valid"));
}
