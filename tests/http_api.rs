mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::*;
use elevate_vision::adapters::http::router;
use elevate_vision::adapters::render::annotator::BoxAnnotator;
use elevate_vision::state_from_parts;
use serde_json::Value;
use tower::ServiceExt;

fn app(loader: FakeLoader) -> Router {
    let provider = provider_with(Arc::new(loader));
    router(state_from_parts(provider, Arc::new(BoxAnnotator::without_font())))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.expect("request failed");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn detect_request(fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/detect")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(fields, image)))
        .unwrap()
}

#[tokio::test]
async fn config_lists_tiers_and_defaults() {
    let req = Request::get("/api/config").body(Body::empty()).unwrap();
    let (status, body) = send(app(FakeLoader::with_detections(Vec::new())), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_tier"], "medium");
    assert_eq!(body["tiers"].as_array().unwrap().len(), 3);
    assert_eq!(body["tiers"][0]["weights"], "yolov8n");
    assert_eq!(body["tiers"][2]["label"], "Large (High Accuracy)");
    assert!((body["threshold"]["default"].as_f64().unwrap() - 0.45).abs() < 1e-6);
    assert!((body["threshold"]["step"].as_f64().unwrap() - 0.05).abs() < 1e-6);
}

#[tokio::test]
async fn strictness_hint_follows_threshold() {
    let app = app(FakeLoader::with_detections(Vec::new()));

    let req = Request::get("/api/strictness?threshold=0.2").body(Body::empty()).unwrap();
    let (_, body) = send(app.clone(), req).await;
    assert_eq!(body["band"], "loose");

    let req = Request::get("/api/strictness?threshold=0.9").body(Body::empty()).unwrap();
    let (_, body) = send(app.clone(), req).await;
    assert_eq!(body["band"], "strict");
    assert_eq!(body["message"], "Strict: Might miss small objects.");

    let req = Request::get("/api/strictness?threshold=1.5").body(Body::empty()).unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detect_returns_annotated_image_and_report() {
    let req = detect_request(&[("model", "nano"), ("threshold", "0.45")], Some(png_bytes().as_slice()));
    let (status, body) = send(app(FakeLoader::with_detections(street_scene())), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weights"], "yolov8n");
    assert_eq!(body["model"], "Nano (Fast & Lightweight)");
    assert_eq!(body["report_lines"], serde_json::json!(["2 Person", "1 Car"]));
    assert_eq!(body["detections"].as_array().unwrap().len(), 3);
    assert!(body["warning"].is_null());
    assert!(!body["annotated_png"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn empty_result_is_a_warning_not_an_error() {
    let req = detect_request(&[("threshold", "1.0")], Some(jpeg_bytes().as_slice()));
    let (status, body) = send(app(FakeLoader::with_detections(street_scene())), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weights"], "yolov8m");
    assert_eq!(body["report_lines"].as_array().unwrap().len(), 0);
    assert_eq!(
        body["warning"],
        "No objects found. Try lowering the 'Strictness' in the sidebar."
    );
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn corrupt_image_becomes_error_message() {
    let req = detect_request(&[("model", "medium")], Some(&b"\x89PNG\r\n\x1a\nbroken"[..]));
    let (status, body) = send(app(FakeLoader::with_detections(street_scene())), req).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().starts_with("System Error:"));
    assert!(body.get("report_lines").is_none());
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let app = app(FakeLoader::with_detections(street_scene()));

    let req = detect_request(&[("threshold", "1.2")], Some(png_bytes().as_slice()));
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = detect_request(&[("model", "gigantic")], Some(png_bytes().as_slice()));
    let (status, body) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown model tier"));

    let req = detect_request(&[("model", "nano")], None);
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_weights_become_error_message() {
    let req = detect_request(&[("model", "large")], Some(png_bytes().as_slice()));
    let (status, body) = send(app(FakeLoader::failing()), req).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.starts_with("System Error: could not load model yolov8l"));
}

#[tokio::test]
async fn unparsable_strictness_query_is_a_json_error() {
    let app = app(FakeLoader::with_detections(Vec::new()));

    for uri in ["/api/strictness?threshold=abc", "/api/strictness"] {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].as_str().unwrap().starts_with("System Error:"), "{uri}: {body}");
    }
}

#[tokio::test]
async fn non_multipart_detect_is_a_json_error() {
    let loader = Arc::new(FakeLoader::with_detections(street_scene()));
    let provider = provider_with(loader.clone());
    let app = router(state_from_parts(provider, Arc::new(BoxAnnotator::without_font())));

    let req = Request::builder()
        .method("POST")
        .uri("/api/detect")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"model":"nano"}"#))
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("System Error:"));
    assert_eq!(loader.load_count(), 0);
}
