//! Health probes and cross-cutting middleware.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestApp;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/api/health/live")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new();

    let (status, _) = app.send(get("/api/health/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_full_health_reports_channels() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/api/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"]["connected"], false);
    assert_eq!(body["notifications"]["email"], false);
    assert_eq!(body["notifications"]["webhook"], false);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    use tower::ServiceExt;

    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health/live")
        .header("x-request-id", "probe-42")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "probe-42");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app.send(get("/api/v1/does-not-exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
