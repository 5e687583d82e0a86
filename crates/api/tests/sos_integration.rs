//! HTTP-level tests for the SOS endpoints.
//!
//! Run with: cargo test --test sos_integration

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{get_request_with_auth, get_request_with_cookie, json_request, sos_body, TestApp};
use domain::models::{Actor, AlertStatus, PlanTier, Role};
use domain::services::SentNotification;
use serde_json::json;
use uuid::Uuid;

/// (longitude, latitude)
const CASABLANCA: (f64, f64) = (-7.6114, 33.5731);
/// About 90 km from Casablanca.
const RABAT: (f64, f64) = (-6.8498, 34.0209);

const SOS_URI: &str = "/api/v1/sos";

async fn create_sos(app: &TestApp, actor: Actor) -> serde_json::Value {
    let token = app.token(actor);
    let (status, body) = app
        .send(json_request(
            Method::POST,
            SOS_URI,
            sos_body(CASABLANCA.0, CASABLANCA.1),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    body
}

async fn patch_sos(
    app: &TestApp,
    actor: Actor,
    sos_id: &str,
    status: &str,
    garage_id: Option<Uuid>,
) -> (StatusCode, serde_json::Value) {
    let token = app.token(actor);
    let mut body = json!({ "sosId": sos_id, "status": status });
    if let Some(garage_id) = garage_id {
        body["garageId"] = json!(garage_id);
    }
    app.send(json_request(Method::PATCH, SOS_URI, body, Some(&token)))
        .await
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_create_without_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            SOS_URI,
            sos_body(CASABLANCA.0, CASABLANCA.1),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unauthorized");
    assert!(app.store.alerts().is_empty());
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app
        .send(get_request_with_auth(SOS_URI, "not-a-jwt"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use shared::jwt::{Claims, TokenType};

    let app = TestApp::new();
    let past = chrono::Utc::now() - chrono::Duration::hours(2);
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: Role::User,
        exp: (past + chrono::Duration::minutes(5)).timestamp(),
        iat: past.timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
    };
    let key = EncodingKey::from_rsa_pem(common::TEST_PRIVATE_KEY.as_bytes()).unwrap();
    let token = encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap();

    let (status, body) = app.send(get_request_with_auth(SOS_URI, &token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
}

#[tokio::test]
async fn test_cookie_token_is_accepted() {
    let app = TestApp::new();
    let driver = app.requester();
    create_sos(&app, driver).await;

    let (status, body) = app
        .send(get_request_with_cookie(SOS_URI, &app.token(driver)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_returns_alert_and_notifies_nearby_garage() {
    let app = TestApp::new();
    let driver = app.requester();
    let (_, nearby) = app.garage_at(CASABLANCA.0 + 0.01, CASABLANCA.1);
    let (_, far) = app.garage_at(RABAT.0, RABAT.1);

    let body = create_sos(&app, driver).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["priority"], "normal");
    assert_eq!(body["data"]["vehicleType"], "car");
    assert_eq!(body["data"]["location"]["type"], "Point");
    assert_eq!(
        body["message"],
        "SOS request created. 1 nearby garage has been notified."
    );

    let sent = app.sink.sent();
    let alert_id = app.store.alerts()[0].id;
    assert!(sent.contains(&SentNotification::ResponderEmail {
        responder_id: nearby.id,
        alert_id,
    }));
    assert!(!sent.iter().any(|n| matches!(
        n,
        SentNotification::ResponderEmail { responder_id, .. } if *responder_id == far.id
    )));
}

#[tokio::test]
async fn test_create_missing_phone_is_validation_error() {
    let app = TestApp::new();
    let driver = app.requester();
    let mut body = sos_body(CASABLANCA.0, CASABLANCA.1);
    body.as_object_mut().unwrap().remove("phone");

    let (status, response) = app
        .send(json_request(
            Method::POST,
            SOS_URI,
            body,
            Some(&app.token(driver)),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "validation_error");
    assert!(app.store.alerts().is_empty());
}

#[tokio::test]
async fn test_create_out_of_range_latitude_is_validation_error() {
    let app = TestApp::new();
    let driver = app.requester();

    let (status, _) = app
        .send(json_request(
            Method::POST,
            SOS_URI,
            sos_body(CASABLANCA.0, 123.0),
            Some(&app.token(driver)),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_malformed_body_is_validation_error() {
    let app = TestApp::new();
    let driver = app.requester();

    let request = Request::builder()
        .method(Method::POST)
        .uri(SOS_URI)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(driver)))
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_quota_exhausted_returns_upgrade_action() {
    let app = TestApp::new();
    let driver = app.requester();
    app.subscribe(driver.user_id, PlanTier::Free, 1);

    let (status, body) = app
        .send(json_request(
            Method::POST,
            SOS_URI,
            sos_body(CASABLANCA.0, CASABLANCA.1),
            Some(&app.token(driver)),
        ))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "quota_exceeded");
    assert_eq!(body["action"], "/pricing");
    assert!(app.store.alerts().is_empty());
}

#[tokio::test]
async fn test_enterprise_request_is_critical() {
    let app = TestApp::new();
    let driver = app.requester();
    app.subscribe(driver.user_id, PlanTier::Enterprise, 40);

    let body = create_sos(&app, driver).await;

    assert_eq!(body["data"]["priority"], "critical");
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_requester_only_sees_own_alerts() {
    let app = TestApp::new();
    let alice = app.requester();
    let bob = app.requester();
    create_sos(&app, alice).await;
    create_sos(&app, bob).await;

    let (status, body) = app
        .send(get_request_with_auth(SOS_URI, &app.token(alice)))
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["userId"], alice.user_id.to_string());
    assert!(data[0]["user"]["name"].is_string());
}

#[tokio::test]
async fn test_unknown_status_filter_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin();

    let (status, body) = app
        .send(get_request_with_auth(
            "/api/v1/sos?status=pending,exploded",
            &app.token(admin),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_admin_status_filter() {
    let app = TestApp::new();
    let admin = app.admin();
    let driver = app.requester();
    app.subscribe(driver.user_id, PlanTier::Standard, 0);
    create_sos(&app, driver).await;
    let second = create_sos(&app, driver).await;
    let id = second["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = patch_sos(&app, driver, &id, "cancelled", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(get_request_with_auth(
            "/api/v1/sos?status=cancelled",
            &app.token(admin),
        ))
        .await;

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], id);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_second_claim_conflicts() {
    let app = TestApp::new();
    let driver = app.requester();
    let (first, first_garage) = app.garage_at(CASABLANCA.0, CASABLANCA.1);
    let (second, _) = app.garage_at(CASABLANCA.0, CASABLANCA.1);
    let created = create_sos(&app, driver).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = patch_sos(&app, first, &id, "assigned", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "assigned");
    assert_eq!(body["data"]["assignedGarageId"], first_garage.id.to_string());
    assert_eq!(body["message"], "SOS request assigned successfully");

    let (status, body) = patch_sos(&app, second, &id, "assigned", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_garage_cannot_resolve_another_garages_alert() {
    let app = TestApp::new();
    let driver = app.requester();
    let (owner, _) = app.garage_at(CASABLANCA.0, CASABLANCA.1);
    let (intruder, _) = app.garage_at(CASABLANCA.0, CASABLANCA.1);
    let created = create_sos(&app, driver).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    patch_sos(&app, owner, &id, "assigned", None).await;

    let (status, _) = patch_sos(&app, intruder, &id, "resolved", None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.alerts()[0].status, AlertStatus::Assigned);
}

#[tokio::test]
async fn test_resolution_awards_points() {
    let app = TestApp::new();
    let driver = app.requester();
    let (garage, _) = app.garage_at(CASABLANCA.0, CASABLANCA.1);
    let created = create_sos(&app, driver).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    patch_sos(&app, garage, &id, "assigned", None).await;

    let (status, body) = patch_sos(&app, garage, &id, "resolved", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["resolvedAt"].is_string());
    assert_eq!(app.store.balance(garage.user_id), 100);
    assert_eq!(app.store.balance(driver.user_id), 20);
}

#[tokio::test]
async fn test_requester_cannot_cancel_assigned_alert() {
    let app = TestApp::new();
    let driver = app.requester();
    let (garage, _) = app.garage_at(CASABLANCA.0, CASABLANCA.1);
    let created = create_sos(&app, driver).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    patch_sos(&app, garage, &id, "assigned", None).await;

    let (status, _) = patch_sos(&app, driver, &id, "cancelled", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_assignment_to_unknown_garage_is_not_found() {
    let app = TestApp::new();
    let admin = app.admin();
    let driver = app.requester();
    let created = create_sos(&app, driver).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = patch_sos(&app, admin, &id, "assigned", Some(Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_patch_unknown_alert_is_not_found() {
    let app = TestApp::new();
    let admin = app.admin();

    let (status, _) =
        patch_sos(&app, admin, &Uuid::new_v4().to_string(), "resolved", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_without_status_is_validation_error() {
    let app = TestApp::new();
    let admin = app.admin();

    let (status, _) = app
        .send(json_request(
            Method::PATCH,
            SOS_URI,
            json!({ "sosId": Uuid::new_v4() }),
            Some(&app.token(admin)),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
