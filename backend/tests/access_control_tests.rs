//! Bearer token checks and per-route roles.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::fixtures::{farmer_fields, seed_farmer, seed_tree};
use common::TestApp;
use rubber_cert_backend::models::role::Role;

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::GET, "/api/v1/inspections/1", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_ERROR");

    let (status, _) = app
        .send(Method::GET, "/api/v1/inspections/1", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_farmer_cannot_evaluate() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 1).await;

    let (status, body) = app
        .put(
            &format!("/api/v1/requirements/{}", tree.requirements[0].id),
            &app.token(10, Role::Farmer),
            json!({ "evaluation_result": "ใช่", "version": 0 }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_farm_edits_limited_to_owner() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 0).await;
    let uri = format!("/api/v1/rubber-farms/{}", tree.farm.id);
    let change = json!({ "product_distribution_type": "cup lump", "version": 0 });

    let (status, _) = app.put(&uri, &app.token(11, Role::Farmer), change.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.put(&uri, &app.auditor_token(), change.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.put(&uri, &app.admin_token(), change).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product_distribution_type"], "cup lump");
}

#[tokio::test]
async fn test_farmer_registers_only_themselves() {
    let app = TestApp::new();
    let farmer = app.token(20, Role::Farmer);

    let (status, _) = app
        .post("/api/v1/farmers", &farmer, json!(farmer_fields(21)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post("/api/v1/farmers", &farmer, json!(farmer_fields(20)))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user_id"], 20);
    assert_eq!(body["version"], 0);
}

#[tokio::test]
async fn test_profile_update_owner_or_admin() {
    let app = TestApp::new();
    let farmer = seed_farmer(&app.state, 30).await;
    let uri = format!("/api/v1/farmers/{}", farmer.id);

    let (status, _) = app
        .put(
            &uri,
            &app.token(31, Role::Farmer),
            json!({ "phone_number": "0899999999", "version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &uri,
            &app.token(30, Role::Farmer),
            json!({ "phone_number": "0899999999", "version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone_number"], "0899999999");

    let (status, body) = app
        .put(
            &uri,
            &app.admin_token(),
            json!({ "zip_code": "123", "version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_staff_profiles_created_by_admin_only() {
    let app = TestApp::new();
    let auditor = json!({
        "user_id": 40,
        "name_title": "นางสาว",
        "first_name": "Malee",
        "last_name": "Suksan",
        "phone_number": null,
        "email": "malee@example.com",
    });

    let (status, _) = app
        .post("/api/v1/auditors", &app.token(40, Role::Auditor), auditor.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/v1/auditors", &app.admin_token(), auditor).await;
    assert_eq!(status, StatusCode::OK, "{created}");

    // The auditor may then edit their own profile
    let (status, body) = app
        .put(
            &format!("/api/v1/auditors/{}", created["id"]),
            &app.token(40, Role::Auditor),
            json!({ "phone_number": "021234567", "version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
}

#[tokio::test]
async fn test_audit_log_api_is_admin_only() {
    let app = TestApp::new();

    for token in [
        app.auditor_token(),
        app.committee_token(),
        app.token(10, Role::Farmer),
    ] {
        let (status, _) = app.get("/api/v1/audit-logs", &token).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = app
        .send(Method::GET, "/api/v1/audit-logs", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/audit-logs", &app.admin_token()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_correlation_id() {
    let app = TestApp::new();
    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .uri("/health")
            .header("X-Correlation-ID", "req-123")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-correlation-id"], "req-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
