//! Certificate lifecycle over HTTP: issue, revoke and cancellation requests.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::fixtures::{conclude_inspection, seed_tree, InspectionTree};
use common::TestApp;
use rubber_cert_backend::models::inspection::InspectionResult;
use rubber_cert_backend::models::role::Role;

const FARMER_USER: i64 = 10;

async fn passed_tree(app: &TestApp) -> InspectionTree {
    let tree = seed_tree(&app.state, FARMER_USER, 0).await;
    conclude_inspection(&app.state, &tree.inspection, InspectionResult::Passed).await;
    tree
}

async fn issue(app: &TestApp, inspection_id: i64) -> (StatusCode, Value) {
    app.post(
        "/api/v1/certificates",
        &app.committee_token(),
        json!({
            "inspection_id": inspection_id,
            "pdf_file_url": "https://files.example.com/certs/1.pdf",
            "effective_date": "2025-04-01",
            "expiry_date": "2027-03-31",
        }),
    )
    .await
}

#[tokio::test]
async fn test_issue_for_passed_inspection() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;

    let (status, body) = issue(&app, tree.inspection.id).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["version"], 0);
    assert_eq!(body["active"], true);
    assert_eq!(body["cancel_request_flag"], false);
    assert_eq!(body["effective_date"], "2025-04-01");

    // A second active certificate for the same inspection is refused
    let (status, _) = issue(&app, tree.inspection.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_rejected_unless_passed() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, FARMER_USER, 0).await;

    let (status, body) = issue(&app, tree.inspection.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = issue(&app, 999999).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    conclude_inspection(&app.state, &tree.inspection, InspectionResult::Failed).await;
    let (status, _) = issue(&app, tree.inspection.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_rejects_inverted_validity_window() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;

    let (status, _) = app
        .post(
            "/api/v1/certificates",
            &app.committee_token(),
            json!({
                "inspection_id": tree.inspection.id,
                "effective_date": "2027-01-01",
                "expiry_date": "2025-01-01",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_requires_committee_or_admin() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;

    let (status, _) = app
        .post(
            "/api/v1/certificates",
            &app.auditor_token(),
            json!({
                "inspection_id": tree.inspection.id,
                "effective_date": "2025-04-01",
                "expiry_date": "2027-03-31",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_revoke_is_version_checked() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;
    let (_, cert) = issue(&app, tree.inspection.id).await;
    let uri = format!("/api/v1/certificates/{}/revoke", cert["id"]);
    let token = app.committee_token();

    let (status, _) = app.post(&uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&uri, &token, json!({ "version": 5 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["entityName"], "certificate");
    assert_eq!(body["actualVersion"], 0);

    let (status, body) = app.post(&uri, &token, json!({ "version": 0 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
    assert_eq!(body["version"], 1);

    // Already revoked
    let (status, _) = app.post(&uri, &token, json!({ "version": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // With the old one revoked a new certificate can be issued
    let (status, _) = issue(&app, tree.inspection.id).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_requests_cancellation() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;
    let (_, cert) = issue(&app, tree.inspection.id).await;
    let uri = format!("/api/v1/certificates/{}/cancel-request", cert["id"]);

    // Another farmer may not ask
    let (status, _) = app
        .post(
            &uri,
            &app.token(77, Role::Farmer),
            json!({ "version": 0, "cancel_request_detail": "not mine" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let owner = app.token(FARMER_USER, Role::Farmer);
    let (status, _) = app
        .post(&uri, &owner, json!({ "version": 0, "cancel_request_detail": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            &uri,
            &owner,
            json!({ "version": 0, "cancel_request_detail": "Farm sold" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["cancel_request_flag"], true);
    assert_eq!(body["cancel_request_detail"], "Farm sold");
    assert_eq!(body["active"], true);
    assert_eq!(body["version"], 1);

    // Revocation closes the request
    let (status, body) = app
        .post(
            &format!("/api/v1/certificates/{}/revoke", cert["id"]),
            &app.committee_token(),
            json!({ "version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancel_request_flag"], false);
}

#[tokio::test]
async fn test_certificate_listing_by_inspection() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;
    issue(&app, tree.inspection.id).await;

    let (status, body) = app
        .get(
            &format!("/api/v1/certificates?inspection_id={}", tree.inspection.id),
            &app.token(FARMER_USER, Role::Farmer),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_plain_edit_cannot_reactivate_revoked_certificate() {
    let app = TestApp::new();
    let tree = passed_tree(&app).await;
    let token = app.committee_token();

    let (_, first) = issue(&app, tree.inspection.id).await;
    let (status, _) = app
        .post(
            &format!("/api/v1/certificates/{}/revoke", first["id"]),
            &token,
            json!({ "version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = issue(&app, tree.inspection.id).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/certificates/{}", first["id"]);
    let (status, body) = app
        .put(&uri, &token, json!({ "active": true, "version": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");

    // Alongside a real edit the flag is dropped, not applied
    let (status, body) = app
        .put(
            &uri,
            &token,
            json!({ "active": true, "pdf_file_url": "https://files.example.com/v2.pdf", "version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (_, listed) = app
        .get(
            &format!("/api/v1/certificates?inspection_id={}", tree.inspection.id),
            &token,
        )
        .await;
    let active: Vec<_> = listed["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
}
