//! Bulk evaluation endpoints: entries succeed or fail independently.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::fixtures::{seed_item, seed_tree};
use common::TestApp;

#[tokio::test]
async fn test_one_stale_entry_does_not_block_the_rest() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 5).await;
    let token = app.auditor_token();
    let stale_id = tree.requirements[2].id;

    // Someone else already evaluated the third requirement
    let (status, _) = app
        .put(
            &format!("/api/v1/requirements/{}", stale_id),
            &token,
            json!({ "evaluation_result": "ไม่ใช่", "version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let entries: Vec<_> = tree
        .requirements
        .iter()
        .map(|r| {
            json!({
                "requirement_id": r.id,
                "version": 0,
                "evaluation_result": "ใช่",
                "note": format!("bulk {}", r.fields.requirement_no),
            })
        })
        .collect();

    let (status, body) = app
        .put("/api/v1/requirements/evaluations", &token, json!(entries))
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = body["updated"].as_array().unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(updated.len(), 4);
    assert_eq!(errors.len(), 1);
    assert!(updated.iter().all(|r| r["version"] == 1));

    let error = &errors[0];
    assert_eq!(error["id"], stale_id);
    assert_eq!(error["status"], 409);
    assert_eq!(error["error"]["error"], "OPTIMISTIC_LOCK_FAILED");
    assert_eq!(error["error"]["expectedVersion"], 0);
    assert_eq!(error["error"]["actualVersion"], 1);

    // The stale record keeps the concurrent writer's value
    let (_, current) = app
        .get(&format!("/api/v1/requirements/{}", stale_id), &token)
        .await;
    assert_eq!(current["evaluation_result"], "ไม่ใช่");
    assert_eq!(current["version"], 1);
}

#[tokio::test]
async fn test_entries_without_version_or_target_are_reported() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 1).await;
    let req = &tree.requirements[0];

    let (status, body) = app
        .put(
            "/api/v1/requirements/evaluations",
            &app.auditor_token(),
            json!([
                { "requirement_id": req.id, "evaluation_result": "ใช่" },
                { "requirement_id": 999999, "version": 0, "evaluation_result": "ใช่" },
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["updated"].as_array().unwrap().is_empty());
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors[0]["status"], 400);
    assert_eq!(errors[0]["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(errors[1]["id"], 999999);
    assert_eq!(errors[1]["status"], 404);

    let history = app.history("requirements", req.id).await;
    assert!(history.iter().all(|e| e["action"] != "UPDATE"));
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .put("/api/v1/requirements/evaluations", &app.auditor_token(), json!([]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_inspection_item_bulk_results() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 0).await;
    let second = seed_item(&app.state, tree.inspection.id, 2).await;

    let (status, body) = app
        .put(
            "/api/v1/inspection-items/evaluations",
            &app.auditor_token(),
            json!([
                { "inspection_item_id": tree.item.id, "version": 0, "inspection_item_result": "ผ่าน" },
                { "inspectionItemId": second.id, "version": 0, "inspection_item_result": "ไม่ผ่าน",
                  "other_conditions": { "tapping_panel": "ok" } },
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"].as_array().unwrap().len(), 2);
    assert!(body["errors"].as_array().unwrap().is_empty());

    let (_, item) = app
        .get(
            &format!("/api/v1/inspection-items/{}", second.id),
            &app.auditor_token(),
        )
        .await;
    assert_eq!(item["inspection_item_result"], "ไม่ผ่าน");
    assert_eq!(item["other_conditions"]["tapping_panel"], "ok");
}

#[tokio::test]
async fn test_bulk_requires_inspector_role() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 1).await;

    let (status, _) = app
        .put(
            "/api/v1/requirements/evaluations",
            &app.committee_token(),
            json!([{ "requirement_id": tree.requirements[0].id, "version": 0, "note": "x" }]),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_parent_id_key_never_targets_a_requirement() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 2).await;
    let token = app.auditor_token();
    let first = &tree.requirements[0];
    let second = &tree.requirements[1];

    // Only the parent item id: nothing to target
    let (status, body) = app
        .put(
            "/api/v1/requirements/evaluations",
            &token,
            json!([{ "inspection_item_id": first.id, "version": 0, "evaluation_result": "ใช่" }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["updated"].as_array().unwrap().is_empty());
    assert_eq!(body["errors"][0]["status"], 400);
    assert_eq!(body["errors"][0]["id"], Value::Null);
    assert!(app
        .history("requirements", first.id)
        .await
        .iter()
        .all(|e| e["action"] != "UPDATE"));

    // Both keys: the requirement's own id wins, the parent key is ignored
    let (status, body) = app
        .put(
            "/api/v1/requirements/evaluations",
            &token,
            json!([{
                "requirement_id": second.id,
                "inspection_item_id": tree.item.id,
                "version": 0,
                "evaluation_result": "ใช่",
            }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"][0]["id"], second.id);
    assert_eq!(body["updated"][0]["version"], 1);

    let (_, current) = app
        .get(&format!("/api/v1/requirements/{}", first.id), &token)
        .await;
    assert_eq!(current["version"], 0);
}

#[tokio::test]
async fn test_malformed_batch_gets_json_error_body() {
    let app = TestApp::new();
    let tree = seed_tree(&app.state, 10, 1).await;

    let (status, body) = app
        .put(
            "/api/v1/requirements/evaluations",
            &app.auditor_token(),
            json!({ "requirement_id": tree.requirements[0].id, "version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .put(
            &format!("/api/v1/requirements/{}", tree.requirements[0].id),
            &app.auditor_token(),
            json!({ "evaluation_result": "ใช่", "version": "abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
