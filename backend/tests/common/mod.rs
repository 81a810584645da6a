//! Common test utilities for backend integration tests
//!
//! - A full router over a fresh in-memory store
//! - Bearer tokens for each role
//! - JSON request helpers driving the router with `oneshot`

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use rubber_cert_backend::api::routes::create_router;
use rubber_cert_backend::api::{AppState, SharedState};
use rubber_cert_backend::config::Config;
use rubber_cert_backend::models::role::Role;

pub const TEST_JWT_SECRET: &str = "test-secret-at-least-32-bytes-long-for-testing";

/// Test application: shared state plus the router built on it.
pub struct TestApp {
    pub state: SharedState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::for_memory_store(TEST_JWT_SECRET))
    }

    pub fn with_config(config: Config) -> Self {
        let state = Arc::new(AppState::in_memory(config));
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// Access token for `user_id` acting as `role`.
    pub fn token(&self, user_id: i64, role: Role) -> String {
        self.state
            .auth_service
            .generate_access_token(user_id, &format!("{}-{}", role, user_id), role)
            .expect("token generation")
    }

    pub fn admin_token(&self) -> String {
        self.token(1, Role::Admin)
    }

    pub fn auditor_token(&self) -> String {
        self.token(2, Role::Auditor)
    }

    pub fn committee_token(&self) -> String {
        self.token(3, Role::Committee)
    }

    /// Send a request and decode the JSON response (`Null` for empty bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Audit entries for one record, newest first.
    pub async fn history(&self, table: &str, record_id: i64) -> Vec<Value> {
        let (status, body) = self
            .get(
                &format!("/api/v1/audit-logs/{}/{}", table, record_id),
                &self.admin_token(),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "history lookup failed: {body}");
        body["items"].as_array().cloned().unwrap_or_default()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
