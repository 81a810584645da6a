//! Route definitions for the API.

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use utoipa_swagger_ui::SwaggerUi;

use super::handlers;
use super::middleware::auth::{admin_middleware, auth_middleware};
use super::middleware::security_headers::security_headers_middleware;
use super::middleware::tracing::correlation_id_middleware;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    let openapi = super::openapi::build_openapi();

    Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api/v1/openapi.json", openapi))
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(correlation_id_middleware))
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: SharedState) -> Router<SharedState> {
    let auth_service = state.auth_service.clone();
    let authenticated = |router: Router<SharedState>| {
        router.layer(middleware::from_fn_with_state(
            auth_service.clone(),
            auth_middleware,
        ))
    };

    Router::new()
        .nest("/farmers", authenticated(handlers::profiles::farmers_router()))
        .nest("/auditors", authenticated(handlers::profiles::auditors_router()))
        .nest(
            "/committees",
            authenticated(handlers::profiles::committees_router()),
        )
        .nest("/admins", authenticated(handlers::profiles::admins_router()))
        .nest("/rubber-farms", authenticated(handlers::rubber_farms::router()))
        .nest("/inspections", authenticated(handlers::inspections::router()))
        .nest(
            "/inspection-items",
            authenticated(handlers::inspection_items::router()),
        )
        .nest("/requirements", authenticated(handlers::requirements::router()))
        .nest("/data-records", authenticated(handlers::data_records::router()))
        .nest(
            "/advice-and-defects",
            authenticated(handlers::advice_and_defects::router()),
        )
        .nest("/certificates", authenticated(handlers::certificates::router()))
        // Audit log routes require admin privileges
        .nest(
            "/audit-logs",
            handlers::audit_logs::router().layer(middleware::from_fn_with_state(
                state.auth_service.clone(),
                admin_middleware,
            )),
        )
}
