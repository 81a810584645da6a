//! OpenAPI specification generated from handler annotations via utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Top-level OpenAPI document for the Rubber Certification API.
///
/// Each handler module contributes its own paths and schemas via per-module
/// `#[derive(OpenApi)]` structs that are merged into this root document at
/// startup.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rubber Certification API",
        description = "Rubber farm inspection and certification records with version-checked updates and an audit trail.",
        version = "0.3.0",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "profiles", description = "Farmer, auditor, committee and admin profiles"),
        (name = "rubber_farms", description = "Registered rubber farms"),
        (name = "inspections", description = "Inspection scheduling and outcomes"),
        (name = "inspection_items", description = "Inspection items and bulk item results"),
        (name = "requirements", description = "Requirements and bulk evaluations"),
        (name = "data_records", description = "Field data collected during inspections"),
        (name = "advice_and_defects", description = "Advice and defects noted by auditors"),
        (name = "certificates", description = "Certificate issue, revocation and cancellation requests"),
        (name = "audit_logs", description = "Audit trail of every mutation (admin only)"),
        (name = "health", description = "Health and readiness checks"),
    ),
    components(schemas(
        ErrorResponse,
        crate::error::OptimisticLockBody,
        crate::models::role::Role
    ))
)]
pub struct ApiDoc;

/// Standard error response body returned by all endpoints on failure.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Adds Bearer JWT security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the merged OpenAPI document from all handler modules.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    doc.merge(super::handlers::health::HealthApiDoc::openapi());
    doc.merge(super::handlers::profiles::ProfilesApiDoc::openapi());
    doc.merge(super::handlers::rubber_farms::RubberFarmsApiDoc::openapi());
    doc.merge(super::handlers::inspections::InspectionsApiDoc::openapi());
    doc.merge(super::handlers::inspection_items::InspectionItemsApiDoc::openapi());
    doc.merge(super::handlers::requirements::RequirementsApiDoc::openapi());
    doc.merge(super::handlers::data_records::DataRecordsApiDoc::openapi());
    doc.merge(super::handlers::advice_and_defects::AdviceAndDefectsApiDoc::openapi());
    doc.merge(super::handlers::certificates::CertificatesApiDoc::openapi());
    doc.merge(super::handlers::audit_logs::AuditLogsApiDoc::openapi());

    doc
}
