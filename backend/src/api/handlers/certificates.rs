//! Certificate handlers: issue, edit, revoke and cancellation requests.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::api::dto::{AppJson, require_version, ItemsResponse, VersionOnlyRequest, VersionedRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::certificate::{Certificate, CertificateChanges, CertificateFields};
use crate::models::role::Role;
use crate::services::certificate_service::IssueCertificateRequest;

const ISSUERS: &[Role] = &[Role::Committee, Role::Admin];
const CANCEL_REQUESTERS: &[Role] = &[Role::Farmer, Role::Admin];

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_certificates).post(issue_certificate))
        .route("/:id", get(get_certificate).put(update_certificate))
        .route("/:id/revoke", post(revoke_certificate))
        .route("/:id/cancel-request", post(request_cancellation))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCertificatesQuery {
    pub inspection_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub version: Option<i32>,
    pub cancel_request_detail: String,
}

/// List certificates issued for an inspection
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/certificates",
    tag = "certificates",
    params(ListCertificatesQuery),
    responses((status = 200, description = "Certificates of the inspection", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_certificates(
    State(state): State<SharedState>,
    Query(query): Query<ListCertificatesQuery>,
) -> Result<Json<ItemsResponse<Certificate>>> {
    let items = state
        .entity_service::<CertificateFields>()
        .list_by_parent(query.inspection_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

/// Issue a certificate for a passed inspection
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/certificates",
    tag = "certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 200, description = "Active certificate created", body = Object),
        (status = 400, description = "Inspection missing or not passed, or bad validity window", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Committee or admin role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn issue_certificate(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<IssueCertificateRequest>,
) -> Result<Json<Certificate>> {
    auth.require_role(ISSUERS)?;
    let certificate = state
        .certificate_service()
        .issue(payload, auth.actor())
        .await?;
    Ok(Json(certificate))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/certificates",
    tag = "certificates",
    params(("id" = i64, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate", body = Object),
        (status = 404, description = "Certificate not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_certificate(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Certificate>> {
    Ok(Json(state.entity_service::<CertificateFields>().get(id).await?))
}

/// Edit certificate details
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/certificates",
    tag = "certificates",
    params(("id" = i64, Path, description = "Certificate ID")),
    request_body(content = CertificateChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated certificate", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Certificate not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_certificate(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<CertificateChanges>>,
) -> Result<Json<Certificate>> {
    let version = payload.version()?;
    auth.require_role(ISSUERS)?;

    let certificate = state
        .entity_service::<CertificateFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(certificate))
}

/// Revoke an active certificate
#[utoipa::path(
    post,
    path = "/{id}/revoke",
    context_path = "/api/v1/certificates",
    tag = "certificates",
    params(("id" = i64, Path, description = "Certificate ID")),
    request_body = VersionOnlyRequest,
    responses(
        (status = 200, description = "Revoked certificate", body = Object),
        (status = 400, description = "Missing version or already revoked", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Certificate not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_certificate(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionOnlyRequest>,
) -> Result<Json<Certificate>> {
    let version = require_version(payload.version)?;
    auth.require_role(ISSUERS)?;

    let certificate = state
        .certificate_service()
        .revoke(id, version, auth.actor())
        .await?;
    Ok(Json(certificate))
}

/// Ask the committee to cancel a certificate
#[utoipa::path(
    post,
    path = "/{id}/cancel-request",
    context_path = "/api/v1/certificates",
    tag = "certificates",
    params(("id" = i64, Path, description = "Certificate ID")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Certificate flagged for cancellation", body = Object),
        (status = 400, description = "Missing version or reason, or certificate inactive", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Not the certificate holder"),
        (status = 404, description = "Certificate not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn request_cancellation(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<CancelRequest>,
) -> Result<Json<Certificate>> {
    let version = require_version(payload.version)?;
    auth.require_role(CANCEL_REQUESTERS)?;

    let service = state.certificate_service();
    if !auth.is_admin() {
        let owner = service.owner_user_id(id).await?;
        auth.require_owner_or_admin(owner)?;
    }

    let certificate = service
        .request_cancellation(id, version, &payload.cancel_request_detail, auth.actor())
        .await?;
    Ok(Json(certificate))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_certificates,
        issue_certificate,
        get_certificate,
        update_certificate,
        revoke_certificate,
        request_cancellation
    ),
    components(schemas(
        IssueCertificateRequest,
        CertificateFields,
        CertificateChanges,
        CancelRequest,
        VersionOnlyRequest
    ))
)]
pub struct CertificatesApiDoc;
