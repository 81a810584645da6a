//! Requirement handlers, including bulk evaluation.

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use super::inspections::INSPECTORS;
use crate::api::dto::{AppJson, require_version, ItemsResponse, VersionQuery, VersionedRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::inspection::{Requirement, RequirementChanges, RequirementFields};
use crate::services::evaluation_service::BulkUpdateResult;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_requirements).post(create_requirement))
        .route("/evaluations", put(evaluate_requirements))
        .route(
            "/:id",
            get(get_requirement)
                .put(update_requirement)
                .delete(delete_requirement),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRequirementsQuery {
    pub inspection_item_id: i64,
}

/// List the requirements of an inspection item
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/requirements",
    tag = "requirements",
    params(ListRequirementsQuery),
    responses((status = 200, description = "Requirements of the item", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_requirements(
    State(state): State<SharedState>,
    Query(query): Query<ListRequirementsQuery>,
) -> Result<Json<ItemsResponse<Requirement>>> {
    let items = state
        .entity_service::<RequirementFields>()
        .list_by_parent(query.inspection_item_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

/// Add a requirement to an inspection item
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/requirements",
    tag = "requirements",
    request_body = RequirementFields,
    responses(
        (status = 200, description = "Requirement created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_requirement(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<RequirementFields>,
) -> Result<Json<Requirement>> {
    auth.require_role(INSPECTORS)?;
    let requirement = state
        .entity_service::<RequirementFields>()
        .create(payload, auth.actor())
        .await?;
    Ok(Json(requirement))
}

/// Get a requirement
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/requirements",
    tag = "requirements",
    params(("id" = i64, Path, description = "Requirement ID")),
    responses(
        (status = 200, description = "Requirement", body = Object),
        (status = 404, description = "Requirement not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_requirement(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Requirement>> {
    Ok(Json(state.entity_service::<RequirementFields>().get(id).await?))
}

/// Evaluate a single requirement
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/requirements",
    tag = "requirements",
    params(("id" = i64, Path, description = "Requirement ID")),
    request_body(content = RequirementChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated requirement", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Requirement not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_requirement(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<RequirementChanges>>,
) -> Result<Json<Requirement>> {
    let version = payload.version()?;
    auth.require_role(INSPECTORS)?;

    let requirement = state
        .entity_service::<RequirementFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(requirement))
}

/// Remove a requirement
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/requirements",
    tag = "requirements",
    params(("id" = i64, Path, description = "Requirement ID"), VersionQuery),
    responses(
        (status = 200, description = "Deleted requirement", body = Object),
        (status = 404, description = "Requirement not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_requirement(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<Requirement>> {
    let version = require_version(query.version)?;
    auth.require_role(INSPECTORS)?;

    let requirement = state
        .entity_service::<RequirementFields>()
        .delete(id, version, auth.actor())
        .await?;
    Ok(Json(requirement))
}

/// Submit evaluations for many requirements at once
///
/// Each entry is `{ "requirement_id", "version", ...fields }`; the id may also be
/// sent as `requirementId` or `id`. Entries succeed or fail independently; the response
/// is 200 either way.
#[utoipa::path(
    put,
    path = "/evaluations",
    context_path = "/api/v1/requirements",
    tag = "requirements",
    request_body(content = Vec<Object>, description = "Array of requirement id, version and changed fields"),
    responses(
        (status = 200, description = "Per-entry outcome", body = BulkUpdateResult),
        (status = 400, description = "Empty batch", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn evaluate_requirements(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(entries): AppJson<Vec<serde_json::Value>>,
) -> Result<Json<BulkUpdateResult>> {
    auth.require_role(INSPECTORS)?;
    let result = state
        .evaluation_service::<RequirementFields>()
        .apply(entries, auth.actor())
        .await?;
    Ok(Json(result))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_requirements,
        create_requirement,
        get_requirement,
        update_requirement,
        delete_requirement,
        evaluate_requirements
    ),
    components(schemas(RequirementFields, RequirementChanges))
)]
pub struct RequirementsApiDoc;
