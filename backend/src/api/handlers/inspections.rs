//! Inspection handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use crate::api::dto::{AppJson, ItemsResponse, VersionedRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::inspection::{
    Inspection, InspectionChanges, InspectionFields, InspectionResult, InspectionStatus,
};
use crate::models::role::Role;
use crate::services::inspection_service::ScheduleInspectionRequest;

pub(crate) const INSPECTORS: &[Role] = &[Role::Auditor, Role::Admin];

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_inspections).post(schedule_inspection))
        .route("/:id", get(get_inspection).put(update_inspection))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListInspectionsQuery {
    pub rubber_farm_id: i64,
}

/// List inspections of a farm
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/inspections",
    tag = "inspections",
    params(ListInspectionsQuery),
    responses((status = 200, description = "Inspections of the farm", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_inspections(
    State(state): State<SharedState>,
    Query(query): Query<ListInspectionsQuery>,
) -> Result<Json<ItemsResponse<Inspection>>> {
    let items = state
        .entity_service::<InspectionFields>()
        .list_by_parent(query.rubber_farm_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

/// Schedule an inspection
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/inspections",
    tag = "inspections",
    request_body = ScheduleInspectionRequest,
    responses(
        (status = 200, description = "Pending inspection created", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn schedule_inspection(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<ScheduleInspectionRequest>,
) -> Result<Json<Inspection>> {
    auth.require_role(INSPECTORS)?;
    let inspection = state
        .inspection_service()
        .schedule(payload, auth.actor())
        .await?;
    Ok(Json(inspection))
}

/// Get an inspection
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/inspections",
    tag = "inspections",
    params(("id" = i64, Path, description = "Inspection ID")),
    responses(
        (status = 200, description = "Inspection", body = Object),
        (status = 404, description = "Inspection not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_inspection(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Inspection>> {
    Ok(Json(state.entity_service::<InspectionFields>().get(id).await?))
}

/// Update an inspection's schedule, status or result
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/inspections",
    tag = "inspections",
    params(("id" = i64, Path, description = "Inspection ID")),
    request_body(content = InspectionChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated inspection", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Inspection not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_inspection(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<InspectionChanges>>,
) -> Result<Json<Inspection>> {
    let version = payload.version()?;
    auth.require_role(INSPECTORS)?;

    let inspection = state
        .entity_service::<InspectionFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(inspection))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_inspections, schedule_inspection, get_inspection, update_inspection),
    components(schemas(
        ScheduleInspectionRequest,
        InspectionChanges,
        InspectionStatus,
        InspectionResult
    ))
)]
pub struct InspectionsApiDoc;
