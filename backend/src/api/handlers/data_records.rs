//! Inspection data record handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use super::inspections::INSPECTORS;
use crate::api::dto::{AppJson, ItemsResponse, VersionedRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::inspection::{DataRecord, DataRecordChanges, DataRecordFields};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_data_records).post(create_data_record))
        .route("/:id", get(get_data_record).put(update_data_record))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDataRecordsQuery {
    pub inspection_id: i64,
}

#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/data-records",
    tag = "data_records",
    params(ListDataRecordsQuery),
    responses((status = 200, description = "Data records of the inspection", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_data_records(
    State(state): State<SharedState>,
    Query(query): Query<ListDataRecordsQuery>,
) -> Result<Json<ItemsResponse<DataRecord>>> {
    let items = state
        .entity_service::<DataRecordFields>()
        .list_by_parent(query.inspection_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/data-records",
    tag = "data_records",
    request_body = DataRecordFields,
    responses(
        (status = 200, description = "Data record created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_data_record(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<DataRecordFields>,
) -> Result<Json<DataRecord>> {
    auth.require_role(INSPECTORS)?;
    let record = state
        .entity_service::<DataRecordFields>()
        .create(payload, auth.actor())
        .await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/data-records",
    tag = "data_records",
    params(("id" = i64, Path, description = "Data record ID")),
    responses(
        (status = 200, description = "Data record", body = Object),
        (status = 404, description = "Data record not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_data_record(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<DataRecord>> {
    Ok(Json(state.entity_service::<DataRecordFields>().get(id).await?))
}

/// Update the field data collected during an inspection
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/data-records",
    tag = "data_records",
    params(("id" = i64, Path, description = "Data record ID")),
    request_body(content = DataRecordChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated data record", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Data record not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_data_record(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<DataRecordChanges>>,
) -> Result<Json<DataRecord>> {
    let version = payload.version()?;
    auth.require_role(INSPECTORS)?;

    let record = state
        .entity_service::<DataRecordFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(record))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_data_records, create_data_record, get_data_record, update_data_record),
    components(schemas(DataRecordFields, DataRecordChanges))
)]
pub struct DataRecordsApiDoc;
