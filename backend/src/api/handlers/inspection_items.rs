//! Inspection item handlers, including bulk evaluation.

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
use crate::models::inspection::{InspectionItem, InspectionItemChanges, InspectionItemFields};
use crate::services::evaluation_service::{BulkUpdateError, BulkUpdateResult};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/evaluations", put(evaluate_items))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListItemsQuery {
    pub inspection_id: i64,
}

/// List the items of an inspection
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/inspection-items",
    tag = "inspection_items",
    params(ListItemsQuery),
    responses((status = 200, description = "Items of the inspection", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_items(
    State(state): State<SharedState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ItemsResponse<InspectionItem>>> {
    let items = state
        .entity_service::<InspectionItemFields>()
        .list_by_parent(query.inspection_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

/// Add an item to an inspection
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/inspection-items",
    tag = "inspection_items",
    request_body = InspectionItemFields,
    responses(
        (status = 200, description = "Item created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_item(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<InspectionItemFields>,
) -> Result<Json<InspectionItem>> {
    auth.require_role(INSPECTORS)?;
    let item = state
        .entity_service::<InspectionItemFields>()
        .create(payload, auth.actor())
        .await?;
    Ok(Json(item))
}

/// Get an inspection item
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/inspection-items",
    tag = "inspection_items",
    params(("id" = i64, Path, description = "Inspection item ID")),
    responses(
        (status = 200, description = "Inspection item", body = Object),
        (status = 404, description = "Item not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<InspectionItem>> {
    Ok(Json(state.entity_service::<InspectionItemFields>().get(id).await?))
}

/// Record the result of an inspection item
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/inspection-items",
    tag = "inspection_items",
    params(("id" = i64, Path, description = "Inspection item ID")),
    request_body(content = InspectionItemChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated item", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<InspectionItemChanges>>,
) -> Result<Json<InspectionItem>> {
    let version = payload.version()?;
    auth.require_role(INSPECTORS)?;

    let item = state
        .entity_service::<InspectionItemFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(item))
}

/// Remove an inspection item
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/inspection-items",
    tag = "inspection_items",
    params(("id" = i64, Path, description = "Inspection item ID"), VersionQuery),
    responses(
        (status = 200, description = "Deleted item", body = Object),
        (status = 404, description = "Item not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_item(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<InspectionItem>> {
    let version = require_version(query.version)?;
    auth.require_role(INSPECTORS)?;

    let item = state
        .entity_service::<InspectionItemFields>()
        .delete(id, version, auth.actor())
        .await?;
    Ok(Json(item))
}

/// Submit results for many inspection items at once
///
/// Each entry is `{ "inspection_item_id", "version", ...fields }`; the id may also be
/// sent as `inspectionItemId` or `id`. Entries succeed or fail independently; the response
/// is 200 either way.
#[utoipa::path(
    put,
    path = "/evaluations",
    context_path = "/api/v1/inspection-items",
    tag = "inspection_items",
    request_body(content = Vec<Object>, description = "Array of item id, version and changed fields"),
    responses(
        (status = 200, description = "Per-entry outcome", body = BulkUpdateResult),
        (status = 400, description = "Empty batch", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn evaluate_items(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(entries): AppJson<Vec<serde_json::Value>>,
) -> Result<Json<BulkUpdateResult>> {
    auth.require_role(INSPECTORS)?;
    let result = state
        .evaluation_service::<InspectionItemFields>()
        .apply(entries, auth.actor())
        .await?;
    Ok(Json(result))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_items, create_item, get_item, update_item, delete_item, evaluate_items),
    components(schemas(
        InspectionItemFields,
        InspectionItemChanges,
        BulkUpdateResult,
        BulkUpdateError
    ))
)]
pub struct InspectionItemsApiDoc;
