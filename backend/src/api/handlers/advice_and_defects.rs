//! Advice and defect handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use super::inspections::INSPECTORS;
use crate::api::dto::{AppJson, require_version, ItemsResponse, VersionQuery, VersionedRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::inspection::{AdviceAndDefect, AdviceAndDefectChanges, AdviceAndDefectFields};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_advice).post(create_advice))
        .route(
            "/:id",
            get(get_advice).put(update_advice).delete(delete_advice),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAdviceQuery {
    pub inspection_id: i64,
}

#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/advice-and-defects",
    tag = "advice_and_defects",
    params(ListAdviceQuery),
    responses((status = 200, description = "Advice and defect notes of the inspection", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_advice(
    State(state): State<SharedState>,
    Query(query): Query<ListAdviceQuery>,
) -> Result<Json<ItemsResponse<AdviceAndDefect>>> {
    let items = state
        .entity_service::<AdviceAndDefectFields>()
        .list_by_parent(query.inspection_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/advice-and-defects",
    tag = "advice_and_defects",
    request_body = AdviceAndDefectFields,
    responses(
        (status = 200, description = "Created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_advice(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<AdviceAndDefectFields>,
) -> Result<Json<AdviceAndDefect>> {
    auth.require_role(INSPECTORS)?;
    let advice = state
        .entity_service::<AdviceAndDefectFields>()
        .create(payload, auth.actor())
        .await?;
    Ok(Json(advice))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/advice-and-defects",
    tag = "advice_and_defects",
    params(("id" = i64, Path, description = "Advice and defect ID")),
    responses(
        (status = 200, description = "Advice and defect notes", body = Object),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_advice(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<AdviceAndDefect>> {
    Ok(Json(state.entity_service::<AdviceAndDefectFields>().get(id).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/advice-and-defects",
    tag = "advice_and_defects",
    params(("id" = i64, Path, description = "Advice and defect ID")),
    request_body(content = AdviceAndDefectChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated notes", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_advice(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<AdviceAndDefectChanges>>,
) -> Result<Json<AdviceAndDefect>> {
    let version = payload.version()?;
    auth.require_role(INSPECTORS)?;

    let advice = state
        .entity_service::<AdviceAndDefectFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(advice))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/advice-and-defects",
    tag = "advice_and_defects",
    params(("id" = i64, Path, description = "Advice and defect ID"), VersionQuery),
    responses(
        (status = 200, description = "Deleted notes", body = Object),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_advice(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<AdviceAndDefect>> {
    let version = require_version(query.version)?;
    auth.require_role(INSPECTORS)?;

    let advice = state
        .entity_service::<AdviceAndDefectFields>()
        .delete(id, version, auth.actor())
        .await?;
    Ok(Json(advice))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_advice, create_advice, get_advice, update_advice, delete_advice),
    components(schemas(AdviceAndDefectFields, AdviceAndDefectChanges))
)]
pub struct AdviceAndDefectsApiDoc;
