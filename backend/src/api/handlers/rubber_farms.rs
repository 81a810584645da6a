//! Rubber farm handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use crate::api::dto::{AppJson, ItemsResponse, VersionQuery, VersionedRequest, require_version};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::profile::FarmerFields;
use crate::models::role::Role;
use crate::models::rubber_farm::{RubberFarm, RubberFarmChanges, RubberFarmFields};

const WRITERS: &[Role] = &[Role::Farmer, Role::Admin];

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_farms).post(create_farm))
        .route("/:id", get(get_farm).put(update_farm).delete(delete_farm))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListFarmsQuery {
    pub farmer_id: i64,
}

/// Farmers may only touch farms registered to their own profile.
async fn ensure_farmer_owns(state: &SharedState, auth: &AuthExtension, farmer_id: i64) -> Result<()> {
    if auth.is_admin() {
        return Ok(());
    }
    let farmer = state.entity_service::<FarmerFields>().get(farmer_id).await?;
    auth.require_owner_or_admin(farmer.fields.user_id)
}

async fn ensure_farm_owner(state: &SharedState, auth: &AuthExtension, farm_id: i64) -> Result<()> {
    if auth.is_admin() {
        return Ok(());
    }
    let farm = state.entity_service::<RubberFarmFields>().get(farm_id).await?;
    ensure_farmer_owns(state, auth, farm.fields.farmer_id).await
}

/// List the farms of a farmer
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/rubber-farms",
    tag = "rubber_farms",
    params(ListFarmsQuery),
    responses((status = 200, description = "Farms of the farmer", body = Object)),
    security(("bearer_auth" = []))
)]
pub async fn list_farms(
    State(state): State<SharedState>,
    Query(query): Query<ListFarmsQuery>,
) -> Result<Json<ItemsResponse<RubberFarm>>> {
    let items = state
        .entity_service::<RubberFarmFields>()
        .list_by_parent(query.farmer_id)
        .await?;
    Ok(Json(ItemsResponse { items }))
}

/// Register a rubber farm
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/rubber-farms",
    tag = "rubber_farms",
    request_body = RubberFarmFields,
    responses(
        (status = 200, description = "Farm created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Not the farm owner"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_farm(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<RubberFarmFields>,
) -> Result<Json<RubberFarm>> {
    auth.require_role(WRITERS)?;
    ensure_farmer_owns(&state, &auth, payload.farmer_id).await?;

    let farm = state
        .entity_service::<RubberFarmFields>()
        .create(payload, auth.actor())
        .await?;
    Ok(Json(farm))
}

/// Get a rubber farm
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/rubber-farms",
    tag = "rubber_farms",
    params(("id" = i64, Path, description = "Farm ID")),
    responses(
        (status = 200, description = "Farm", body = Object),
        (status = 404, description = "Farm not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_farm(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<RubberFarm>> {
    Ok(Json(state.entity_service::<RubberFarmFields>().get(id).await?))
}

/// Update a rubber farm
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/rubber-farms",
    tag = "rubber_farms",
    params(("id" = i64, Path, description = "Farm ID")),
    request_body(content = RubberFarmChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated farm", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Farm not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_farm(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<RubberFarmChanges>>,
) -> Result<Json<RubberFarm>> {
    let version = payload.version()?;
    auth.require_role(WRITERS)?;
    ensure_farm_owner(&state, &auth, id).await?;

    let farm = state
        .entity_service::<RubberFarmFields>()
        .update(id, &payload.changes, version, auth.actor())
        .await?;
    Ok(Json(farm))
}

/// Delete a rubber farm
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/rubber-farms",
    tag = "rubber_farms",
    params(("id" = i64, Path, description = "Farm ID"), VersionQuery),
    responses(
        (status = 200, description = "Deleted farm", body = Object),
        (status = 404, description = "Farm not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_farm(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<RubberFarm>> {
    let version = require_version(query.version)?;
    auth.require_role(WRITERS)?;
    ensure_farm_owner(&state, &auth, id).await?;

    let farm = state
        .entity_service::<RubberFarmFields>()
        .delete(id, version, auth.actor())
        .await?;
    Ok(Json(farm))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_farms, create_farm, get_farm, update_farm, delete_farm),
    components(schemas(RubberFarmFields, RubberFarmChanges))
)]
pub struct RubberFarmsApiDoc;
