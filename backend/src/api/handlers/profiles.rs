//! Role profile handlers for farmers, auditors, committee members and admins.
//!
//! Every profile belongs to one user account (`user_id`). Farmers may
//! register themselves; the other profiles are created by admins. Updates
//! are limited to the profile owner or an admin.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use utoipa::OpenApi;

use crate::api::dto::{AppJson, VersionedRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::entity::{EntityFields, VersionedEntity};
use crate::models::profile::{
    Admin, AdminChanges, AdminFields, Auditor, AuditorFields, Committee, CommitteeFields, Farmer,
    FarmerChanges, FarmerFields, StaffProfileChanges,
};
use crate::models::role::Role;

pub fn farmers_router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_farmer))
        .route("/:id", get(get_farmer).put(update_farmer))
}

pub fn auditors_router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_auditor))
        .route("/:id", get(get_auditor).put(update_auditor))
}

pub fn committees_router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_committee))
        .route("/:id", get(get_committee).put(update_committee))
}

pub fn admins_router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_admin))
        .route("/:id", get(get_admin).put(update_admin))
}

async fn update_owned<F: EntityFields>(
    state: &SharedState,
    auth: &AuthExtension,
    id: i64,
    payload: VersionedRequest<F::Changes>,
) -> Result<VersionedEntity<F>> {
    let version = payload.version()?;
    let service = state.entity_service::<F>();
    if !auth.is_admin() {
        // parent_id of a profile is its user account
        let current = service.get(id).await?;
        auth.require_owner_or_admin(current.fields.parent_id())?;
    }
    service
        .update(id, &payload.changes, version, auth.actor())
        .await
}

async fn create_as_admin<F: EntityFields>(
    state: &SharedState,
    auth: &AuthExtension,
    fields: F,
) -> Result<VersionedEntity<F>> {
    auth.require_role(&[Role::Admin])?;
    state.entity_service::<F>().create(fields, auth.actor()).await
}

// ---------------------------------------------------------------------------
// Farmers
// ---------------------------------------------------------------------------

/// Register a farmer profile
///
/// A farmer may register their own account; admins may register anyone.
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/farmers",
    tag = "profiles",
    request_body = FarmerFields,
    responses(
        (status = 200, description = "Farmer created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Registering someone else's account"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_farmer(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<FarmerFields>,
) -> Result<Json<Farmer>> {
    auth.require_role(&[Role::Farmer, Role::Admin])?;
    auth.require_owner_or_admin(payload.user_id)?;

    let farmer = state
        .entity_service::<FarmerFields>()
        .create(payload, auth.actor())
        .await?;
    Ok(Json(farmer))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/farmers",
    tag = "profiles",
    params(("id" = i64, Path, description = "Farmer ID")),
    responses(
        (status = 200, description = "Farmer", body = Object),
        (status = 404, description = "Farmer not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_farmer(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Farmer>> {
    Ok(Json(state.entity_service::<FarmerFields>().get(id).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/farmers",
    tag = "profiles",
    params(("id" = i64, Path, description = "Farmer ID")),
    request_body(content = FarmerChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated farmer", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Farmer not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_farmer(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<FarmerChanges>>,
) -> Result<Json<Farmer>> {
    Ok(Json(update_owned::<FarmerFields>(&state, &auth, id, payload).await?))
}

// ---------------------------------------------------------------------------
// Auditors
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/auditors",
    tag = "profiles",
    request_body = AuditorFields,
    responses(
        (status = 200, description = "Auditor created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_auditor(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<AuditorFields>,
) -> Result<Json<Auditor>> {
    Ok(Json(create_as_admin(&state, &auth, payload).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/auditors",
    tag = "profiles",
    params(("id" = i64, Path, description = "Auditor ID")),
    responses(
        (status = 200, description = "Auditor", body = Object),
        (status = 404, description = "Auditor not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_auditor(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Auditor>> {
    Ok(Json(state.entity_service::<AuditorFields>().get(id).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/auditors",
    tag = "profiles",
    params(("id" = i64, Path, description = "Auditor ID")),
    request_body(content = StaffProfileChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated auditor", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Auditor not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_auditor(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<StaffProfileChanges>>,
) -> Result<Json<Auditor>> {
    Ok(Json(update_owned::<AuditorFields>(&state, &auth, id, payload).await?))
}

// ---------------------------------------------------------------------------
// Committee members
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/committees",
    tag = "profiles",
    request_body = CommitteeFields,
    responses(
        (status = 200, description = "Committee member created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_committee(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<CommitteeFields>,
) -> Result<Json<Committee>> {
    Ok(Json(create_as_admin(&state, &auth, payload).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/committees",
    tag = "profiles",
    params(("id" = i64, Path, description = "Committee member ID")),
    responses(
        (status = 200, description = "Committee member", body = Object),
        (status = 404, description = "Committee member not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_committee(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Committee>> {
    Ok(Json(state.entity_service::<CommitteeFields>().get(id).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/committees",
    tag = "profiles",
    params(("id" = i64, Path, description = "Committee member ID")),
    request_body(content = StaffProfileChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated committee member", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Committee member not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_committee(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<StaffProfileChanges>>,
) -> Result<Json<Committee>> {
    Ok(Json(update_owned::<CommitteeFields>(&state, &auth, id, payload).await?))
}

// ---------------------------------------------------------------------------
// Admins
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/admins",
    tag = "profiles",
    request_body = AdminFields,
    responses(
        (status = 200, description = "Admin profile created at version 0", body = Object),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_admin(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    AppJson(payload): AppJson<AdminFields>,
) -> Result<Json<Admin>> {
    Ok(Json(create_as_admin(&state, &auth, payload).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/admins",
    tag = "profiles",
    params(("id" = i64, Path, description = "Admin profile ID")),
    responses(
        (status = 200, description = "Admin profile", body = Object),
        (status = 404, description = "Admin profile not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_admin(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Admin>> {
    Ok(Json(state.entity_service::<AdminFields>().get(id).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/admins",
    tag = "profiles",
    params(("id" = i64, Path, description = "Admin profile ID")),
    request_body(content = AdminChanges, description = "Changed fields plus the `version` last read"),
    responses(
        (status = 200, description = "Updated admin profile", body = Object),
        (status = 400, description = "Missing version or invalid fields", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Admin profile not found", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::error::OptimisticLockBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_admin(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VersionedRequest<AdminChanges>>,
) -> Result<Json<Admin>> {
    Ok(Json(update_owned::<AdminFields>(&state, &auth, id, payload).await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_farmer,
        get_farmer,
        update_farmer,
        create_auditor,
        get_auditor,
        update_auditor,
        create_committee,
        get_committee,
        update_committee,
        create_admin,
        get_admin,
        update_admin
    ),
    components(schemas(
        FarmerFields,
        FarmerChanges,
        AuditorFields,
        CommitteeFields,
        StaffProfileChanges,
        AdminFields,
        AdminChanges
    ))
)]
pub struct ProfilesApiDoc;
