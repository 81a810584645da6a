//! Audit log API. Mounted behind `admin_middleware`.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::api::dto::{Pagination, PaginationQuery};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::audit_log::{AuditAction, AuditLogEntry, AuditQuery};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_audit_logs).delete(purge_audit_logs))
        .route("/all", delete(delete_all_audit_logs))
        .route(
            "/:table/:record_id",
            get(record_history).delete(delete_record_history),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAuditLogsQuery {
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub user_id: Option<i64>,
    /// CREATE, UPDATE or DELETE
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogListResponse {
    pub items: Vec<AuditLogEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditHistoryResponse {
    pub items: Vec<AuditLogEntry>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PurgeQuery {
    /// Delete entries created before this instant. Defaults to the
    /// configured retention window.
    pub older_than: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// Search the audit log, newest first
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/audit-logs",
    tag = "audit_logs",
    params(ListAuditLogsQuery),
    responses(
        (status = 200, description = "Matching entries", body = AuditLogListResponse),
        (status = 400, description = "Invalid filter", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit_logs(
    State(state): State<SharedState>,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<Json<AuditLogListResponse>> {
    let paging = PaginationQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let action = query.action.as_deref().map(AuditAction::parse).transpose()?;

    let filter = AuditQuery {
        table_name: query.table_name,
        record_id: query.record_id,
        user_id: query.user_id,
        action,
        from: query.from,
        to: query.to,
        offset: paging.offset(),
        limit: paging.per_page() as i64,
    };
    let (items, total) = state.audit_service().query(&filter).await?;

    Ok(Json(AuditLogListResponse {
        items,
        pagination: Pagination::from_query_and_total(&paging, total),
    }))
}

/// Full history of one record, newest first
#[utoipa::path(
    get,
    path = "/{table}/{record_id}",
    context_path = "/api/v1/audit-logs",
    tag = "audit_logs",
    params(
        ("table" = String, Path, description = "Table name, e.g. requirements"),
        ("record_id" = i64, Path, description = "Record ID"),
    ),
    responses(
        (status = 200, description = "Entries for the record", body = AuditHistoryResponse),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn record_history(
    State(state): State<SharedState>,
    Path((table, record_id)): Path<(String, i64)>,
) -> Result<Json<AuditHistoryResponse>> {
    let items = state.audit_service().history(&table, record_id).await?;
    Ok(Json(AuditHistoryResponse { items }))
}

/// Delete entries older than a cutoff
#[utoipa::path(
    delete,
    path = "",
    context_path = "/api/v1/audit-logs",
    tag = "audit_logs",
    params(PurgeQuery),
    responses(
        (status = 200, description = "Number of entries removed", body = DeletedResponse),
        (status = 400, description = "Negative retention window", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn purge_audit_logs(
    State(state): State<SharedState>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<DeletedResponse>> {
    let audit = state.audit_service();
    let deleted = match query.older_than {
        Some(cutoff) => audit.delete_older_than(cutoff).await?,
        None => audit.cleanup(state.config.audit_retention_days).await?,
    };
    Ok(Json(DeletedResponse { deleted }))
}

/// Delete the history of one record
#[utoipa::path(
    delete,
    path = "/{table}/{record_id}",
    context_path = "/api/v1/audit-logs",
    tag = "audit_logs",
    params(
        ("table" = String, Path, description = "Table name"),
        ("record_id" = i64, Path, description = "Record ID"),
    ),
    responses(
        (status = 200, description = "Number of entries removed", body = DeletedResponse),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_record_history(
    State(state): State<SharedState>,
    Path((table, record_id)): Path<(String, i64)>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state
        .audit_service()
        .delete_by_table_and_record(&table, record_id)
        .await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// Wipe the audit log
#[utoipa::path(
    delete,
    path = "/all",
    context_path = "/api/v1/audit-logs",
    tag = "audit_logs",
    responses(
        (status = 200, description = "Number of entries removed", body = DeletedResponse),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_all_audit_logs(
    State(state): State<SharedState>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.audit_service().delete_all().await?;
    Ok(Json(DeletedResponse { deleted }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_audit_logs,
        record_history,
        purge_audit_logs,
        delete_record_history,
        delete_all_audit_logs
    ),
    components(schemas(
        AuditLogEntry,
        AuditAction,
        AuditLogListResponse,
        AuditHistoryResponse,
        DeletedResponse,
        Pagination
    ))
)]
pub struct AuditLogsApiDoc;
