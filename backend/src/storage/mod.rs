//! Record and audit stores.
//!
//! Services only see these traits. `PgStore` is the production backend;
//! `MemoryStore` backs tests and `STORE_BACKEND=memory` deployments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditLogEntry, AuditQuery, NewAuditEntry};
use crate::models::{EntityKind, EntityRow};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for versioned entity rows.
///
/// Rows are column maps; the store owns `id`, `version`, `created_at` and
/// `updated_at` and never accepts them from callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row with `version = 0` and return it as stored.
    async fn insert(&self, kind: EntityKind, fields: EntityRow) -> Result<EntityRow>;

    async fn find(&self, kind: EntityKind, id: i64) -> Result<Option<EntityRow>>;

    /// Rows whose parent column equals `parent_id`, ordered by id.
    async fn list_by_parent(&self, kind: EntityKind, parent_id: i64) -> Result<Vec<EntityRow>>;

    /// Apply `changes` only if the stored version equals `expected_version`,
    /// bumping `version` by one and refreshing `updated_at` in the same
    /// atomic step. Returns the updated row, or `None` when no row matched.
    async fn conditional_update(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
        changes: &EntityRow,
    ) -> Result<Option<EntityRow>>;

    /// Current version of a row, `None` if it does not exist.
    async fn current_version(&self, kind: EntityKind, id: i64) -> Result<Option<i32>>;

    /// Delete the row only if its version equals `expected_version`.
    /// Returns the deleted row, or `None` when no row matched.
    async fn conditional_delete(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
    ) -> Result<Option<EntityRow>>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}

/// Append-only persistence for audit log entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry>;

    /// Matching entries newest first, paged, with the unpaged total.
    async fn query(&self, query: &AuditQuery) -> Result<(Vec<AuditLogEntry>, i64)>;

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn delete_by_table_and_record(&self, table_name: &str, record_id: i64) -> Result<u64>;

    async fn delete_all(&self) -> Result<u64>;
}

/// Unwrap a JSON object returned by the store into a row.
pub(crate) fn into_row(kind: EntityKind, value: serde_json::Value) -> Result<EntityRow> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "{} row is not a JSON object: {}",
            kind, other
        ))),
    }
}
