//! Audit logging service.
//!
//! Records every create, update and delete of a versioned entity as an
//! append-only history entry. Recording is best-effort: a failed write is
//! logged and swallowed so it can never fail the mutation that triggered it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, AuditLogEntry, AuditQuery, NewAuditEntry};
use crate::models::entity::VOLATILE_COLUMNS;
use crate::models::{EntityKind, EntityRow};
use crate::storage::AuditStore;

/// Page size used by the per-user, per-action and date-range helpers.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Snapshot of a row as stored in the audit log: volatile timestamps and
/// the kind's large geometry columns removed.
pub fn audit_snapshot(kind: EntityKind, row: &EntityRow) -> Value {
    let excluded = kind.audit_excluded();
    let snapshot: EntityRow = row
        .iter()
        .filter(|(k, _)| !VOLATILE_COLUMNS.contains(&k.as_str()) && !excluded.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(snapshot)
}

/// Fields of `new` whose value differs from `old`. Both are snapshots, so
/// the result always includes `version` after a successful update.
pub fn changed_fields(old: &Value, new: &Value) -> Value {
    let (Some(old), Some(new)) = (old.as_object(), new.as_object()) else {
        return new.clone();
    };

    let diff: EntityRow = new
        .iter()
        .filter(|(k, v)| old.get(k.as_str()) != Some(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(diff)
}

/// Audit service
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Append an entry. Returns `None` when the entry is invalid or the
    /// store rejects it; the failure is logged, never propagated.
    pub async fn log_action(
        &self,
        table_name: &str,
        action: AuditAction,
        record_id: i64,
        user_id: Option<i64>,
        old_data: Option<Value>,
        new_data: Option<Value>,
    ) -> Option<AuditLogEntry> {
        if table_name.trim().is_empty() {
            tracing::warn!(%action, record_id, "Audit entry rejected: empty table name");
            return None;
        }
        if record_id <= 0 {
            tracing::warn!(table = table_name, %action, record_id, "Audit entry rejected: invalid record id");
            return None;
        }

        let entry = NewAuditEntry {
            table_name: table_name.to_string(),
            action,
            record_id,
            user_id,
            old_data,
            new_data,
        };

        match self.store.append(entry).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!(
                    table = table_name,
                    %action,
                    record_id,
                    error = %e,
                    "Failed to write audit log entry"
                );
                None
            }
        }
    }

    pub async fn record_create(
        &self,
        kind: EntityKind,
        record_id: i64,
        user_id: Option<i64>,
        row: &EntityRow,
    ) -> Option<AuditLogEntry> {
        self.log_action(
            kind.table(),
            AuditAction::Create,
            record_id,
            user_id,
            None,
            Some(audit_snapshot(kind, row)),
        )
        .await
    }

    /// `old_data` is the full pre-update snapshot; `new_data` holds only
    /// the fields the update changed, including the new version.
    pub async fn record_update(
        &self,
        kind: EntityKind,
        record_id: i64,
        user_id: Option<i64>,
        old_row: &EntityRow,
        new_row: &EntityRow,
    ) -> Option<AuditLogEntry> {
        let old = audit_snapshot(kind, old_row);
        let new = changed_fields(&old, &audit_snapshot(kind, new_row));
        self.log_action(
            kind.table(),
            AuditAction::Update,
            record_id,
            user_id,
            Some(old),
            Some(new),
        )
        .await
    }

    pub async fn record_delete(
        &self,
        kind: EntityKind,
        record_id: i64,
        user_id: Option<i64>,
        old_row: &EntityRow,
    ) -> Option<AuditLogEntry> {
        self.log_action(
            kind.table(),
            AuditAction::Delete,
            record_id,
            user_id,
            Some(audit_snapshot(kind, old_row)),
            None,
        )
        .await
    }

    /// Query audit logs, newest first.
    pub async fn query(&self, query: &AuditQuery) -> Result<(Vec<AuditLogEntry>, i64)> {
        if query.limit <= 0 {
            return Err(AppError::Validation("limit must be positive".into()));
        }
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::Validation("'from' must not be after 'to'".into()));
            }
        }
        self.store.query(query).await
    }

    /// Full history of one record, newest first.
    pub async fn history(&self, table_name: &str, record_id: i64) -> Result<Vec<AuditLogEntry>> {
        let (entries, _) = self
            .query(&AuditQuery {
                table_name: Some(table_name.to_string()),
                record_id: Some(record_id),
                limit: i64::MAX,
                ..Default::default()
            })
            .await?;
        Ok(entries)
    }

    pub async fn by_user(&self, user_id: i64, limit: i64) -> Result<Vec<AuditLogEntry>> {
        let (entries, _) = self
            .query(&AuditQuery {
                user_id: Some(user_id),
                limit,
                ..Default::default()
            })
            .await?;
        Ok(entries)
    }

    pub async fn by_action(&self, action: AuditAction, limit: i64) -> Result<Vec<AuditLogEntry>> {
        let (entries, _) = self
            .query(&AuditQuery {
                action: Some(action),
                limit,
                ..Default::default()
            })
            .await?;
        Ok(entries)
    }

    pub async fn by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>> {
        let (entries, _) = self
            .query(&AuditQuery {
                from: Some(from),
                to: Some(to),
                limit,
                ..Default::default()
            })
            .await?;
        Ok(entries)
    }

    /// Purge entries created before `cutoff`.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let removed = self.store.delete_older_than(cutoff).await?;
        tracing::info!(%cutoff, removed, "Purged audit log entries by age");
        Ok(removed)
    }

    /// Purge entries older than `retention_days` days.
    pub async fn cleanup(&self, retention_days: i64) -> Result<u64> {
        if retention_days < 0 {
            return Err(AppError::Validation(
                "retention days must not be negative".into(),
            ));
        }
        self.delete_older_than(Utc::now() - Duration::days(retention_days))
            .await
    }

    pub async fn delete_by_table_and_record(&self, table_name: &str, record_id: i64) -> Result<u64> {
        let removed = self
            .store
            .delete_by_table_and_record(table_name, record_id)
            .await?;
        tracing::info!(table = table_name, record_id, removed, "Purged audit history of record");
        Ok(removed)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let removed = self.store.delete_all().await?;
        tracing::warn!(removed, "Audit log wiped");
        Ok(removed)
    }
}
