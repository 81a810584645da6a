//! PostgreSQL store.
//!
//! Entity rows travel as JSONB: inputs are expanded with
//! `jsonb_populate_record(NULL::<table>, $1)` and results come back through
//! `to_jsonb(t)`. Table and column names are taken only from
//! [`EntityKind`]'s static whitelist, never from request data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{into_row, AuditStore, RecordStore};
use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, AuditLogEntry, AuditQuery, NewAuditEntry};
use crate::models::{EntityKind, EntityRow};

/// Store backed by a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

/// Column list for a write, restricted to the kind's whitelist.
fn write_columns<'a>(kind: EntityKind, row: &'a EntityRow) -> Result<Vec<&'a str>> {
    row.keys()
        .map(|k| {
            if kind.is_column(k) {
                Ok(k.as_str())
            } else {
                Err(AppError::Validation(format!(
                    "Field '{}' cannot be written on {}",
                    k, kind
                )))
            }
        })
        .collect()
}

fn insert_sql(kind: EntityKind, columns: &[&str]) -> String {
    let cols = columns.join(", ");
    format!(
        "INSERT INTO {table} AS t ({cols}) \
         SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1) \
         RETURNING to_jsonb(t)",
        table = kind.table(),
        cols = cols,
    )
}

fn conditional_update_sql(kind: EntityKind, columns: &[&str]) -> String {
    let mut assignments: Vec<String> = columns.iter().map(|c| format!("{c} = r.{c}")).collect();
    assignments.push("version = t.version + 1".to_string());
    assignments.push("updated_at = NOW()".to_string());

    format!(
        "UPDATE {table} AS t SET {set} \
         FROM jsonb_populate_record(NULL::{table}, $1) AS r \
         WHERE t.id = $2 AND t.version = $3 \
         RETURNING to_jsonb(t)",
        table = kind.table(),
        set = assignments.join(", "),
    )
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert(&self, kind: EntityKind, fields: EntityRow) -> Result<EntityRow> {
        let sql = insert_sql(kind, &write_columns(kind, &fields)?);
        let value: serde_json::Value = sqlx::query_scalar(&sql)
            .bind(serde_json::Value::Object(fields))
            .fetch_one(&self.db)
            .await?;
        into_row(kind, value)
    }

    async fn find(&self, kind: EntityKind, id: i64) -> Result<Option<EntityRow>> {
        let sql = format!("SELECT to_jsonb(t) FROM {} AS t WHERE t.id = $1", kind.table());
        let value: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        value.map(|v| into_row(kind, v)).transpose()
    }

    async fn list_by_parent(&self, kind: EntityKind, parent_id: i64) -> Result<Vec<EntityRow>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} AS t WHERE t.{} = $1 ORDER BY t.id",
            kind.table(),
            kind.parent_column()
        );
        let values: Vec<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(parent_id)
            .fetch_all(&self.db)
            .await?;
        values.into_iter().map(|v| into_row(kind, v)).collect()
    }

    async fn conditional_update(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
        changes: &EntityRow,
    ) -> Result<Option<EntityRow>> {
        let sql = conditional_update_sql(kind, &write_columns(kind, changes)?);
        let value: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(serde_json::Value::Object(changes.clone()))
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.db)
            .await?;
        value.map(|v| into_row(kind, v)).transpose()
    }

    async fn current_version(&self, kind: EntityKind, id: i64) -> Result<Option<i32>> {
        let sql = format!("SELECT version FROM {} WHERE id = $1", kind.table());
        let version: Option<i32> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(version)
    }

    async fn conditional_delete(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
    ) -> Result<Option<EntityRow>> {
        let sql = format!(
            "DELETE FROM {} AS t WHERE t.id = $1 AND t.version = $2 RETURNING to_jsonb(t)",
            kind.table()
        );
        let value: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.db)
            .await?;
        value.map(|v| into_row(kind, v)).transpose()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

/// Row type for sqlx::query_as — maps directly to the audit_logs columns.
#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: i64,
    table_name: String,
    action: String,
    record_id: i64,
    user_id: Option<i64>,
    old_data: Option<serde_json::Value>,
    new_data: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditLogRow) -> Result<Self> {
        Ok(AuditLogEntry {
            id: row.id,
            table_name: row.table_name,
            action: AuditAction::parse(&row.action)?,
            record_id: row.record_id,
            user_id: row.user_id,
            old_data: row.old_data,
            new_data: row.new_data,
            created_at: row.created_at,
        })
    }
}

const AUDIT_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR table_name = $1)
      AND ($2::bigint IS NULL OR record_id = $2)
      AND ($3::bigint IS NULL OR user_id = $3)
      AND ($4::text IS NULL OR action = $4)
      AND ($5::timestamptz IS NULL OR created_at >= $5)
      AND ($6::timestamptz IS NULL OR created_at <= $6)
"#;

#[async_trait]
impl AuditStore for PgStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        let row: AuditLogRow = sqlx::query_as(
            r#"
            INSERT INTO audit_logs (table_name, action, record_id, user_id, old_data, new_data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, table_name, action, record_id, user_id, old_data, new_data, created_at
            "#,
        )
        .bind(&entry.table_name)
        .bind(entry.action.as_str())
        .bind(entry.record_id)
        .bind(entry.user_id)
        .bind(&entry.old_data)
        .bind(&entry.new_data)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn query(&self, query: &AuditQuery) -> Result<(Vec<AuditLogEntry>, i64)> {
        let action = query.action.map(|a| a.as_str());

        let rows: Vec<AuditLogRow> = sqlx::query_as(&format!(
            r#"
            SELECT id, table_name, action, record_id, user_id, old_data, new_data, created_at
            FROM audit_logs
            {AUDIT_FILTER}
            ORDER BY created_at DESC, id DESC
            OFFSET $7
            LIMIT $8
            "#
        ))
        .bind(&query.table_name)
        .bind(query.record_id)
        .bind(query.user_id)
        .bind(action)
        .bind(query.from)
        .bind(query.to)
        .bind(query.offset)
        .bind(query.limit)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM audit_logs {AUDIT_FILTER}"))
            .bind(&query.table_name)
            .bind(query.record_id)
            .bind(query.user_id)
            .bind(action)
            .bind(query.from)
            .bind(query.to)
            .fetch_one(&self.db)
            .await?;

        let entries = rows
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((entries, total))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_table_and_record(&self, table_name: &str, record_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE table_name = $1 AND record_id = $2")
            .bind(table_name)
            .bind(record_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_logs")
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
