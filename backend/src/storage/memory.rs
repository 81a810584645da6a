//! In-memory store.
//!
//! All tables sit behind one `RwLock`; a conditional update compares and
//! bumps the version while holding the write guard, which gives the same
//! check-and-set atomicity as the single SQL statement in `PgStore`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{AuditStore, RecordStore};
use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditLogEntry, AuditQuery, NewAuditEntry};
use crate::models::{EntityKind, EntityRow};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, EntityRow>,
}

#[derive(Default)]
struct AuditTable {
    next_id: i64,
    entries: Vec<AuditLogEntry>,
}

/// Process-local store implementing both [`RecordStore`] and [`AuditStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
    audit: RwLock<AuditTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_value() -> Value {
    json!(Utc::now())
}

fn row_version(row: &EntityRow) -> Result<i32> {
    row.get("version")
        .and_then(Value::as_i64)
        .map(|v| v as i32)
        .ok_or_else(|| AppError::Internal("stored row has no version".into()))
}

fn check_columns(kind: EntityKind, row: &EntityRow) -> Result<()> {
    match row.keys().find(|k| !kind.is_column(k)) {
        Some(bad) => Err(AppError::Validation(format!(
            "Field '{}' cannot be written on {}",
            bad, kind
        ))),
        None => Ok(()),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, kind: EntityKind, fields: EntityRow) -> Result<EntityRow> {
        check_columns(kind, &fields)?;

        let mut tables = self.tables.write().await;
        let table = tables.entry(kind).or_default();
        table.next_id += 1;
        let id = table.next_id;
        let now = now_value();

        // Unlisted columns read back as NULL, as with jsonb_populate_record.
        let mut row = EntityRow::new();
        row.insert("id".into(), json!(id));
        row.insert("version".into(), json!(0));
        row.insert("created_at".into(), now.clone());
        row.insert("updated_at".into(), now);
        for column in kind.columns() {
            row.insert((*column).to_string(), Value::Null);
        }
        row.extend(fields);

        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn find(&self, kind: EntityKind, id: i64) -> Result<Option<EntityRow>> {
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn list_by_parent(&self, kind: EntityKind, parent_id: i64) -> Result<Vec<EntityRow>> {
        let tables = self.tables.read().await;
        let parent = kind.parent_column();
        Ok(tables
            .get(&kind)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|row| row.get(parent).and_then(Value::as_i64) == Some(parent_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn conditional_update(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
        changes: &EntityRow,
    ) -> Result<Option<EntityRow>> {
        check_columns(kind, changes)?;

        let mut tables = self.tables.write().await;
        let Some(row) = tables.get_mut(&kind).and_then(|t| t.rows.get_mut(&id)) else {
            return Ok(None);
        };
        if row_version(row)? != expected_version {
            return Ok(None);
        }

        for (column, value) in changes {
            row.insert(column.clone(), value.clone());
        }
        row.insert("version".into(), json!(expected_version + 1));
        row.insert("updated_at".into(), now_value());

        Ok(Some(row.clone()))
    }

    async fn current_version(&self, kind: EntityKind, id: i64) -> Result<Option<i32>> {
        let tables = self.tables.read().await;
        tables
            .get(&kind)
            .and_then(|t| t.rows.get(&id))
            .map(row_version)
            .transpose()
    }

    async fn conditional_delete(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
    ) -> Result<Option<EntityRow>> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&kind) else {
            return Ok(None);
        };
        match table.rows.get(&id) {
            Some(row) if row_version(row)? == expected_version => Ok(table.rows.remove(&id)),
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        let mut audit = self.audit.write().await;
        audit.next_id += 1;
        let stored = AuditLogEntry {
            id: audit.next_id,
            table_name: entry.table_name,
            action: entry.action,
            record_id: entry.record_id,
            user_id: entry.user_id,
            old_data: entry.old_data,
            new_data: entry.new_data,
            created_at: Utc::now(),
        };
        audit.entries.push(stored.clone());
        Ok(stored)
    }

    async fn query(&self, query: &AuditQuery) -> Result<(Vec<AuditLogEntry>, i64)> {
        let audit = self.audit.read().await;
        let mut matching: Vec<&AuditLogEntry> =
            audit.entries.iter().filter(|e| query.matches(e)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut audit = self.audit.write().await;
        let before = audit.entries.len();
        audit.entries.retain(|e| e.created_at >= cutoff);
        Ok((before - audit.entries.len()) as u64)
    }

    async fn delete_by_table_and_record(&self, table_name: &str, record_id: i64) -> Result<u64> {
        let mut audit = self.audit.write().await;
        let before = audit.entries.len();
        audit
            .entries
            .retain(|e| !(e.table_name == table_name && e.record_id == record_id));
        Ok((before - audit.entries.len()) as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut audit = self.audit.write().await;
        let removed = audit.entries.len() as u64;
        audit.entries.clear();
        Ok(removed)
    }
}
