//! Audit log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Kind of mutation an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(AppError::Validation(format!(
                "Invalid audit action '{}' (expected CREATE, UPDATE or DELETE)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored audit log entry. Never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: i64,
    pub table_name: String,
    pub action: AuditAction,
    pub record_id: i64,
    /// Acting user; absent for system and self-service actions
    pub user_id: Option<i64>,
    /// Snapshot before the mutation (absent for CREATE)
    #[schema(value_type = Option<Object>)]
    pub old_data: Option<serde_json::Value>,
    /// Snapshot or changed fields after the mutation (absent for DELETE)
    #[schema(value_type = Option<Object>)]
    pub new_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// An entry about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub table_name: String,
    pub action: AuditAction,
    pub record_id: i64,
    pub user_id: Option<i64>,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
}

/// Filter for audit log queries. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub user_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub offset: i64,
    pub limit: i64,
}

impl AuditQuery {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.table_name.as_deref().map_or(true, |t| entry.table_name == t)
            && self.record_id.map_or(true, |r| entry.record_id == r)
            && self.user_id.map_or(true, |u| entry.user_id == Some(u))
            && self.action.map_or(true, |a| entry.action == a)
            && self.from.map_or(true, |from| entry.created_at >= from)
            && self.to.map_or(true, |to| entry.created_at <= to)
    }
}
