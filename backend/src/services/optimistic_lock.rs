//! Optimistic update executor.
//!
//! Every versioned write goes through [`OptimisticLockExecutor`]: one
//! conditional statement against the store (`WHERE id = ? AND version = ?`)
//! that also bumps the version. There is no read-then-write window; the
//! follow-up read on a miss only classifies the failure.

use std::sync::Arc;

use crate::error::{AppError, OptimisticLockError, Result};
use crate::models::entity::SYSTEM_COLUMNS;
use crate::models::{EntityKind, EntityRow};
use crate::storage::RecordStore;

/// Result of a version-checked write.
#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    /// The write applied; carries the row as written (or as deleted).
    Applied(EntityRow),
    /// The row exists but its version has moved past the expected one.
    Conflict(OptimisticLockError),
    /// No row with that id.
    NotFound,
}

impl LockOutcome {
    /// Collapse into the crate error taxonomy: conflicts stay typed as
    /// [`AppError::OptimisticLock`], missing rows become 404s.
    pub fn into_result(self, kind: EntityKind, id: i64) -> Result<EntityRow> {
        match self {
            LockOutcome::Applied(row) => Ok(row),
            LockOutcome::Conflict(conflict) => Err(AppError::OptimisticLock(conflict)),
            LockOutcome::NotFound => Err(kind.not_found(id)),
        }
    }
}

/// Performs version-checked updates and deletes.
#[derive(Clone)]
pub struct OptimisticLockExecutor {
    store: Arc<dyn RecordStore>,
}

impl OptimisticLockExecutor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Apply `changes` to row `id` if it is still at `expected_version`.
    ///
    /// On success the stored version is `expected_version + 1` and the
    /// returned row is the one produced by the conditional write itself.
    pub async fn update_with_lock(
        &self,
        kind: EntityKind,
        id: i64,
        changes: &EntityRow,
        expected_version: i32,
    ) -> Result<LockOutcome> {
        validate_request(kind, id, expected_version)?;
        if let Some(col) = changes.keys().find(|k| SYSTEM_COLUMNS.contains(&k.as_str())) {
            return Err(AppError::Validation(format!(
                "'{}' is managed by the server and cannot be changed",
                col
            )));
        }

        match self
            .store
            .conditional_update(kind, id, expected_version, changes)
            .await?
        {
            Some(row) => {
                tracing::debug!(entity = %kind, id, version = expected_version + 1, "Versioned update applied");
                Ok(LockOutcome::Applied(row))
            }
            None => self.classify_miss(kind, id, expected_version).await,
        }
    }

    /// Delete row `id` if it is still at `expected_version`.
    pub async fn delete_with_lock(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
    ) -> Result<LockOutcome> {
        validate_request(kind, id, expected_version)?;

        match self
            .store
            .conditional_delete(kind, id, expected_version)
            .await?
        {
            Some(row) => Ok(LockOutcome::Applied(row)),
            None => self.classify_miss(kind, id, expected_version).await,
        }
    }

    /// Zero rows matched: either the row is gone or its version advanced.
    async fn classify_miss(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i32,
    ) -> Result<LockOutcome> {
        match self.store.current_version(kind, id).await? {
            None => Ok(LockOutcome::NotFound),
            Some(actual_version) => {
                tracing::warn!(
                    entity = %kind,
                    id,
                    expected = expected_version,
                    actual = actual_version,
                    "Optimistic lock conflict"
                );
                Ok(LockOutcome::Conflict(OptimisticLockError::new(
                    kind.entity_name(),
                    id,
                    expected_version,
                    actual_version,
                )))
            }
        }
    }
}

pub(crate) fn validate_request(kind: EntityKind, id: i64, expected_version: i32) -> Result<()> {
    if id <= 0 {
        return Err(AppError::Validation(format!("Invalid {} id {}", kind, id)));
    }
    if expected_version < 0 {
        return Err(AppError::Validation(format!(
            "Invalid version {}: versions are never negative",
            expected_version
        )));
    }
    Ok(())
}
