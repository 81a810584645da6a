//! Generic service for versioned entities.
//!
//! Every mutation follows the same sequence: load the current row as the
//! audit "before" snapshot, hand the write to [`OptimisticLockExecutor`],
//! then record the outcome with [`AuditService`]. Lock conflicts come back
//! as [`AppError::OptimisticLock`] untouched; there is no retry here.
//!
//! An update snapshot must sit at the caller's version, so the audit diff
//! always spans exactly one version step.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, OptimisticLockError, Result};
use crate::models::entity::{to_change_map, to_column_map};
use crate::models::{EntityFields, EntityKind, EntityRow, VersionedEntity};
use crate::services::audit_service::AuditService;
use crate::services::optimistic_lock::{validate_request, OptimisticLockExecutor};
use crate::storage::RecordStore;

/// CRUD plus version-checked update and delete for one entity type.
pub struct EntityService<F: EntityFields> {
    store: Arc<dyn RecordStore>,
    executor: OptimisticLockExecutor,
    audit: AuditService,
    _fields: PhantomData<fn() -> F>,
}

impl<F: EntityFields> Clone for EntityService<F> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            executor: self.executor.clone(),
            audit: self.audit.clone(),
            _fields: PhantomData,
        }
    }
}

impl<F: EntityFields> EntityService<F> {
    pub fn new(store: Arc<dyn RecordStore>, audit: AuditService) -> Self {
        Self {
            executor: OptimisticLockExecutor::new(store.clone()),
            store,
            audit,
            _fields: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        F::KIND
    }

    /// Insert a new record at version 0 and audit the creation.
    pub async fn create(&self, fields: F, actor: Option<i64>) -> Result<VersionedEntity<F>> {
        fields.validate()?;
        let columns = to_column_map(F::KIND, &fields)?;

        let row = self.store.insert(F::KIND, columns).await?;
        let entity = VersionedEntity::<F>::from_row(row.clone())?;

        tracing::info!(entity = %F::KIND, id = entity.id, "Created");
        self.audit
            .record_create(F::KIND, entity.id, actor, &row)
            .await;

        Ok(entity)
    }

    pub async fn find(&self, id: i64) -> Result<Option<VersionedEntity<F>>> {
        self.store
            .find(F::KIND, id)
            .await?
            .map(VersionedEntity::from_row)
            .transpose()
    }

    pub async fn get(&self, id: i64) -> Result<VersionedEntity<F>> {
        self.find(id).await?.ok_or_else(|| F::KIND.not_found(id))
    }

    pub async fn list_by_parent(&self, parent_id: i64) -> Result<Vec<VersionedEntity<F>>> {
        self.store
            .list_by_parent(F::KIND, parent_id)
            .await?
            .into_iter()
            .map(VersionedEntity::from_row)
            .collect()
    }

    /// Apply `changes` if the record is still at `version`.
    ///
    /// Returns the record as written, at `version + 1`. A stale version
    /// yields [`AppError::OptimisticLock`]; a missing record yields
    /// [`AppError::NotFound`]. Both are decided before anything is audited.
    pub async fn update(
        &self,
        id: i64,
        changes: &F::Changes,
        version: i32,
        actor: Option<i64>,
    ) -> Result<VersionedEntity<F>> {
        F::validate_changes(changes)?;
        let change_map = to_change_map(F::KIND, changes)?;
        if change_map.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        validate_request(F::KIND, id, version)?;

        let old_row = self.snapshot_at(id, version).await?;
        validate_merged::<F>(&old_row, &change_map)?;

        let new_row = self
            .executor
            .update_with_lock(F::KIND, id, &change_map, version)
            .await?
            .into_result(F::KIND, id)?;

        self.audit
            .record_update(F::KIND, id, actor, &old_row, &new_row)
            .await;

        VersionedEntity::from_row(new_row)
    }

    /// Current row, required to be at `version`.
    ///
    /// A row behind `version` is read once more in case the first read
    /// missed a write the caller has already seen. A row at any other
    /// version conflicts without attempting the write.
    async fn snapshot_at(&self, id: i64, version: i32) -> Result<EntityRow> {
        let mut row = self.load_row(id).await?;
        if row_version(&row)? < version {
            row = self.load_row(id).await?;
        }

        let actual = row_version(&row)?;
        if actual != version {
            tracing::warn!(
                entity = %F::KIND,
                id,
                expected = version,
                actual,
                "Optimistic lock conflict before write"
            );
            return Err(OptimisticLockError::new(F::KIND.entity_name(), id, version, actual).into());
        }
        Ok(row)
    }

    async fn load_row(&self, id: i64) -> Result<EntityRow> {
        self.store
            .find(F::KIND, id)
            .await?
            .ok_or_else(|| F::KIND.not_found(id))
    }

    /// Delete the record if it is still at `version`.
    pub async fn delete(&self, id: i64, version: i32, actor: Option<i64>) -> Result<VersionedEntity<F>> {
        let old_row = self
            .executor
            .delete_with_lock(F::KIND, id, version)
            .await?
            .into_result(F::KIND, id)?;

        tracing::info!(entity = %F::KIND, id, version, "Deleted");
        self.audit
            .record_delete(F::KIND, id, actor, &old_row)
            .await;

        VersionedEntity::from_row(old_row)
    }
}

fn row_version(row: &EntityRow) -> Result<i32> {
    row.get("version")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| AppError::Internal("stored row has no version".into()))
}

/// Field-level rules that span columns are checked against the record as
/// it would look after the update.
fn validate_merged<F: EntityFields>(old_row: &EntityRow, changes: &EntityRow) -> Result<()> {
    let mut merged = old_row.clone();
    merged.extend(changes.clone());
    VersionedEntity::<F>::from_row(merged)?.fields.validate()
}
