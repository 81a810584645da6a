//! Bulk evaluation submission.
//!
//! Each entry is applied as its own version-checked update. A failing
//! entry is reported next to the successes instead of failing the batch.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::{AppError, Result, VERSION_REQUIRED};
use crate::models::{EntityFields, EntityKind};
use crate::services::entity_service::EntityService;

/// One entry of a bulk update: target id, expected version and the fields
/// to change.
#[derive(Debug, Clone)]
pub struct BulkUpdateEntry<C> {
    pub id: i64,
    pub version: Option<i32>,
    pub changes: C,
}

impl<C: DeserializeOwned> BulkUpdateEntry<C> {
    /// Parse one raw entry for `kind`.
    ///
    /// The id is taken only from [`EntityKind::bulk_id_keys`]. Every other
    /// key, a parent column included, belongs to the change set, where
    /// unknown keys are ignored.
    pub fn parse(kind: EntityKind, raw: Value) -> Result<Self> {
        let Value::Object(mut object) = raw else {
            return Err(AppError::Validation(
                "Each evaluation must be a JSON object".into(),
            ));
        };

        let id = take_id(kind, &mut object)?;
        let version = match object.remove("version") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|_| AppError::Validation("version must be an integer".into()))?,
            ),
        };
        let changes = serde_json::from_value(Value::Object(object))
            .map_err(|e| AppError::Validation(format!("Invalid {} fields: {}", kind, e)))?;

        Ok(Self { id, version, changes })
    }
}

fn take_id(kind: EntityKind, object: &mut Map<String, Value>) -> Result<i64> {
    let mut id = None;
    for key in kind.bulk_id_keys() {
        let Some(value) = object.remove(*key) else {
            continue;
        };
        let parsed = value
            .as_i64()
            .ok_or_else(|| AppError::Validation(format!("{} must be an integer", key)))?;
        match id {
            Some(seen) if seen != parsed => {
                return Err(AppError::Validation(format!(
                    "Entry names two different {} ids: {} and {}",
                    kind, seen, parsed
                )));
            }
            _ => id = Some(parsed),
        }
    }
    id.ok_or_else(|| {
        AppError::Validation(format!(
            "Missing {} id: expected one of {}",
            kind,
            kind.bulk_id_keys().join(", ")
        ))
    })
}

/// Best-effort id for reporting an entry that failed to parse.
fn reported_id(kind: EntityKind, raw: &Value) -> Option<i64> {
    kind.bulk_id_keys()
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_i64))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkUpdateError {
    /// Target id, or null when the entry did not name one
    pub id: Option<i64>,
    /// HTTP status the entry would have produced on its own
    pub status: u16,
    /// Error body, or the full lock-conflict body for stale versions
    #[schema(value_type = Object)]
    pub error: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BulkUpdateResult {
    #[schema(value_type = Vec<Object>)]
    pub updated: Vec<serde_json::Value>,
    pub errors: Vec<BulkUpdateError>,
}

#[derive(Clone)]
pub struct EvaluationService<F: EntityFields> {
    entities: EntityService<F>,
}

impl<F: EntityFields> EvaluationService<F> {
    pub fn new(entities: EntityService<F>) -> Self {
        Self { entities }
    }

    /// Parse and apply every entry in order, collecting per-entry outcomes.
    pub async fn apply(&self, entries: Vec<Value>, actor: Option<i64>) -> Result<BulkUpdateResult> {
        if entries.is_empty() {
            return Err(AppError::Validation("No evaluations submitted".into()));
        }

        let mut result = BulkUpdateResult::default();
        for raw in entries {
            let id = reported_id(F::KIND, &raw);
            let outcome = match BulkUpdateEntry::<F::Changes>::parse(F::KIND, raw) {
                Ok(entry) => self.apply_one(&entry, actor).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(updated) => result.updated.push(updated),
                Err(e) => {
                    tracing::debug!(entity = %F::KIND, id = ?id, error = %e, "Bulk entry rejected");
                    result.errors.push(BulkUpdateError {
                        id,
                        status: e.status_code().as_u16(),
                        error: e.to_body(),
                    });
                }
            }
        }

        tracing::info!(
            entity = %F::KIND,
            updated = result.updated.len(),
            failed = result.errors.len(),
            "Bulk evaluation applied"
        );
        Ok(result)
    }

    async fn apply_one(
        &self,
        entry: &BulkUpdateEntry<F::Changes>,
        actor: Option<i64>,
    ) -> Result<serde_json::Value> {
        let version = entry
            .version
            .ok_or_else(|| AppError::Validation(VERSION_REQUIRED.into()))?;
        let updated = self
            .entities
            .update(entry.id, &entry.changes, version, actor)
            .await?;
        Ok(serde_json::to_value(updated)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inspection::{RequirementChanges, RequirementFields};
    use crate::services::audit_service::AuditService;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    async fn seeded(count: usize) -> (EvaluationService<RequirementFields>, Vec<i64>) {
        let store = Arc::new(MemoryStore::new());
        let entities: EntityService<RequirementFields> =
            EntityService::new(store.clone(), AuditService::new(store));
        let mut ids = Vec::new();
        for n in 0..count {
            let created = entities
                .create(
                    RequirementFields {
                        inspection_item_id: 1,
                        requirement_master_id: n as i64 + 1,
                        requirement_no: n as i32 + 1,
                        evaluation_result: "pending".into(),
                        evaluation_method: "observe".into(),
                        note: None,
                    },
                    None,
                )
                .await
                .unwrap();
            ids.push(created.id);
        }
        (EvaluationService::new(entities), ids)
    }

    fn entry(id: i64, version: Option<i32>) -> Value {
        json!({
            "requirement_id": id,
            "version": version,
            "evaluation_result": "pass",
        })
    }

    #[test]
    fn test_entry_accepts_entity_specific_id_key() {
        let parsed: BulkUpdateEntry<RequirementChanges> = BulkUpdateEntry::parse(
            EntityKind::Requirement,
            json!({
                "requirement_id": 9,
                "version": 2,
                "evaluation_result": "fail",
                "note": "no buffer zone"
            }),
        )
        .unwrap();
        assert_eq!(parsed.id, 9);
        assert_eq!(parsed.version, Some(2));
        assert_eq!(parsed.changes.evaluation_result.as_deref(), Some("fail"));
        assert_eq!(parsed.changes.note.as_deref(), Some("no buffer zone"));

        let parsed: BulkUpdateEntry<RequirementChanges> =
            BulkUpdateEntry::parse(EntityKind::Requirement, json!({ "requirementId": 4 })).unwrap();
        assert_eq!(parsed.id, 4);
        assert_eq!(parsed.version, None);
    }

    #[test]
    fn test_entry_never_reads_parent_column_as_id() {
        let err = BulkUpdateEntry::<RequirementChanges>::parse(
            EntityKind::Requirement,
            json!({ "inspection_item_id": 1, "version": 0, "evaluation_result": "pass" }),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("requirement_id")));

        // Sent alongside the real id, the parent column is just ignored
        let parsed = BulkUpdateEntry::<RequirementChanges>::parse(
            EntityKind::Requirement,
            json!({ "requirement_id": 2, "inspection_item_id": 1, "version": 0 }),
        )
        .unwrap();
        assert_eq!(parsed.id, 2);
    }

    #[test]
    fn test_entry_rejects_conflicting_or_mistyped_ids() {
        let kind = EntityKind::Requirement;
        assert!(BulkUpdateEntry::<RequirementChanges>::parse(
            kind,
            json!({ "requirement_id": 2, "id": 3, "version": 0 })
        )
        .is_err());
        assert!(BulkUpdateEntry::<RequirementChanges>::parse(
            kind,
            json!({ "requirement_id": "2", "version": 0 })
        )
        .is_err());
        assert!(BulkUpdateEntry::<RequirementChanges>::parse(
            kind,
            json!({ "requirement_id": 2, "version": "zero" })
        )
        .is_err());
        assert!(BulkUpdateEntry::<RequirementChanges>::parse(kind, json!([2, 0])).is_err());

        // The same id under two accepted keys is fine
        let parsed = BulkUpdateEntry::<RequirementChanges>::parse(
            kind,
            json!({ "requirement_id": 2, "id": 2 }),
        )
        .unwrap();
        assert_eq!(parsed.id, 2);
    }

    #[tokio::test]
    async fn test_parent_key_entry_reported_without_writing() {
        let (svc, ids) = seeded(1).await;
        let result = svc
            .apply(
                vec![json!({ "inspection_item_id": ids[0], "version": 0, "evaluation_result": "pass" })],
                Some(4),
            )
            .await
            .unwrap();

        assert!(result.updated.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].id, None);
        assert_eq!(result.errors[0].status, 400);
        assert_eq!(result.errors[0].error["code"], "VALIDATION_ERROR");

        let current = svc.entities.get(ids[0]).await.unwrap();
        assert_eq!(current.version, 0);
        assert_eq!(current.fields.evaluation_result, "pending");
    }

    #[tokio::test]
    async fn test_one_stale_entry_does_not_fail_batch() {
        let (svc, ids) = seeded(5).await;
        let mut entries: Vec<_> = ids.iter().map(|id| entry(*id, Some(0))).collect();
        entries[2]["version"] = json!(7);

        let result = svc.apply(entries, Some(4)).await.unwrap();
        assert_eq!(result.updated.len(), 4);
        assert_eq!(result.errors.len(), 1);
        for updated in &result.updated {
            assert_eq!(updated["version"], 1);
        }

        let error = &result.errors[0];
        assert_eq!(error.id, Some(ids[2]));
        assert_eq!(error.status, 409);
        assert_eq!(error.error["error"], "OPTIMISTIC_LOCK_FAILED");
        assert_eq!(error.error["expectedVersion"], 7);
        assert_eq!(error.error["actualVersion"], 0);
    }

    #[tokio::test]
    async fn test_missing_version_and_unknown_id_reported_per_entry() {
        let (svc, ids) = seeded(1).await;
        let result = svc
            .apply(
                vec![entry(ids[0], None), entry(999_999, Some(0)), entry(ids[0], Some(0))],
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.updated.len(), 1);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].status, 400);
        assert_eq!(result.errors[0].error["message"], VERSION_REQUIRED);
        assert_eq!(result.errors[1].status, 404);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (svc, _) = seeded(0).await;
        assert!(svc.apply(Vec::new(), None).await.is_err());
    }
}
