//! Inspection models: the inspection itself and the records captured
//! during it (items, requirements, data records, advice and defects).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity::{require_non_empty, require_positive_id, EntityFields, EntityKind, VersionedEntity};
use crate::error::{AppError, Result};

pub type Inspection = VersionedEntity<InspectionFields>;
pub type InspectionItem = VersionedEntity<InspectionItemFields>;
pub type Requirement = VersionedEntity<RequirementFields>;
pub type DataRecord = VersionedEntity<DataRecordFields>;
pub type AdviceAndDefect = VersionedEntity<AdviceAndDefectFields>;

/// Inspection workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Certification outcome of an inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    Pending,
    Passed,
    Failed,
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InspectionFields {
    pub inspection_no: String,
    pub inspection_date_and_time: DateTime<Utc>,
    pub inspection_type_id: i64,
    pub inspection_status: InspectionStatus,
    pub inspection_result: InspectionResult,
    pub auditor_chief_id: i64,
    pub rubber_farm_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InspectionChanges {
    pub inspection_date_and_time: Option<DateTime<Utc>>,
    pub inspection_type_id: Option<i64>,
    pub inspection_status: Option<InspectionStatus>,
    pub inspection_result: Option<InspectionResult>,
    pub auditor_chief_id: Option<i64>,
}

impl EntityFields for InspectionFields {
    const KIND: EntityKind = EntityKind::Inspection;
    type Changes = InspectionChanges;

    fn parent_id(&self) -> i64 {
        self.rubber_farm_id
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("inspection_no", &self.inspection_no)?;
        require_positive_id("inspection_type_id", self.inspection_type_id)?;
        require_positive_id("auditor_chief_id", self.auditor_chief_id)?;
        require_positive_id("rubber_farm_id", self.rubber_farm_id)
    }

    fn validate_changes(changes: &InspectionChanges) -> Result<()> {
        if let Some(id) = changes.inspection_type_id {
            require_positive_id("inspection_type_id", id)?;
        }
        if let Some(id) = changes.auditor_chief_id {
            require_positive_id("auditor_chief_id", id)?;
        }
        // A result only makes sense once the inspection has been carried out.
        if let (Some(status), Some(result)) = (changes.inspection_status, changes.inspection_result) {
            if result != InspectionResult::Pending
                && matches!(status, InspectionStatus::Pending | InspectionStatus::Cancelled)
            {
                return Err(AppError::Validation(format!(
                    "inspection_result cannot be {:?} while inspection_status is {:?}",
                    result, status
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inspection item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InspectionItemFields {
    pub inspection_id: i64,
    pub inspection_item_master_id: i64,
    pub inspection_item_no: i32,
    pub inspection_item_result: String,
    /// Free-form answers for item-specific conditions
    #[schema(value_type = Option<Object>)]
    pub other_conditions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InspectionItemChanges {
    pub inspection_item_result: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub other_conditions: Option<serde_json::Value>,
}

impl EntityFields for InspectionItemFields {
    const KIND: EntityKind = EntityKind::InspectionItem;
    type Changes = InspectionItemChanges;

    fn parent_id(&self) -> i64 {
        self.inspection_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("inspection_id", self.inspection_id)?;
        require_positive_id("inspection_item_master_id", self.inspection_item_master_id)
    }

    fn validate_changes(changes: &InspectionItemChanges) -> Result<()> {
        if let Some(result) = &changes.inspection_item_result {
            require_non_empty("inspection_item_result", result)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequirementFields {
    pub inspection_item_id: i64,
    pub requirement_master_id: i64,
    pub requirement_no: i32,
    pub evaluation_result: String,
    pub evaluation_method: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RequirementChanges {
    pub evaluation_result: Option<String>,
    pub evaluation_method: Option<String>,
    pub note: Option<String>,
}

impl EntityFields for RequirementFields {
    const KIND: EntityKind = EntityKind::Requirement;
    type Changes = RequirementChanges;

    fn parent_id(&self) -> i64 {
        self.inspection_item_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("inspection_item_id", self.inspection_item_id)?;
        require_positive_id("requirement_master_id", self.requirement_master_id)
    }

    fn validate_changes(changes: &RequirementChanges) -> Result<()> {
        if let Some(result) = &changes.evaluation_result {
            require_non_empty("evaluation_result", result)?;
        }
        if let Some(method) = &changes.evaluation_method {
            require_non_empty("evaluation_method", method)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Data record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataRecordFields {
    pub inspection_id: i64,
    #[schema(value_type = Object)]
    pub species_record: serde_json::Value,
    #[schema(value_type = Object)]
    pub water_system: serde_json::Value,
    #[schema(value_type = Object)]
    pub fertilizers: serde_json::Value,
    #[schema(value_type = Object)]
    pub previously_cultivated: serde_json::Value,
    #[schema(value_type = Object)]
    pub plant_disease: serde_json::Value,
    #[schema(value_type = Object)]
    pub related_plants: serde_json::Value,
    pub more_info: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub map: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DataRecordChanges {
    #[schema(value_type = Option<Object>)]
    pub species_record: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub water_system: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub fertilizers: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub previously_cultivated: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub plant_disease: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub related_plants: Option<serde_json::Value>,
    pub more_info: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub map: Option<serde_json::Value>,
}

impl EntityFields for DataRecordFields {
    const KIND: EntityKind = EntityKind::DataRecord;
    type Changes = DataRecordChanges;

    fn parent_id(&self) -> i64 {
        self.inspection_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("inspection_id", self.inspection_id)
    }
}

// ---------------------------------------------------------------------------
// Advice and defects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdviceAndDefectFields {
    pub inspection_id: i64,
    pub date: DateTime<Utc>,
    #[schema(value_type = Vec<Object>)]
    pub advice_list: serde_json::Value,
    #[schema(value_type = Vec<Object>)]
    pub defect_list: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdviceAndDefectChanges {
    pub date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub advice_list: Option<serde_json::Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub defect_list: Option<serde_json::Value>,
}

fn require_array(field: &str, value: &serde_json::Value) -> Result<()> {
    if !value.is_array() {
        return Err(AppError::Validation(format!("{} must be a JSON array", field)));
    }
    Ok(())
}

impl EntityFields for AdviceAndDefectFields {
    const KIND: EntityKind = EntityKind::AdviceAndDefect;
    type Changes = AdviceAndDefectChanges;

    fn parent_id(&self) -> i64 {
        self.inspection_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("inspection_id", self.inspection_id)?;
        require_array("advice_list", &self.advice_list)?;
        require_array("defect_list", &self.defect_list)
    }

    fn validate_changes(changes: &AdviceAndDefectChanges) -> Result<()> {
        if let Some(list) = &changes.advice_list {
            require_array("advice_list", list)?;
        }
        if let Some(list) = &changes.defect_list {
            require_array("defect_list", list)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_value(InspectionStatus::InProgress).unwrap(),
            "in_progress"
        );
        assert_eq!(
            serde_json::from_value::<InspectionResult>("passed".into()).unwrap(),
            InspectionResult::Passed
        );
    }

    #[test]
    fn test_result_requires_carried_out_inspection() {
        let changes = InspectionChanges {
            inspection_status: Some(InspectionStatus::Pending),
            inspection_result: Some(InspectionResult::Passed),
            ..Default::default()
        };
        assert!(InspectionFields::validate_changes(&changes).is_err());

        let changes = InspectionChanges {
            inspection_status: Some(InspectionStatus::Completed),
            inspection_result: Some(InspectionResult::Passed),
            ..Default::default()
        };
        assert!(InspectionFields::validate_changes(&changes).is_ok());
    }

    #[test]
    fn test_advice_lists_must_be_arrays() {
        let changes = AdviceAndDefectChanges {
            advice_list: Some(serde_json::json!({ "not": "a list" })),
            ..Default::default()
        };
        assert!(AdviceAndDefectFields::validate_changes(&changes).is_err());
    }

    #[test]
    fn test_requirement_changes_serialize_only_present_fields() {
        let changes = RequirementChanges {
            evaluation_result: Some("ใช่".into()),
            ..Default::default()
        };
        let map = crate::models::entity::to_change_map(EntityKind::Requirement, &changes).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("evaluation_result"));
    }
}
