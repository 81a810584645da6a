//! Inspection scheduling.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::inspection::{Inspection, InspectionFields, InspectionResult, InspectionStatus};
use crate::models::rubber_farm::RubberFarmFields;
use crate::services::entity_service::EntityService;

/// Request to put an inspection on a farm's calendar.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleInspectionRequest {
    /// Generated as `INS-<yyyymmdd>-<farm id>-<n>` when omitted
    pub inspection_no: Option<String>,
    pub inspection_date_and_time: DateTime<Utc>,
    pub inspection_type_id: i64,
    pub auditor_chief_id: i64,
    pub rubber_farm_id: i64,
}

#[derive(Clone)]
pub struct InspectionService {
    inspections: EntityService<InspectionFields>,
    farms: EntityService<RubberFarmFields>,
}

impl InspectionService {
    pub fn new(
        inspections: EntityService<InspectionFields>,
        farms: EntityService<RubberFarmFields>,
    ) -> Self {
        Self { inspections, farms }
    }

    pub fn entities(&self) -> &EntityService<InspectionFields> {
        &self.inspections
    }

    /// Create a pending inspection for an existing farm.
    pub async fn schedule(
        &self,
        req: ScheduleInspectionRequest,
        actor: Option<i64>,
    ) -> Result<Inspection> {
        if self.farms.find(req.rubber_farm_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Rubber farm {} does not exist",
                req.rubber_farm_id
            )));
        }

        let inspection_no = match req.inspection_no {
            Some(no) => no,
            None => {
                let existing = self.inspections.list_by_parent(req.rubber_farm_id).await?;
                inspection_number(
                    req.inspection_date_and_time,
                    req.rubber_farm_id,
                    existing.len() + 1,
                )
            }
        };

        let inspection = self
            .inspections
            .create(
                InspectionFields {
                    inspection_no,
                    inspection_date_and_time: req.inspection_date_and_time,
                    inspection_type_id: req.inspection_type_id,
                    inspection_status: InspectionStatus::Pending,
                    inspection_result: InspectionResult::Pending,
                    auditor_chief_id: req.auditor_chief_id,
                    rubber_farm_id: req.rubber_farm_id,
                },
                actor,
            )
            .await?;

        tracing::info!(
            id = inspection.id,
            inspection_no = %inspection.fields.inspection_no,
            farm = req.rubber_farm_id,
            "Inspection scheduled"
        );
        Ok(inspection)
    }
}

fn inspection_number(at: DateTime<Utc>, farm_id: i64, seq: usize) -> String {
    format!("INS-{}-{}-{}", at.format("%Y%m%d"), farm_id, seq)
}
