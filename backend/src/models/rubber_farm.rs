//! Rubber farm model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity::{require_non_empty, require_positive_id, EntityFields, EntityKind, VersionedEntity};
use crate::error::{AppError, Result};

pub type RubberFarm = VersionedEntity<RubberFarmFields>;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RubberFarmFields {
    pub farmer_id: i64,
    pub village_name: String,
    pub moo: i32,
    pub road: Option<String>,
    pub alley: Option<String>,
    pub sub_district: String,
    pub district: String,
    pub province: String,
    /// GeoJSON geometry of the plot
    #[schema(value_type = Option<Object>)]
    pub location: Option<serde_json::Value>,
    pub product_distribution_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RubberFarmChanges {
    pub village_name: Option<String>,
    pub moo: Option<i32>,
    pub road: Option<String>,
    pub alley: Option<String>,
    pub sub_district: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub location: Option<serde_json::Value>,
    pub product_distribution_type: Option<String>,
}

fn validate_moo(moo: i32) -> Result<()> {
    if moo < 0 {
        return Err(AppError::Validation("moo must not be negative".into()));
    }
    Ok(())
}

impl EntityFields for RubberFarmFields {
    const KIND: EntityKind = EntityKind::RubberFarm;
    type Changes = RubberFarmChanges;

    fn parent_id(&self) -> i64 {
        self.farmer_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("farmer_id", self.farmer_id)?;
        require_non_empty("village_name", &self.village_name)?;
        require_non_empty("province", &self.province)?;
        validate_moo(self.moo)
    }

    fn validate_changes(changes: &RubberFarmChanges) -> Result<()> {
        if let Some(moo) = changes.moo {
            validate_moo(moo)?;
        }
        if let Some(province) = &changes.province {
            require_non_empty("province", province)?;
        }
        Ok(())
    }
}
