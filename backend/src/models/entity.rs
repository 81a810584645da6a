//! Versioned entity envelope shared by every mutable domain record.
//!
//! A record is a `VersionedEntity<F>`: the store-managed columns (`id`,
//! `version`, timestamps) around a field set `F`. Each field set names its
//! [`EntityKind`], which carries the table metadata the stores need.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// A row as exchanged with the record stores: column name to JSON value.
pub type EntityRow = serde_json::Map<String, serde_json::Value>;

/// Columns owned by the store. They never appear in a change set.
pub const SYSTEM_COLUMNS: &[&str] = &["id", "version", "created_at", "updated_at"];

/// Columns stripped from audit snapshots on every entity.
pub const VOLATILE_COLUMNS: &[&str] = &["created_at", "updated_at"];

/// Every versioned table in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Farmer,
    Auditor,
    Committee,
    Admin,
    RubberFarm,
    Inspection,
    InspectionItem,
    Requirement,
    DataRecord,
    AdviceAndDefect,
    Certificate,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Farmer,
        EntityKind::Auditor,
        EntityKind::Committee,
        EntityKind::Admin,
        EntityKind::RubberFarm,
        EntityKind::Inspection,
        EntityKind::InspectionItem,
        EntityKind::Requirement,
        EntityKind::DataRecord,
        EntityKind::AdviceAndDefect,
        EntityKind::Certificate,
    ];

    /// Logical name used in conflict payloads.
    pub fn entity_name(&self) -> &'static str {
        match self {
            EntityKind::Farmer => "farmer",
            EntityKind::Auditor => "auditor",
            EntityKind::Committee => "committee",
            EntityKind::Admin => "admin",
            EntityKind::RubberFarm => "rubberFarm",
            EntityKind::Inspection => "inspection",
            EntityKind::InspectionItem => "inspectionItem",
            EntityKind::Requirement => "requirement",
            EntityKind::DataRecord => "dataRecord",
            EntityKind::AdviceAndDefect => "adviceAndDefect",
            EntityKind::Certificate => "certificate",
        }
    }

    /// Backing table, also the audit log `table_name`.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Farmer => "farmers",
            EntityKind::Auditor => "auditors",
            EntityKind::Committee => "committees",
            EntityKind::Admin => "admins",
            EntityKind::RubberFarm => "rubber_farms",
            EntityKind::Inspection => "inspections",
            EntityKind::InspectionItem => "inspection_items",
            EntityKind::Requirement => "requirements",
            EntityKind::DataRecord => "data_records",
            EntityKind::AdviceAndDefect => "advice_and_defects",
            EntityKind::Certificate => "certificates",
        }
    }

    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.table() == table)
    }

    /// Domain columns. Only these names are ever interpolated into SQL.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Farmer => &[
                "user_id",
                "name_title",
                "first_name",
                "last_name",
                "id_card",
                "phone_number",
                "email",
                "house_no",
                "village_name",
                "moo",
                "road",
                "alley",
                "sub_district",
                "district",
                "province_name",
                "zip_code",
            ],
            EntityKind::Auditor | EntityKind::Committee => &[
                "user_id",
                "name_title",
                "first_name",
                "last_name",
                "phone_number",
                "email",
            ],
            EntityKind::Admin => &["user_id", "name_title", "first_name", "last_name", "email"],
            EntityKind::RubberFarm => &[
                "farmer_id",
                "village_name",
                "moo",
                "road",
                "alley",
                "sub_district",
                "district",
                "province",
                "location",
                "product_distribution_type",
            ],
            EntityKind::Inspection => &[
                "inspection_no",
                "inspection_date_and_time",
                "inspection_type_id",
                "inspection_status",
                "inspection_result",
                "auditor_chief_id",
                "rubber_farm_id",
            ],
            EntityKind::InspectionItem => &[
                "inspection_id",
                "inspection_item_master_id",
                "inspection_item_no",
                "inspection_item_result",
                "other_conditions",
            ],
            EntityKind::Requirement => &[
                "inspection_item_id",
                "requirement_master_id",
                "requirement_no",
                "evaluation_result",
                "evaluation_method",
                "note",
            ],
            EntityKind::DataRecord => &[
                "inspection_id",
                "species_record",
                "water_system",
                "fertilizers",
                "previously_cultivated",
                "plant_disease",
                "related_plants",
                "more_info",
                "map",
            ],
            EntityKind::AdviceAndDefect => {
                &["inspection_id", "date", "advice_list", "defect_list"]
            }
            EntityKind::Certificate => &[
                "inspection_id",
                "pdf_file_url",
                "effective_date",
                "expiry_date",
                "active",
                "cancel_request_flag",
                "cancel_request_detail",
            ],
        }
    }

    /// Column linking a row to its owner, used by list-by-parent queries.
    pub fn parent_column(&self) -> &'static str {
        match self {
            EntityKind::Farmer | EntityKind::Auditor | EntityKind::Committee | EntityKind::Admin => {
                "user_id"
            }
            EntityKind::RubberFarm => "farmer_id",
            EntityKind::Inspection => "rubber_farm_id",
            EntityKind::InspectionItem
            | EntityKind::DataRecord
            | EntityKind::AdviceAndDefect
            | EntityKind::Certificate => "inspection_id",
            EntityKind::Requirement => "inspection_item_id",
        }
    }

    /// Keys a bulk evaluation entry may use for its own id. Parent columns
    /// never appear here.
    pub fn bulk_id_keys(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Requirement => &["requirement_id", "requirementId", "id"],
            EntityKind::InspectionItem => &["inspection_item_id", "inspectionItemId", "id"],
            _ => &["id"],
        }
    }

    /// Large geometry columns left out of audit snapshots.
    pub fn audit_excluded(&self) -> &'static [&'static str] {
        match self {
            EntityKind::RubberFarm => &["location"],
            EntityKind::DataRecord => &["map"],
            _ => &[],
        }
    }

    pub fn is_column(&self, name: &str) -> bool {
        self.columns().contains(&name)
    }

    pub fn not_found(&self, id: i64) -> AppError {
        AppError::NotFound(format!("{} {} not found", self, id))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.entity_name())
    }
}

/// A field set persisted inside a [`VersionedEntity`].
pub trait EntityFields: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Partial update payload. Every field is optional and absent fields
    /// are left out when serialized, so the serialized form is exactly the
    /// set of columns to change.
    type Changes: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Id of the owning record (see [`EntityKind::parent_column`]).
    fn parent_id(&self) -> i64;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn validate_changes(_changes: &Self::Changes) -> Result<()> {
        Ok(())
    }
}

/// A persisted record with its optimistic-locking version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedEntity<F> {
    pub id: i64,
    /// Starts at 0, incremented by exactly one on every successful update.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: F,
}

impl<F: EntityFields> VersionedEntity<F> {
    pub fn kind() -> EntityKind {
        F::KIND
    }

    pub fn from_row(row: EntityRow) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
            AppError::Internal(format!("Malformed {} row: {}", F::KIND.entity_name(), e))
        })
    }

    pub fn to_row(&self) -> Result<EntityRow> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(AppError::Internal("Entity did not serialize to an object".into())),
        }
    }
}

/// Serialize a field set or change set into a column map for `kind`.
///
/// Keys outside the column whitelist are rejected, so nothing a client
/// sends can name `id`, `version` or an arbitrary column.
pub fn to_column_map<T: Serialize>(kind: EntityKind, value: &T) -> Result<EntityRow> {
    let map = match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => map,
        _ => {
            return Err(AppError::Internal(format!(
                "{} payload did not serialize to an object",
                kind
            )))
        }
    };

    if let Some(bad) = map.keys().find(|k| !kind.is_column(k)) {
        return Err(AppError::Validation(format!(
            "Field '{}' cannot be written on {}",
            bad, kind
        )));
    }

    Ok(map)
}

/// Column map for a change set: like [`to_column_map`] with absent (null)
/// fields dropped. An empty result means the request changes nothing.
pub fn to_change_map<T: Serialize>(kind: EntityKind, changes: &T) -> Result<EntityRow> {
    let mut map = to_column_map(kind, changes)?;
    map.retain(|_, v| !v.is_null());
    Ok(map)
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn require_positive_id(field: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(AppError::Validation(format!(
            "{} must be a positive id",
            field
        )));
    }
    Ok(())
}
