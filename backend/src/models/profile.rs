//! Role profiles: farmer, auditor, committee member and admin.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity::{require_non_empty, require_positive_id, EntityFields, EntityKind, VersionedEntity};
use crate::error::{AppError, Result};

pub type Farmer = VersionedEntity<FarmerFields>;
pub type Auditor = VersionedEntity<AuditorFields>;
pub type Committee = VersionedEntity<CommitteeFields>;
pub type Admin = VersionedEntity<AdminFields>;

fn validate_email(email: &str) -> Result<()> {
    let at = email.find('@');
    match at {
        Some(i) if i > 0 && i + 1 < email.len() && !email.contains(char::is_whitespace) => Ok(()),
        _ => Err(AppError::Validation(format!("Invalid email address '{}'", email))),
    }
}

fn validate_names(first_name: Option<&str>, last_name: Option<&str>) -> Result<()> {
    if let Some(first) = first_name {
        require_non_empty("first_name", first)?;
    }
    if let Some(last) = last_name {
        require_non_empty("last_name", last)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Farmer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmerFields {
    pub user_id: i64,
    pub name_title: String,
    pub first_name: String,
    pub last_name: String,
    pub id_card: String,
    pub phone_number: String,
    pub email: String,
    pub house_no: String,
    pub village_name: String,
    pub moo: i32,
    pub road: Option<String>,
    pub alley: Option<String>,
    pub sub_district: String,
    pub district: String,
    pub province_name: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FarmerChanges {
    pub name_title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub house_no: Option<String>,
    pub village_name: Option<String>,
    pub moo: Option<i32>,
    pub road: Option<String>,
    pub alley: Option<String>,
    pub sub_district: Option<String>,
    pub district: Option<String>,
    pub province_name: Option<String>,
    pub zip_code: Option<String>,
}

fn validate_zip_code(zip: &str) -> Result<()> {
    if zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "zip_code must be 5 digits, got '{}'",
            zip
        )));
    }
    Ok(())
}

impl EntityFields for FarmerFields {
    const KIND: EntityKind = EntityKind::Farmer;
    type Changes = FarmerChanges;

    fn parent_id(&self) -> i64 {
        self.user_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("user_id", self.user_id)?;
        validate_names(Some(&self.first_name), Some(&self.last_name))?;
        require_non_empty("id_card", &self.id_card)?;
        validate_email(&self.email)?;
        validate_zip_code(&self.zip_code)
    }

    fn validate_changes(changes: &FarmerChanges) -> Result<()> {
        validate_names(changes.first_name.as_deref(), changes.last_name.as_deref())?;
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if let Some(zip) = &changes.zip_code {
            validate_zip_code(zip)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Auditor and committee member
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditorFields {
    pub user_id: i64,
    pub name_title: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommitteeFields {
    pub user_id: i64,
    pub name_title: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub email: String,
}

/// Editable contact fields shared by auditor and committee profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StaffProfileChanges {
    pub name_title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

fn validate_staff_changes(changes: &StaffProfileChanges) -> Result<()> {
    validate_names(changes.first_name.as_deref(), changes.last_name.as_deref())?;
    if let Some(email) = &changes.email {
        validate_email(email)?;
    }
    Ok(())
}

impl EntityFields for AuditorFields {
    const KIND: EntityKind = EntityKind::Auditor;
    type Changes = StaffProfileChanges;

    fn parent_id(&self) -> i64 {
        self.user_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("user_id", self.user_id)?;
        validate_names(Some(&self.first_name), Some(&self.last_name))?;
        validate_email(&self.email)
    }

    fn validate_changes(changes: &StaffProfileChanges) -> Result<()> {
        validate_staff_changes(changes)
    }
}

impl EntityFields for CommitteeFields {
    const KIND: EntityKind = EntityKind::Committee;
    type Changes = StaffProfileChanges;

    fn parent_id(&self) -> i64 {
        self.user_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("user_id", self.user_id)?;
        validate_names(Some(&self.first_name), Some(&self.last_name))?;
        validate_email(&self.email)
    }

    fn validate_changes(changes: &StaffProfileChanges) -> Result<()> {
        validate_staff_changes(changes)
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminFields {
    pub user_id: i64,
    pub name_title: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminChanges {
    pub name_title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl EntityFields for AdminFields {
    const KIND: EntityKind = EntityKind::Admin;
    type Changes = AdminChanges;

    fn parent_id(&self) -> i64 {
        self.user_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("user_id", self.user_id)?;
        validate_names(Some(&self.first_name), Some(&self.last_name))?;
        validate_email(&self.email)
    }

    fn validate_changes(changes: &AdminChanges) -> Result<()> {
        validate_names(changes.first_name.as_deref(), changes.last_name.as_deref())?;
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farmer() -> FarmerFields {
        FarmerFields {
            user_id: 7,
            name_title: "นาย".into(),
            first_name: "Somchai".into(),
            last_name: "Jaidee".into(),
            id_card: "1103700012345".into(),
            phone_number: "0812345678".into(),
            email: "somchai@example.com".into(),
            house_no: "99/1".into(),
            village_name: "Ban Nong".into(),
            moo: 3,
            road: None,
            alley: None,
            sub_district: "Tha Sala".into(),
            district: "Mueang".into(),
            province_name: "Songkhla".into(),
            zip_code: "90000".into(),
        }
    }

    #[test]
    fn test_farmer_validates() {
        assert!(farmer().validate().is_ok());
    }

    #[test]
    fn test_farmer_rejects_bad_zip_and_email() {
        let mut f = farmer();
        f.zip_code = "9000".into();
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));

        let changes = FarmerChanges {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(FarmerFields::validate_changes(&changes).is_err());
    }

    #[test]
    fn test_staff_changes_reject_blank_names() {
        let changes = StaffProfileChanges {
            first_name: Some("   ".into()),
            ..Default::default()
        };
        assert!(AuditorFields::validate_changes(&changes).is_err());
        assert!(CommitteeFields::validate_changes(&changes).is_err());
    }

    #[test]
    fn test_farmer_round_trips_through_row() {
        let now = chrono::Utc::now();
        let entity = Farmer {
            id: 1,
            version: 0,
            created_at: now,
            updated_at: now,
            fields: farmer(),
        };
        let row = entity.to_row().unwrap();
        assert_eq!(row["first_name"], "Somchai");
        assert_eq!(row["version"], 0);
        let back = Farmer::from_row(row).unwrap();
        assert_eq!(back.fields.zip_code, "90000");
    }
}
