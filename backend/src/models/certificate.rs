//! Certificate model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity::{require_positive_id, EntityFields, EntityKind, VersionedEntity};
use crate::error::{AppError, Result};

pub type Certificate = VersionedEntity<CertificateFields>;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateFields {
    pub inspection_id: i64,
    /// Location of the rendered certificate, produced outside this service
    pub pdf_file_url: Option<String>,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub active: bool,
    pub cancel_request_flag: bool,
    pub cancel_request_detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CertificateChanges {
    pub pdf_file_url: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    /// Lifecycle flags. Only revoke and cancel-request set them; a plain
    /// edit cannot.
    #[serde(skip_deserializing)]
    #[schema(read_only)]
    pub active: Option<bool>,
    #[serde(skip_deserializing)]
    #[schema(read_only)]
    pub cancel_request_flag: Option<bool>,
    pub cancel_request_detail: Option<String>,
}

pub(crate) fn validate_validity_window(effective: NaiveDate, expiry: NaiveDate) -> Result<()> {
    if expiry <= effective {
        return Err(AppError::Validation(format!(
            "expiry_date {} must be after effective_date {}",
            expiry, effective
        )));
    }
    Ok(())
}

impl EntityFields for CertificateFields {
    const KIND: EntityKind = EntityKind::Certificate;
    type Changes = CertificateChanges;

    fn parent_id(&self) -> i64 {
        self.inspection_id
    }

    fn validate(&self) -> Result<()> {
        require_positive_id("inspection_id", self.inspection_id)?;
        validate_validity_window(self.effective_date, self.expiry_date)
    }

    fn validate_changes(changes: &CertificateChanges) -> Result<()> {
        if let (Some(effective), Some(expiry)) = (changes.effective_date, changes.expiry_date) {
            validate_validity_window(effective, expiry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_window() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(validate_validity_window(d("2025-01-01"), d("2027-01-01")).is_ok());
        assert!(validate_validity_window(d("2025-01-01"), d("2025-01-01")).is_err());
        assert!(validate_validity_window(d("2025-01-01"), d("2024-12-31")).is_err());
    }

    #[test]
    fn test_lifecycle_flags_not_accepted_from_clients() {
        let changes: CertificateChanges = serde_json::from_value(serde_json::json!({
            "active": true,
            "cancel_request_flag": true,
            "pdf_file_url": "https://files.example.com/c.pdf"
        }))
        .unwrap();
        assert_eq!(changes.active, None);
        assert_eq!(changes.cancel_request_flag, None);
        assert!(changes.pdf_file_url.is_some());
    }
}
