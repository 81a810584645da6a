//! Certificate lifecycle: issue, revoke and farmer cancellation requests.
//!
//! Revocation and cancellation requests are ordinary version-checked
//! updates, so they conflict exactly like any other edit.

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::certificate::{
    validate_validity_window, Certificate, CertificateChanges, CertificateFields,
};
use crate::models::entity::require_non_empty;
use crate::models::inspection::{InspectionFields, InspectionResult};
use crate::models::profile::FarmerFields;
use crate::models::rubber_farm::RubberFarmFields;
use crate::services::entity_service::EntityService;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueCertificateRequest {
    pub inspection_id: i64,
    pub pdf_file_url: Option<String>,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

#[derive(Clone)]
pub struct CertificateService {
    certificates: EntityService<CertificateFields>,
    inspections: EntityService<InspectionFields>,
    farms: EntityService<RubberFarmFields>,
    farmers: EntityService<FarmerFields>,
}

impl CertificateService {
    pub fn new(
        certificates: EntityService<CertificateFields>,
        inspections: EntityService<InspectionFields>,
        farms: EntityService<RubberFarmFields>,
        farmers: EntityService<FarmerFields>,
    ) -> Self {
        Self {
            certificates,
            inspections,
            farms,
            farmers,
        }
    }

    pub fn entities(&self) -> &EntityService<CertificateFields> {
        &self.certificates
    }

    /// Issue an active certificate for a passed inspection.
    pub async fn issue(&self, req: IssueCertificateRequest, actor: Option<i64>) -> Result<Certificate> {
        validate_validity_window(req.effective_date, req.expiry_date)?;

        let inspection = self
            .inspections
            .find(req.inspection_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Inspection {} does not exist", req.inspection_id))
            })?;
        if inspection.fields.inspection_result != InspectionResult::Passed {
            return Err(AppError::Validation(format!(
                "Inspection {} has not passed; no certificate can be issued",
                inspection.id
            )));
        }

        let existing = self.certificates.list_by_parent(inspection.id).await?;
        if let Some(active) = existing.iter().find(|c| c.fields.active) {
            return Err(AppError::Validation(format!(
                "Inspection {} already has active certificate {}",
                inspection.id, active.id
            )));
        }

        let certificate = self
            .certificates
            .create(
                CertificateFields {
                    inspection_id: inspection.id,
                    pdf_file_url: req.pdf_file_url,
                    effective_date: req.effective_date,
                    expiry_date: req.expiry_date,
                    active: true,
                    cancel_request_flag: false,
                    cancel_request_detail: None,
                },
                actor,
            )
            .await?;

        tracing::info!(id = certificate.id, inspection = inspection.id, "Certificate issued");
        Ok(certificate)
    }

    /// Deactivate a certificate. Any pending cancellation request is closed.
    pub async fn revoke(&self, id: i64, version: i32, actor: Option<i64>) -> Result<Certificate> {
        let current = self.certificates.get(id).await?;
        if !current.fields.active {
            return Err(AppError::Validation(format!(
                "Certificate {} is already revoked",
                id
            )));
        }

        let changes = CertificateChanges {
            active: Some(false),
            cancel_request_flag: Some(false),
            ..Default::default()
        };
        let revoked = self.certificates.update(id, &changes, version, actor).await?;

        tracing::info!(id, version = revoked.version, "Certificate revoked");
        Ok(revoked)
    }

    /// Flag an active certificate for cancellation with the farmer's reason.
    pub async fn request_cancellation(
        &self,
        id: i64,
        version: i32,
        detail: &str,
        actor: Option<i64>,
    ) -> Result<Certificate> {
        require_non_empty("cancel_request_detail", detail)?;

        let current = self.certificates.get(id).await?;
        if !current.fields.active {
            return Err(AppError::Validation(format!(
                "Certificate {} is not active",
                id
            )));
        }

        let changes = CertificateChanges {
            cancel_request_flag: Some(true),
            cancel_request_detail: Some(detail.trim().to_string()),
            ..Default::default()
        };
        self.certificates.update(id, &changes, version, actor).await
    }

    /// User id of the farmer who owns the certified farm.
    pub async fn owner_user_id(&self, id: i64) -> Result<i64> {
        let certificate = self.certificates.get(id).await?;
        let inspection = self.inspections.get(certificate.fields.inspection_id).await?;
        let farm = self.farms.get(inspection.fields.rubber_farm_id).await?;
        let farmer = self.farmers.get(farm.fields.farmer_id).await?;
        Ok(farmer.fields.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inspection::{InspectionChanges, InspectionStatus};
    use crate::services::audit_service::AuditService;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    struct Fixture {
        service: CertificateService,
        inspection_id: i64,
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn fixture(result: InspectionResult) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditService::new(store.clone());
        let service = CertificateService::new(
            EntityService::new(store.clone(), audit.clone()),
            EntityService::new(store.clone(), audit.clone()),
            EntityService::new(store.clone(), audit.clone()),
            EntityService::new(store, audit),
        );

        let farmer = service
            .farmers
            .create(
                FarmerFields {
                    user_id: 77,
                    name_title: "Mr".into(),
                    first_name: "Somchai".into(),
                    last_name: "Jaidee".into(),
                    id_card: "1101700203451".into(),
                    phone_number: "0812345678".into(),
                    email: "somchai@example.com".into(),
                    house_no: "12/3".into(),
                    village_name: "Ban Khuan".into(),
                    moo: 4,
                    road: None,
                    alley: None,
                    sub_district: "Khuan Lang".into(),
                    district: "Hat Yai".into(),
                    province_name: "Songkhla".into(),
                    zip_code: "90110".into(),
                },
                None,
            )
            .await
            .unwrap();
        let farm = service
            .farms
            .create(
                RubberFarmFields {
                    farmer_id: farmer.id,
                    village_name: "Ban Khuan".into(),
                    moo: 4,
                    road: None,
                    alley: None,
                    sub_district: "Khuan Lang".into(),
                    district: "Hat Yai".into(),
                    province: "Songkhla".into(),
                    location: None,
                    product_distribution_type: "latex".into(),
                },
                None,
            )
            .await
            .unwrap();
        let inspection = service
            .inspections
            .create(
                InspectionFields {
                    inspection_no: "INS-1".into(),
                    inspection_date_and_time: Utc::now(),
                    inspection_type_id: 1,
                    inspection_status: InspectionStatus::Pending,
                    inspection_result: InspectionResult::Pending,
                    auditor_chief_id: 1,
                    rubber_farm_id: farm.id,
                },
                None,
            )
            .await
            .unwrap();
        if result != InspectionResult::Pending {
            service
                .inspections
                .update(
                    inspection.id,
                    &InspectionChanges {
                        inspection_status: Some(InspectionStatus::Completed),
                        inspection_result: Some(result),
                        ..Default::default()
                    },
                    0,
                    None,
                )
                .await
                .unwrap();
        }

        Fixture {
            service,
            inspection_id: inspection.id,
        }
    }

    fn issue_request(inspection_id: i64) -> IssueCertificateRequest {
        IssueCertificateRequest {
            inspection_id,
            pdf_file_url: None,
            effective_date: date("2025-01-01"),
            expiry_date: date("2027-01-01"),
        }
    }

    #[tokio::test]
    async fn test_issue_requires_passed_inspection() {
        let fx = fixture(InspectionResult::Failed).await;
        let err = fx
            .service
            .issue(issue_request(fx.inspection_id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = fx.service.issue(issue_request(999), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_issue_rejects_second_active_certificate() {
        let fx = fixture(InspectionResult::Passed).await;
        let cert = fx
            .service
            .issue(issue_request(fx.inspection_id), Some(3))
            .await
            .unwrap();
        assert!(cert.fields.active);
        assert_eq!(cert.version, 0);

        assert!(fx
            .service
            .issue(issue_request(fx.inspection_id), Some(3))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_revoke_and_cancel_request() {
        let fx = fixture(InspectionResult::Passed).await;
        let cert = fx
            .service
            .issue(issue_request(fx.inspection_id), None)
            .await
            .unwrap();

        let requested = fx
            .service
            .request_cancellation(cert.id, 0, "Farm sold", None)
            .await
            .unwrap();
        assert!(requested.fields.cancel_request_flag);
        assert_eq!(requested.version, 1);

        // Stale version from before the cancellation request.
        assert!(matches!(
            fx.service.revoke(cert.id, 0, None).await,
            Err(AppError::OptimisticLock(_))
        ));

        let revoked = fx.service.revoke(cert.id, 1, None).await.unwrap();
        assert!(!revoked.fields.active);
        assert!(!revoked.fields.cancel_request_flag);
        assert_eq!(revoked.version, 2);

        assert!(matches!(
            fx.service.revoke(cert.id, 2, None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_lookup_walks_to_farmer() {
        let fx = fixture(InspectionResult::Passed).await;
        let cert = fx
            .service
            .issue(issue_request(fx.inspection_id), None)
            .await
            .unwrap();
        assert_eq!(fx.service.owner_user_id(cert.id).await.unwrap(), 77);
    }

    #[tokio::test]
    async fn test_cancel_request_requires_detail() {
        let fx = fixture(InspectionResult::Passed).await;
        let cert = fx
            .service
            .issue(issue_request(fx.inspection_id), None)
            .await
            .unwrap();
        assert!(matches!(
            fx.service.request_cancellation(cert.id, 0, "  ", None).await,
            Err(AppError::Validation(_))
        ));
    }
}
