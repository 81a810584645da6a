//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::models::inspection::InspectionFields;
use crate::models::profile::FarmerFields;
use crate::models::rubber_farm::RubberFarmFields;
use crate::models::certificate::CertificateFields;
use crate::models::EntityFields;
use crate::services::audit_service::AuditService;
use crate::services::auth_service::AuthService;
use crate::services::certificate_service::CertificateService;
use crate::services::entity_service::EntityService;
use crate::services::evaluation_service::EvaluationService;
use crate::services::inspection_service::InspectionService;
use crate::storage::{AuditStore, MemoryStore, PgStore, RecordStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub records: Arc<dyn RecordStore>,
    pub audit_store: Arc<dyn AuditStore>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        config: Config,
        records: Arc<dyn RecordStore>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(Arc::new(config.clone())));
        Self {
            config,
            records,
            audit_store,
            auth_service,
        }
    }

    /// State backed by PostgreSQL for both entities and the audit log.
    pub fn with_postgres(config: Config, db: PgPool) -> Self {
        let store = Arc::new(PgStore::new(db));
        Self::new(config, store.clone(), store)
    }

    /// State backed by a fresh process-local store.
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    pub fn audit_service(&self) -> AuditService {
        AuditService::new(self.audit_store.clone())
    }

    pub fn entity_service<F: EntityFields>(&self) -> EntityService<F> {
        EntityService::new(self.records.clone(), self.audit_service())
    }

    pub fn inspection_service(&self) -> InspectionService {
        InspectionService::new(
            self.entity_service::<InspectionFields>(),
            self.entity_service::<RubberFarmFields>(),
        )
    }

    pub fn certificate_service(&self) -> CertificateService {
        CertificateService::new(
            self.entity_service::<CertificateFields>(),
            self.entity_service::<InspectionFields>(),
            self.entity_service::<RubberFarmFields>(),
            self.entity_service::<FarmerFields>(),
        )
    }

    pub fn evaluation_service<F: EntityFields>(&self) -> EvaluationService<F> {
        EvaluationService::new(self.entity_service::<F>())
    }
}

pub type SharedState = Arc<AppState>;
