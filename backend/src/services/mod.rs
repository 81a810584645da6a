//! Business logic services.

pub mod audit_service;
pub mod auth_service;
pub mod certificate_service;
pub mod entity_service;
pub mod evaluation_service;
pub mod inspection_service;
pub mod optimistic_lock;
