//! Domain models.

pub mod audit_log;
pub mod certificate;
pub mod entity;
pub mod inspection;
pub mod profile;
pub mod role;
pub mod rubber_farm;

pub use entity::{EntityFields, EntityKind, EntityRow, VersionedEntity};
