//! HTTP request handlers.

pub mod advice_and_defects;
pub mod audit_logs;
pub mod certificates;
pub mod data_records;
pub mod health;
pub mod inspection_items;
pub mod inspections;
pub mod profiles;
pub mod requirements;
pub mod rubber_farms;
