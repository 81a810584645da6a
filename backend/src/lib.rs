//! Rubber Cert - Backend Library
//!
//! Rubber farm certification records: farmer and farm registration,
//! inspections and their evaluations, certificates, and an audit trail of
//! every change. Concurrent edits are guarded by per-record versions.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
