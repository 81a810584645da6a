//! Application error types and result alias.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Machine-readable discriminator carried by every lock conflict body.
pub const OPTIMISTIC_LOCK_FAILED: &str = "OPTIMISTIC_LOCK_FAILED";

/// Message returned when a mutating request arrives without a `version`.
pub const VERSION_REQUIRED: &str = "Version is required for optimistic locking";

/// A version-checked write lost the race: the stored row has moved on.
///
/// `actual_version` is the version read back from the store right after
/// the conditional write affected zero rows, so it is never equal to
/// `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{entity_name} {entity_id} was modified concurrently (expected version {expected_version}, found {actual_version})"
)]
pub struct OptimisticLockError {
    pub entity_name: String,
    pub entity_id: i64,
    pub expected_version: i32,
    pub actual_version: i32,
}

/// Wire shape of a lock conflict (HTTP 409 and bulk error entries).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimisticLockBody {
    /// Always `OPTIMISTIC_LOCK_FAILED`
    pub error: String,
    pub message: String,
    /// Localized refresh-and-retry instruction
    pub user_message: String,
    pub entity_name: String,
    pub entity_id: i64,
    pub expected_version: i32,
    pub actual_version: i32,
    /// Always true: the client must reload before retrying
    pub requires_refresh: bool,
}

impl OptimisticLockError {
    pub fn new(
        entity_name: impl Into<String>,
        entity_id: i64,
        expected_version: i32,
        actual_version: i32,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_id,
            expected_version,
            actual_version,
        }
    }

    pub fn error_code(&self) -> &'static str {
        OPTIMISTIC_LOCK_FAILED
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Thai instruction shown to end users.
    pub fn user_message(&self) -> String {
        "ข้อมูลนี้ถูกแก้ไขโดยผู้ใช้อื่นแล้ว กรุณารีเฟรชหน้าเพื่อโหลดข้อมูลล่าสุดแล้วลองใหม่อีกครั้ง"
            .to_string()
    }

    pub fn to_response_body(&self) -> OptimisticLockBody {
        OptimisticLockBody {
            error: self.error_code().to_string(),
            message: self.message(),
            user_message: self.user_message(),
            entity_name: self.entity_name.clone(),
            entity_id: self.entity_id,
            expected_version: self.expected_version,
            actual_version: self.actual_version,
            requires_refresh: true,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization error
    #[error("Access denied: {0}")]
    Authorization(String),

    /// Not found error
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Version-checked update lost to a concurrent writer
    #[error(transparent)]
    OptimisticLock(#[from] OptimisticLockError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Address parse error
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(format!("migration failed: {}", e))
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::OptimisticLock(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Io(_)
            | AppError::AddrParse(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this error. Server-side failures never carry their detail.
    pub fn to_body(&self) -> serde_json::Value {
        let (code, message) = match self {
            AppError::OptimisticLock(conflict) => {
                return json!(conflict.to_response_body());
            }
            AppError::Config(_) => ("CONFIG_ERROR", "Server misconfigured".to_string()),
            AppError::Database(_) => ("DATABASE_ERROR", "Database operation failed".to_string()),
            AppError::Authentication(msg) => ("AUTH_ERROR", msg.clone()),
            AppError::Authorization(msg) => ("FORBIDDEN", msg.clone()),
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::Io(_) => ("IO_ERROR", "IO operation failed".to_string()),
            AppError::AddrParse(_) => ("ADDR_PARSE_ERROR", "Invalid address".to_string()),
            AppError::Json(_) => ("JSON_ERROR", "Invalid JSON".to_string()),
            AppError::Jwt(_) => ("JWT_ERROR", "Invalid token".to_string()),
            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
        };

        json!({
            "code": code,
            "message": message,
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::OptimisticLock(conflict) => tracing::warn!(
                entity = %conflict.entity_name,
                id = conflict.entity_id,
                expected = conflict.expected_version,
                actual = conflict.actual_version,
                "Optimistic lock conflict"
            ),
            _ if status.is_server_error() => tracing::error!(error = %self, "Request error"),
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        (status, Json(self.to_body())).into_response()
    }
}
