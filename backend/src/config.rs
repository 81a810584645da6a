//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Which record store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!(
                "Unknown STORE_BACKEND '{}' (expected 'postgres' or 'memory')",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Record store backend
    pub store_backend: StoreBackend,

    /// Maximum pooled database connections
    pub db_max_connections: u32,

    /// JWT secret key used to validate bearer tokens
    pub jwt_secret: String,

    /// JWT access token expiry in minutes
    pub jwt_access_token_expiry_minutes: i64,

    /// Default age cutoff for the audit log retention purge
    pub audit_retention_days: i64,

    /// Allowed CORS origins; `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
}

redacted_debug!(Config {
    redact_option database_url,
    show bind_address,
    show store_backend,
    show db_max_connections,
    redact jwt_secret,
    show jwt_access_token_expiry_minutes,
    show audit_retention_days,
    show cors_origins,
});

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let store_backend =
            StoreBackend::parse(&env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".into()))?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::Config("DATABASE_URL not set".into()));
        }

        let config = Self {
            database_url,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            store_backend,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::Config("JWT_SECRET not set".into()))?,
            jwt_access_token_expiry_minutes: env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
            audit_retention_days: env::var("AUDIT_RETENTION_DAYS")
                .unwrap_or_else(|_| "365".into())
                .parse()
                .unwrap_or(365),
            cors_origins: env::var("CORS_ORIGINS").ok().map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that parse but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.audit_retention_days < 0 {
            return Err(AppError::Config(format!(
                "AUDIT_RETENTION_DAYS must not be negative (got {})",
                self.audit_retention_days
            )));
        }
        Ok(())
    }

    /// In-memory configuration used by tests and local tooling.
    pub fn for_memory_store(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            bind_address: "127.0.0.1:0".into(),
            store_backend: StoreBackend::Memory,
            db_max_connections: 1,
            jwt_secret: jwt_secret.into(),
            jwt_access_token_expiry_minutes: 60,
            audit_retention_days: 365,
            cors_origins: None,
        }
    }
}
