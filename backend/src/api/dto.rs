//! Shared Data Transfer Objects (DTOs) for API handlers.
//!
//! Mutating requests on versioned entities carry the version the client
//! last read next to the fields they change:
//!
//! ```json
//! { "evaluation_result": "pass", "note": "checked", "version": 3 }
//! ```

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, Result, VERSION_REQUIRED};

/// JSON request body. Malformed or mistyped bodies are rejected with the
/// usual `VALIDATION_ERROR` envelope instead of axum's plain-text 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of items across all pages
    pub total: i64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination from query parameters and total count.
    pub fn from_query_and_total(query: &PaginationQuery, total: i64) -> Self {
        let page = query.page();
        let per_page = query.per_page();
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (per_page as f64)).ceil() as u32
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Query parameters for paginated list requests.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Requested page number (default: 1)
    pub page: Option<u32>,
    /// Requested items per page (default: 20, max: 100)
    pub per_page: Option<u32>,
}

impl PaginationQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        ((self.page() - 1) as i64) * self.per_page() as i64
    }
}

/// Body of an update: the changed fields plus the expected version.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionedRequest<C> {
    pub version: Option<i32>,
    #[serde(flatten)]
    pub changes: C,
}

impl<C> VersionedRequest<C> {
    pub fn version(&self) -> Result<i32> {
        require_version(self.version)
    }
}

/// `?version=` on deletes.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct VersionQuery {
    /// Version the client last read
    pub version: Option<i32>,
}

/// Body of state transitions that change no client-supplied fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VersionOnlyRequest {
    pub version: Option<i32>,
}

pub fn require_version(version: Option<i32>) -> Result<i32> {
    version.ok_or_else(|| AppError::Validation(VERSION_REQUIRED.to_string()))
}

/// Response for list endpoints that return every child of a parent record.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}
