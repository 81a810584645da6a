//! Authentication middleware.
//!
//! Validates `Authorization: Bearer <jwt>` access tokens and attaches the
//! caller's identity to the request. Role checks happen in handlers via
//! [`AuthExtension::require_role`], except for admin-only route groups
//! which sit behind [`admin_middleware`].

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, Result};
use crate::models::role::Role;
use crate::services::auth_service::{AuthService, Claims};

/// Extension that holds authenticated user information
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl AuthExtension {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with 403 unless the caller holds one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<()> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        Err(AppError::Authorization(format!(
            "Requires role: {}",
            names.join(" or ")
        )))
    }

    /// Fail with 403 unless the caller is `owner_user_id` or an admin.
    pub fn require_owner_or_admin(&self, owner_user_id: i64) -> Result<()> {
        if self.is_admin() || self.user_id == owner_user_id {
            return Ok(());
        }
        Err(AppError::Authorization(
            "Only the owner or an admin may change this record".to_string(),
        ))
    }

    /// Actor recorded in audit entries.
    pub fn actor(&self) -> Option<i64> {
        Some(self.user_id)
    }
}

fn bearer_token(request: &Request) -> Result<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))
}

fn authenticate(auth_service: &AuthService, request: &Request) -> Result<AuthExtension> {
    let token = bearer_token(request)?;
    let claims = auth_service.validate_access_token(token)?;
    Ok(AuthExtension::from(claims))
}

/// Authentication middleware function - requires a valid access token
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&auth_service, &request) {
        Ok(auth_ext) => {
            request.extensions_mut().insert(auth_ext);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Admin-only middleware - requires an authenticated admin user
pub async fn admin_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_ext = match authenticate(&auth_service, &request) {
        Ok(auth_ext) => auth_ext,
        Err(e) => return e.into_response(),
    };

    if !auth_ext.is_admin() {
        return AppError::Authorization("Admin access required".to_string()).into_response();
    }

    request.extensions_mut().insert(auth_ext);
    next.run(request).await
}
