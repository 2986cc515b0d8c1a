use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::errors::ApiError;
use crate::auth::jwt::verify_token;
use crate::domain::user::{Role, User};
use crate::state::AppState;

/// Authenticated caller, loaded from the bearer token
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(AuthUser(user): AuthUser) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", user.full_name()))
/// }
/// ```
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Extract the authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        // Extract bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>"))?;

        let claims = verify_token(token, &state.auth.jwt_secret).map_err(|e| {
            tracing::warn!(error = %e, "rejected bearer token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

        Ok(AuthUser(user))
    }
}

impl AuthUser {
    /// 403 unless the caller holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("You do not have permission to perform this action"))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_role(&[Role::Admin])
    }
}
