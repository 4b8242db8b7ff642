//! Axum extractors for bearer-token authentication.

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::auth::token::{decode_token, Claims};
use crate::errors::AppError;
use crate::models::user::{UserRole, UserType};
use crate::state::AppState;

/// Any authenticated user. Validates the `Authorization: Bearer` token and
/// exposes the verified claims.
pub struct AuthUser(pub Claims);

/// An authenticated admin. Rejects with 403 for non-admin callers.
pub struct AdminUser(pub Claims);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(token, &state.config.jwt_secret)?;
        Ok(AuthUser(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}

impl AuthUser {
    /// Rejects callers that are not company accounts.
    pub fn require_company(&self) -> Result<(), AppError> {
        if self.0.user_type != UserType::Company {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}
