//! Authenticated-user extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiError;
use super::routes::AppState;

/// The authenticated requester, extracted from the bearer token.
///
/// The token is validated against the secret shared with the auth
/// collaborator; its `sub` claim is trusted as the current user id.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(ApiError::unauthorized)?;

        let claims = state.jwt.validate(token).map_err(|_| ApiError::unauthorized())?;

        Ok(Self { user_id: claims.sub, username: claims.username })
    }
}
