//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::headers::bearer_token;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Extractor for endpoints that require an authenticated user.
///
/// Behind the re-auth filter it reuses the user the filter attached
/// (including after a silent refresh). Elsewhere it requires a bearer token
/// with a valid signature that has not expired.
pub struct ApiAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(ApiAuth(user.clone()));
        }

        let token = bearer_token(&parts.headers)
            .ok_or(ApiAuthError::new(AuthErrorKind::MissingCredentials))?;

        let claims = state
            .auth()
            .issuer
            .codec()
            .decode(token, true)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                ApiAuthError::new(AuthErrorKind::InvalidToken)
            })?;

        Ok(ApiAuth(AuthenticatedUser::from(claims)))
    }
}
