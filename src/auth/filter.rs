//! Inline re-authentication for protected routes.
//!
//! Applied with `middleware::from_fn_with_state` on the routers that opt in.
//! A request must carry a bearer access token and an `x-refresh-token`
//! header. A fresh access token passes straight through. An expired one
//! (or one inside the refresh skew) is renewed via the refresh flow, the
//! handler still runs, and the new bundle rides along on the response headers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::headers::{attach_bundle, bearer_token, refresh_token};
use super::state::AuthBackend;
use super::types::AuthenticatedUser;
use crate::jwt::{now_secs, peek_expiry};

pub async fn require_fresh_credentials(
    State(auth): State<AuthBackend>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let (Some(access), Some(refresh)) = (bearer_token(headers), refresh_token(headers)) else {
        return ApiAuthError::new(AuthErrorKind::MissingCredentials).into_response();
    };
    let access_token = access.to_string();
    let refresh_token = refresh.to_string();

    let Ok(expires_at) = peek_expiry(&access_token) else {
        return ApiAuthError::new(AuthErrorKind::InvalidToken).into_response();
    };
    let now = match now_secs() {
        Ok(now) => now,
        Err(e) => {
            error!(error = %e, "Failed to read clock");
            return ApiAuthError::new(AuthErrorKind::Internal).into_response();
        }
    };

    if expires_at > now.saturating_add(auth.refresh_skew_secs) {
        // Not due for refresh; the token must still be genuine
        return match auth.issuer.codec().decode(&access_token, true) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(AuthenticatedUser::from(claims));
                next.run(request).await
            }
            Err(e) => {
                warn!(error = %e, "Rejected access token");
                ApiAuthError::new(AuthErrorKind::InvalidToken).into_response()
            }
        };
    }

    let outcome = match auth.refresh.run(&access_token, &refresh_token).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_rejection() {
                warn!(error = %e, "Inline refresh rejected");
            } else {
                error!(error = %e, "Inline refresh failed");
            }
            return ApiAuthError::from(e).into_response();
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(&outcome.identity));

    let mut response = next.run(request).await;
    if !attach_bundle(response.headers_mut(), &outcome.bundle) {
        error!(user = %outcome.identity.user_id, "Refreshed bundle is not a valid header value");
        return ApiAuthError::new(AuthErrorKind::Internal).into_response();
    }
    response
}
