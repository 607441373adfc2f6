//! Credential headers on requests and responses.

use axum::http::{HeaderMap, HeaderValue, header};

use super::issuer::CredentialBundle;

/// Request header carrying the refresh token on protected routes.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Response headers carrying a silently refreshed bundle.
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const NEW_ACCESS_TOKEN_EXPIRES_HEADER: &str = "x-access-token-expires-at";
pub const NEW_REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const NEW_REFRESH_TOKEN_EXPIRES_HEADER: &str = "x-refresh-token-expires-at";

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extract the refresh token from its dedicated header.
pub fn refresh_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers.get(REFRESH_TOKEN_HEADER)?.to_str().ok()?.trim();
    (!token.is_empty()).then_some(token)
}

/// Attach all four bundle headers, or none if any value is not a valid header.
pub fn attach_bundle(headers: &mut HeaderMap, bundle: &CredentialBundle) -> bool {
    let values = (
        HeaderValue::from_str(&bundle.access_token),
        HeaderValue::from_str(&bundle.refresh_token),
    );
    let (Ok(access), Ok(refresh)) = values else {
        return false;
    };

    headers.insert(NEW_ACCESS_TOKEN_HEADER, access);
    headers.insert(
        NEW_ACCESS_TOKEN_EXPIRES_HEADER,
        HeaderValue::from(bundle.access_token_expires_at),
    );
    headers.insert(NEW_REFRESH_TOKEN_HEADER, refresh);
    headers.insert(
        NEW_REFRESH_TOKEN_EXPIRES_HEADER,
        HeaderValue::from(bundle.refresh_token_expires_at),
    );
    true
}
