//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::refresh::RefreshError;

/// Internal auth error kind used by the filter and extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Access token or refresh token header missing
    MissingCredentials,
    /// Access token unparsable, forged, or expired where expiry is enforced
    InvalidToken,
    /// Unknown user, refresh token mismatch, or refresh token expired
    Unauthorized,
    Internal,
}

/// Authentication error rendered as JSON.
#[derive(Debug)]
pub struct ApiAuthError {
    pub(super) kind: AuthErrorKind,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthErrorKind::InvalidToken | AuthErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::MissingCredentials => "Missing credentials",
            AuthErrorKind::InvalidToken => "Invalid access token",
            AuthErrorKind::Unauthorized => "Unauthorized",
            AuthErrorKind::Internal => "Internal error",
        }
    }
}

impl From<RefreshError> for ApiAuthError {
    fn from(e: RefreshError) -> Self {
        let kind = match e {
            RefreshError::MissingCredential => AuthErrorKind::MissingCredentials,
            RefreshError::InvalidAccessToken(_) => AuthErrorKind::InvalidToken,
            RefreshError::UnknownUser
            | RefreshError::RefreshTokenMismatch
            | RefreshError::RefreshTokenExpired => AuthErrorKind::Unauthorized,
            RefreshError::Directory(_) | RefreshError::Issue(_) => AuthErrorKind::Internal,
        };
        Self::new(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
