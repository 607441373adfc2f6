//! Access token renewal from an (access token, refresh token) pair.
//!
//! The access token only identifies the user; it may already be expired.
//! The stored refresh token is the authority: it must match exactly and be
//! unexpired. Rotation is a compare-and-swap so that two requests racing on
//! the same refresh token cannot both succeed.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::directory::{DirectoryError, Identity, UserDirectory};
use super::issuer::{CredentialBundle, TokenIssuer};
use crate::jwt::{JwtError, now_secs};

/// Successful refresh: the user and their new bundle.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub identity: Identity,
    pub bundle: CredentialBundle,
}

#[derive(Clone)]
pub struct RefreshFlow {
    issuer: Arc<TokenIssuer>,
    directory: Arc<dyn UserDirectory>,
}

impl RefreshFlow {
    pub fn new(issuer: Arc<TokenIssuer>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { issuer, directory }
    }

    /// Validate the pair and issue a new bundle, rotating the stored refresh token.
    pub async fn run(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RefreshOutcome, RefreshError> {
        let access_token = access_token.trim();
        let refresh_token = refresh_token.trim();
        if access_token.is_empty() || refresh_token.is_empty() {
            return Err(RefreshError::MissingCredential);
        }

        let claims = self
            .issuer
            .codec()
            .decode(access_token, false)
            .map_err(RefreshError::InvalidAccessToken)?;

        let identity = self
            .directory
            .find_by_email(&claims.email)
            .await
            .map_err(RefreshError::Directory)?
            .ok_or(RefreshError::UnknownUser)?;

        // Email is reusable after account deletion; the subject is not
        if identity.user_id != claims.sub {
            return Err(RefreshError::UnknownUser);
        }

        let (Some(stored), Some(expires_at)) = (
            identity.refresh_token.as_deref(),
            identity.refresh_token_expires_at,
        ) else {
            return Err(RefreshError::RefreshTokenMismatch);
        };

        let now = now_secs().map_err(RefreshError::Issue)?;
        if expires_at <= now {
            return Err(RefreshError::RefreshTokenExpired);
        }

        if !bool::from(stored.as_bytes().ct_eq(refresh_token.as_bytes())) {
            return Err(RefreshError::RefreshTokenMismatch);
        }

        let bundle = self.issuer.issue(&identity).map_err(RefreshError::Issue)?;

        let rotated = self
            .directory
            .rotate_refresh_token(
                &identity.user_id,
                refresh_token,
                &bundle.refresh_token,
                bundle.refresh_token_expires_at,
            )
            .await
            .map_err(RefreshError::Directory)?;

        if !rotated {
            warn!(user = %identity.user_id, "Refresh token rotated concurrently");
            return Err(RefreshError::RefreshTokenMismatch);
        }

        info!(user = %identity.user_id, "Refreshed credentials");

        let identity = Identity {
            refresh_token: Some(bundle.refresh_token.clone()),
            refresh_token_expires_at: Some(bundle.refresh_token_expires_at),
            ..identity
        };

        Ok(RefreshOutcome { identity, bundle })
    }
}

/// Why a refresh was refused.
#[derive(Debug)]
pub enum RefreshError {
    /// Access token or refresh token absent
    MissingCredential,
    /// Access token failed signature, algorithm, or format checks
    InvalidAccessToken(JwtError),
    UnknownUser,
    RefreshTokenMismatch,
    RefreshTokenExpired,
    /// The user store failed
    Directory(DirectoryError),
    /// Issuing the new bundle failed
    Issue(JwtError),
}

impl RefreshError {
    /// Whether this is a credential rejection rather than an internal failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, RefreshError::Directory(_) | RefreshError::Issue(_))
    }
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshError::MissingCredential => write!(f, "Missing access or refresh token"),
            RefreshError::InvalidAccessToken(e) => write!(f, "Invalid access token: {}", e),
            RefreshError::UnknownUser => write!(f, "Unknown user"),
            RefreshError::RefreshTokenMismatch => write!(f, "Refresh token does not match"),
            RefreshError::RefreshTokenExpired => write!(f, "Refresh token has expired"),
            RefreshError::Directory(e) => write!(f, "User store error: {}", e),
            RefreshError::Issue(e) => write!(f, "Failed to issue credentials: {}", e),
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RefreshError::InvalidAccessToken(e) | RefreshError::Issue(e) => Some(e),
            RefreshError::Directory(e) => Some(e),
            _ => None,
        }
    }
}
