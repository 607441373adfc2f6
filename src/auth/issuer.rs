//! Credential bundle issuance.

use serde::Serialize;

use super::directory::Identity;
use super::refresh_token::generate_refresh_token;
use crate::config::AuthSettings;
use crate::jwt::{JwtError, TokenCodec, TokenSubject, now_secs};

/// Access token and refresh token issued together.
/// Each issuance replaces the previous bundle of the same user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialBundle {
    pub access_token: String,
    /// Unix timestamp
    pub access_token_expires_at: u64,
    pub refresh_token: String,
    /// Unix timestamp
    pub refresh_token_expires_at: u64,
}

/// Builds credential bundles. Never persists anything; callers store the
/// refresh token.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    access_lifetime_secs: u64,
    refresh_lifetime_secs: u64,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            codec: TokenCodec::new(settings),
            access_lifetime_secs: settings.access_lifetime_secs,
            refresh_lifetime_secs: settings.refresh_lifetime_secs,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue a fresh bundle for `identity`.
    pub fn issue(&self, identity: &Identity) -> Result<CredentialBundle, JwtError> {
        let now = now_secs()?;
        let access_token_expires_at = now.saturating_add(self.access_lifetime_secs);

        let access_token = self.codec.encode(
            TokenSubject {
                user_id: &identity.user_id,
                email: &identity.email,
                display_name: &identity.display_name,
            },
            access_token_expires_at,
        )?;

        Ok(CredentialBundle {
            access_token,
            access_token_expires_at,
            refresh_token: generate_refresh_token(),
            refresh_token_expires_at: now.saturating_add(self.refresh_lifetime_secs),
        })
    }
}
