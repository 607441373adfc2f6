//! Seams between the token core and the user store.
//!
//! `UserDirectory` is everything the refresh flow needs: look a user up by
//! email and overwrite the stored refresh token. `IdentityProvider` owns
//! password handling for login and registration.

use async_trait::async_trait;

/// A user as seen by the auth core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque unique identifier (UUID)
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    /// Currently valid refresh token, if a session exists
    pub refresh_token: Option<String>,
    /// Refresh token expiry (Unix timestamp)
    pub refresh_token_expires_at: Option<u64>,
}

/// Input for creating a new identity.
#[derive(Debug, Clone)]
pub struct Registration {
    pub display_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Case-insensitive lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError>;

    /// Unconditionally replace the stored refresh token.
    async fn store_refresh_token(
        &self,
        user_id: &str,
        refresh_token: &str,
        expires_at: u64,
    ) -> Result<(), DirectoryError>;

    /// Replace the stored refresh token only if it still equals `current`.
    /// Returns false when another request rotated it first.
    async fn rotate_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        replacement: &str,
        expires_at: u64,
    ) -> Result<bool, DirectoryError>;

    /// Drop the stored refresh token (logout).
    async fn clear_refresh_token(&self, user_id: &str) -> Result<(), DirectoryError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, registration: Registration) -> Result<Identity, DirectoryError>;

    /// Returns the identity when the password matches, `None` otherwise.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, DirectoryError>;

    async fn is_email_registered(&self, email: &str) -> Result<bool, DirectoryError>;
}

/// Errors raised by user store implementations.
#[derive(Debug)]
pub enum DirectoryError {
    /// Another account already uses this email
    EmailTaken,
    Database(sqlx::Error),
    PasswordHash(String),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::EmailTaken => write!(f, "Email is already registered"),
            DirectoryError::Database(e) => write!(f, "Database error: {}", e),
            DirectoryError::PasswordHash(msg) => write!(f, "Password hashing failed: {}", msg),
        }
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        DirectoryError::Database(e)
    }
}
