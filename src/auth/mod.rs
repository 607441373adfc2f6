//! JWT authentication with rotating refresh tokens.
//!
//! Dual-token system: short-lived access tokens (stateless, HS256) and
//! long-lived opaque refresh tokens stored one per user. Protected routes
//! run behind an inline re-auth filter that renews expired access tokens
//! and hands the new pair back in response headers.

mod directory;
mod errors;
mod extractors;
mod filter;
mod headers;
mod issuer;
mod refresh;
mod refresh_token;
mod state;
mod types;

pub use directory::{DirectoryError, Identity, IdentityProvider, Registration, UserDirectory};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::ApiAuth;
pub use filter::require_fresh_credentials;
pub use headers::{
    NEW_ACCESS_TOKEN_EXPIRES_HEADER, NEW_ACCESS_TOKEN_HEADER, NEW_REFRESH_TOKEN_EXPIRES_HEADER,
    NEW_REFRESH_TOKEN_HEADER, REFRESH_TOKEN_HEADER, bearer_token,
};
pub use issuer::{CredentialBundle, TokenIssuer};
pub use refresh::{RefreshError, RefreshFlow, RefreshOutcome};
pub use refresh_token::{REFRESH_TOKEN_BYTES, generate_refresh_token};
pub use state::{AuthBackend, HasAuthBackend};
pub use types::AuthenticatedUser;
