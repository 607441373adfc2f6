//! Authentication state shared by routers.

use std::sync::Arc;

use super::directory::UserDirectory;
use super::issuer::TokenIssuer;
use super::refresh::RefreshFlow;
use crate::config::AuthSettings;

/// Everything the filter and extractors need, built once from settings.
#[derive(Clone)]
pub struct AuthBackend {
    pub issuer: Arc<TokenIssuer>,
    pub refresh: RefreshFlow,
    pub directory: Arc<dyn UserDirectory>,
    /// Tokens expiring within this many seconds are refreshed early
    pub refresh_skew_secs: u64,
}

impl AuthBackend {
    pub fn new(settings: &AuthSettings, directory: Arc<dyn UserDirectory>) -> Self {
        let issuer = Arc::new(TokenIssuer::new(settings));
        Self {
            refresh: RefreshFlow::new(issuer.clone(), directory.clone()),
            issuer,
            directory,
            refresh_skew_secs: settings.refresh_skew_secs,
        }
    }
}

/// Trait for state types that provide the auth backend.
pub trait HasAuthBackend {
    fn auth(&self) -> &AuthBackend;
}

/// For routers whose whole state is the backend.
impl HasAuthBackend for AuthBackend {
    fn auth(&self) -> &AuthBackend {
        self
    }
}

/// Macro to implement `HasAuthBackend` for state structs with an
/// `auth: AuthBackend` field.
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// pub struct MyState {
///     pub auth: AuthBackend,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn auth(&self) -> &$crate::auth::AuthBackend {
                &self.auth
            }
        }
    };
}
