//! Authentication user types.

use super::directory::Identity;
use crate::jwt::AccessClaims;

/// Authenticated user, attached to the request by the re-auth filter or
/// resolved from a bearer token by `ApiAuth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}

impl From<AccessClaims> for AuthenticatedUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            display_name: claims.name,
        }
    }
}

impl From<&Identity> for AuthenticatedUser {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
        }
    }
}
