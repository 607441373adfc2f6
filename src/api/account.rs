//! Account endpoints: register, login, refresh, logout.
//!
//! Register and login hand out a fresh credential bundle and replace any
//! refresh token the user had (one active session per user).

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::{
    ApiAuth, AuthBackend, CredentialBundle, DirectoryError, Identity, IdentityProvider,
    Registration,
};
use crate::impl_has_auth_backend;

#[derive(Clone)]
pub struct AccountState {
    pub identities: Arc<dyn IdentityProvider>,
    pub auth: AuthBackend,
}

impl_has_auth_backend!(AccountState);

pub fn router(state: AccountState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/email-available", get(email_available))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
}

#[derive(Deserialize)]
struct EmailQuery {
    #[serde(default)]
    email: String,
}

#[derive(Serialize)]
struct SessionResponse {
    email: String,
    display_name: String,
    #[serde(flatten)]
    bundle: CredentialBundle,
}

// --- Helpers ---

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), ApiError> {
    if payload.display_name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.phone_number.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(ApiError::bad_request("All fields are required"));
    }
    if !looks_like_email(payload.email.trim()) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if !payload.phone_number.trim().chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request("Phone number must contain only digits"));
    }
    if payload.password != payload.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    Ok(())
}

/// Issue a bundle and make its refresh token the user's only valid one.
async fn start_session(state: &AccountState, identity: Identity) -> Result<SessionResponse, ApiError> {
    let bundle = state
        .auth
        .issuer
        .issue(&identity)
        .map_err(|e| ApiError::db_error("Failed to issue credentials", e))?;

    state
        .auth
        .directory
        .store_refresh_token(
            &identity.user_id,
            &bundle.refresh_token,
            bundle.refresh_token_expires_at,
        )
        .await
        .db_err("Failed to store refresh token")?;

    Ok(SessionResponse {
        email: identity.email,
        display_name: identity.display_name,
        bundle,
    })
}

// --- Handlers ---

async fn register(
    State(state): State<AccountState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&payload)?;

    let registration = Registration {
        display_name: payload.display_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone_number: payload.phone_number.trim().to_string(),
        password: payload.password,
    };

    let identity = match state.identities.register(registration).await {
        Ok(identity) => identity,
        Err(DirectoryError::EmailTaken) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to register user", e)),
    };

    info!(user = %identity.user_id, "Registered user");

    let session = start_session(&state, identity).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<AccountState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let identity = state
        .identities
        .verify_credentials(email, &payload.password)
        .await
        .db_err("Failed to verify credentials")?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    info!(user = %identity.user_id, "User logged in");

    Ok(Json(start_session(&state, identity).await?))
}

async fn email_available(
    State(state): State<AccountState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let email = query.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let registered = state
        .identities
        .is_email_registered(email)
        .await
        .db_err("Failed to check email availability")?;

    Ok(Json(!registered))
}

async fn refresh(
    State(state): State<AccountState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state
        .auth
        .refresh
        .run(&payload.access_token, &payload.refresh_token)
        .await
    {
        Ok(outcome) => Ok(Json(outcome.bundle)),
        Err(e) if e.is_rejection() => {
            warn!(error = %e, "Refresh rejected");
            Err(ApiError::bad_request("Invalid token"))
        }
        Err(e) => Err(ApiError::db_error("Failed to refresh credentials", e)),
    }
}

async fn logout(
    State(state): State<AccountState>,
    ApiAuth(user): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .directory
        .clear_refresh_token(&user.user_id)
        .await
        .db_err("Failed to clear refresh token")?;

    info!(user = %user.user_id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}
