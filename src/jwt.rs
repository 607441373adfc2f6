//! Signed access tokens (HS256).
//!
//! The codec signs a fixed claim set together with issuer, audience, and
//! expiry. Decoding always checks signature, algorithm, issuer, and audience;
//! expiry enforcement is optional so the refresh flow can still identify the
//! owner of a recently expired token.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::AuthSettings;

/// The only algorithm this codec signs with or accepts.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Unique token id, fresh per encode
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Email of the user
    pub email: String,
    /// Display name of the user
    pub name: String,
    pub iss: String,
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Identity fields a token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
}

/// Encodes and validates access tokens with a symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&settings.signing_key),
            decoding_key: DecodingKey::from_secret(&settings.signing_key),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    /// Sign a token for `subject` that expires at `expires_at`.
    /// A fresh `jti` and the current time as `iat` are injected on every call.
    pub fn encode(&self, subject: TokenSubject<'_>, expires_at: u64) -> Result<String, JwtError> {
        let claims = AccessClaims {
            sub: subject.user_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now_secs()?,
            email: subject.email.to_string(),
            name: subject.display_name.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at,
        };

        jsonwebtoken::encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Validate a token and return its claims.
    /// With `enforce_expiry` off, a token past its expiry still decodes.
    pub fn decode(&self, token: &str, enforce_expiry: bool) -> Result<AccessClaims, JwtError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = enforce_expiry;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: u64,
}

/// Read the `exp` claim without checking the signature.
/// Only for deciding whether a refresh is due; never for trusting the token.
pub fn peek_expiry(token: &str) -> Result<u64, JwtError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(JwtError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| JwtError::Malformed)?;
    let claims: ExpiryOnly = serde_json::from_slice(&bytes).map_err(|_| JwtError::Malformed)?;
    Ok(claims.exp)
}

/// Current Unix time in seconds.
pub fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur during token operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Signature does not match the payload
    InvalidSignature,
    /// Header names an algorithm other than HS256
    WrongAlgorithm,
    /// Token is past its expiry (only with expiry enforcement)
    Expired,
    /// Issuer, audience, or a required claim does not match
    ClaimMismatch,
    /// Not a well-formed token, including a corrupted header or segment layout
    Malformed,
    /// System time error
    TimeError,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => JwtError::WrongAlgorithm,
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => JwtError::ClaimMismatch,
            _ => JwtError::Malformed,
        }
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::InvalidSignature => write!(f, "Invalid token signature"),
            JwtError::WrongAlgorithm => write!(f, "Unexpected token algorithm"),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::ClaimMismatch => write!(f, "Token claims do not match"),
            JwtError::Malformed => write!(f, "Malformed token"),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}
