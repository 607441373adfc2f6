//! Token settings validated once at startup.
//!
//! The resulting value is immutable and handed to the codec, issuer, and
//! re-auth filter at construction time.

/// Minimum accepted length of the HMAC signing key, in bytes.
pub const MIN_SIGNING_KEY_LENGTH: usize = 32;

/// Default window before expiry in which the filter already refreshes.
pub const DEFAULT_REFRESH_SKEW_SECS: u64 = 30;

/// Longest accepted token lifetime, in seconds. Expiries are stored as
/// SQLite INTEGER, so `now + lifetime` must stay within `i64`.
pub const MAX_LIFETIME_SECS: u64 = i64::MAX as u64 / 2;

/// Signing and lifetime settings for access and refresh tokens.
#[derive(Clone)]
pub struct AuthSettings {
    pub signing_key: Vec<u8>,
    pub issuer: String,
    pub audience: String,
    pub access_lifetime_secs: u64,
    pub refresh_lifetime_secs: u64,
    pub refresh_skew_secs: u64,
}

impl AuthSettings {
    /// Validate raw settings. Lifetimes are given in minutes.
    pub fn new(
        signing_key: impl Into<Vec<u8>>,
        issuer: &str,
        audience: &str,
        access_lifetime_minutes: u64,
        refresh_lifetime_minutes: u64,
    ) -> Result<Self, ConfigError> {
        let signing_key = signing_key.into();
        if signing_key.len() < MIN_SIGNING_KEY_LENGTH {
            return Err(ConfigError::SigningKeyMisconfigured);
        }

        let issuer = issuer.trim();
        if issuer.is_empty() {
            return Err(ConfigError::MissingIssuer);
        }

        let audience = audience.trim();
        if audience.is_empty() {
            return Err(ConfigError::MissingAudience);
        }

        if access_lifetime_minutes == 0 {
            return Err(ConfigError::InvalidLifetime(
                "access token lifetime must be at least one minute",
            ));
        }
        let access_lifetime_secs = lifetime_secs(access_lifetime_minutes)?;
        let refresh_lifetime_secs = lifetime_secs(refresh_lifetime_minutes)?;
        if refresh_lifetime_secs <= access_lifetime_secs {
            return Err(ConfigError::InvalidLifetime(
                "refresh token lifetime must exceed the access token lifetime",
            ));
        }

        Ok(Self {
            signing_key,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            access_lifetime_secs,
            refresh_lifetime_secs,
            refresh_skew_secs: DEFAULT_REFRESH_SKEW_SECS.min(access_lifetime_secs - 1),
        })
    }

    /// Override how long before expiry the filter starts refreshing.
    /// The skew must be shorter than the access token lifetime, otherwise
    /// every token would be refreshed on first use.
    pub fn with_refresh_skew(mut self, secs: u64) -> Result<Self, ConfigError> {
        if secs >= self.access_lifetime_secs {
            return Err(ConfigError::InvalidRefreshSkew);
        }
        self.refresh_skew_secs = secs;
        Ok(self)
    }
}

fn lifetime_secs(minutes: u64) -> Result<u64, ConfigError> {
    minutes
        .checked_mul(60)
        .filter(|secs| *secs <= MAX_LIFETIME_SECS)
        .ok_or(ConfigError::InvalidLifetime("token lifetime is too long"))
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("signing_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .field("refresh_skew_secs", &self.refresh_skew_secs)
            .finish()
    }
}

/// Fatal startup configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Signing key is missing or too short for HMAC-SHA256
    SigningKeyMisconfigured,
    MissingIssuer,
    MissingAudience,
    InvalidLifetime(&'static str),
    /// Refresh skew not shorter than the access token lifetime
    InvalidRefreshSkew,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::SigningKeyMisconfigured => write!(
                f,
                "Signing key must be at least {} bytes",
                MIN_SIGNING_KEY_LENGTH
            ),
            ConfigError::MissingIssuer => write!(f, "Token issuer is required"),
            ConfigError::MissingAudience => write!(f, "Token audience is required"),
            ConfigError::InvalidLifetime(msg) => write!(f, "Invalid token lifetime: {}", msg),
            ConfigError::InvalidRefreshSkew => write!(
                f,
                "Refresh skew must be shorter than the access token lifetime"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
