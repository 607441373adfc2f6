//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::config::{AuthSettings, DEFAULT_REFRESH_SKEW_SECS};
use crate::db::Database;
use clap::Parser;
use tracing::{error, info};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cities-manager",
    about = "City records behind JWT authentication with rotating refresh tokens"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5087")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "cities.db")]
    pub database: String,

    /// Value of the `iss` claim in issued access tokens
    #[arg(long, env = "JWT_ISSUER")]
    pub issuer: String,

    /// Value of the `aud` claim in issued access tokens
    #[arg(long, env = "JWT_AUDIENCE")]
    pub audience: String,

    /// Access token lifetime in minutes
    #[arg(long, env = "JWT_EXPIRATION_MINUTES")]
    pub access_token_minutes: u64,

    /// Refresh token lifetime in minutes
    #[arg(long, env = "REFRESH_TOKEN_EXPIRATION_MINUTES")]
    pub refresh_token_minutes: u64,

    /// Refresh access tokens this many seconds before they expire
    #[arg(long, default_value_t = DEFAULT_REFRESH_SKEW_SECS)]
    pub refresh_skew_seconds: u64,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
/// Length is checked later, by `AuthSettings::new`.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        return Some(secret);
    }

    let Some(path) = jwt_secret_file else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read JWT secret file");
            None
        }
    }
}

/// Validate token settings from the parsed arguments.
/// Returns None and logs an error if any setting is unusable.
pub fn build_auth_settings(args: &Args, jwt_secret: String) -> Option<AuthSettings> {
    let settings = AuthSettings::new(
        jwt_secret.into_bytes(),
        &args.issuer,
        &args.audience,
        args.access_token_minutes,
        args.refresh_token_minutes,
    )
    .and_then(|settings| settings.with_refresh_skew(args.refresh_skew_seconds));

    match settings {
        Ok(settings) => Some(settings),
        Err(e) => {
            error!(error = %e, "Invalid token configuration");
            None
        }
    }
}

/// Build ServerConfig from validated parts.
pub fn build_config(db: Database, auth: AuthSettings) -> ServerConfig {
    ServerConfig { db, auth }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec![
            "cities-manager",
            "--issuer",
            "cities-api",
            "--audience",
            "cities-clients",
            "--access-token-minutes",
            "10",
            "--refresh-token-minutes",
            "60",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.port, 5087);
        assert_eq!(args.database, "cities.db");
        assert_eq!(args.refresh_skew_seconds, DEFAULT_REFRESH_SKEW_SECS);
    }

    #[test]
    fn test_build_auth_settings() {
        let args = parse(&["--refresh-skew-seconds", "5"]).unwrap();
        let settings =
            build_auth_settings(&args, "0123456789abcdef0123456789abcdef".to_string()).unwrap();
        assert_eq!(settings.issuer, "cities-api");
        assert_eq!(settings.access_lifetime_secs, 600);
        assert_eq!(settings.refresh_skew_secs, 5);

        assert!(build_auth_settings(&args, "too-short".to_string()).is_none());

        let huge_skew = parse(&["--refresh-skew-seconds", "18446744073709551615"]).unwrap();
        assert!(
            build_auth_settings(&huge_skew, "0123456789abcdef0123456789abcdef".to_string())
                .is_none()
        );
    }
}
