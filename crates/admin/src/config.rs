//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRACKER_BASE_URL` - Public URL of the dashboard (decides the `Secure` cookie flag)
//!
//! ## Optional
//! - `TRACKER_HOST` - Bind address (default: 127.0.0.1)
//! - `TRACKER_PORT` - Listen port (default: 3001)
//! - `TRACKER_DATA_DIR` - Directory holding `deliveries.json` and per-user settings (default: ./data)
//! - `TRACKER_USERS_FILE` - Users file (default: `<data dir>/users.json`)
//! - `TRACKER_TIMEZONE_OFFSET_HOURS` - UTC offset used to decide "today" (default: 9)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `TRACKER_TLS_CERT` - PEM-encoded certificate chain
//! - `TRACKER_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_OFFSET_HOURS: i32 = 9;
const DELIVERIES_FILE_NAME: &str = "deliveries.json";
const USERS_FILE_NAME: &str = "users.json";
const SETTINGS_DIR_NAME: &str = "settings";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard service configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Directory for persisted data
    pub data_dir: PathBuf,
    /// JSON file with user accounts
    pub users_file: PathBuf,
    /// Offset used to compute the current calendar date
    pub utc_offset: FixedOffset,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("TRACKER_TLS_CERT");
        let key_pem = get_optional_env("TRACKER_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "TRACKER_TLS_*".to_string(),
                "Both TRACKER_TLS_CERT and TRACKER_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("TRACKER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRACKER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TRACKER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRACKER_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("TRACKER_BASE_URL")?;
        let data_dir = PathBuf::from(get_env_or_default("TRACKER_DATA_DIR", "./data"));
        let users_file = get_optional_env("TRACKER_USERS_FILE")
            .map_or_else(|| data_dir.join(USERS_FILE_NAME), PathBuf::from);
        let offset_hours = get_optional_env("TRACKER_TIMEZONE_OFFSET_HOURS")
            .map(|s| {
                s.parse::<i32>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "TRACKER_TIMEZONE_OFFSET_HOURS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_OFFSET_HOURS);
        let utc_offset = parse_offset(offset_hours)?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f == "json");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            data_dir,
            users_file,
            utc_offset,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Plain-HTTP configuration rooted at `data_dir`, for tools and tests.
    #[must_use]
    pub fn local(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            users_file: data_dir.join(USERS_FILE_NAME),
            data_dir,
            utc_offset: parse_offset(DEFAULT_OFFSET_HOURS).unwrap_or_else(|_| Utc.fix()),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the deliveries file.
    #[must_use]
    pub fn deliveries_file(&self) -> PathBuf {
        self.data_dir.join(DELIVERIES_FILE_NAME)
    }

    /// Directory holding one settings file per user.
    #[must_use]
    pub fn settings_dir(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_DIR_NAME)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Convert whole hours into a fixed offset, rejecting values outside UTC-12..UTC+14.
fn parse_offset(hours: i32) -> Result<FixedOffset, ConfigError> {
    if !(-12..=14).contains(&hours) {
        return Err(ConfigError::InvalidEnvVar(
            "TRACKER_TIMEZONE_OFFSET_HOURS".to_string(),
            format!("{hours} is outside -12..=14"),
        ));
    }
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
        ConfigError::InvalidEnvVar(
            "TRACKER_TIMEZONE_OFFSET_HOURS".to_string(),
            format!("{hours} is not a valid offset"),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = AdminConfig::local("/tmp/tracker");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_local_paths() {
        let config = AdminConfig::local("/srv/tracker");
        assert_eq!(
            config.deliveries_file(),
            PathBuf::from("/srv/tracker/deliveries.json")
        );
        assert_eq!(config.users_file, PathBuf::from("/srv/tracker/users.json"));
        assert_eq!(config.settings_dir(), PathBuf::from("/srv/tracker/settings"));
        assert!(!config.is_secure());
    }

    #[test]
    fn test_parse_offset_bounds() {
        assert_eq!(parse_offset(9).unwrap().local_minus_utc(), 9 * 3600);
        assert_eq!(parse_offset(-5).unwrap().local_minus_utc(), -5 * 3600);
        assert!(parse_offset(15).is_err());
        assert!(parse_offset(-13).is_err());
    }

    #[test]
    fn test_tls_config_debug_redacts_key() {
        let config = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("super_secret_private_key"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_key"));
    }
}
