//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMELONES_DATABASE_URL` - `PostgreSQL` connection string
//! - `COMELONES_BASE_URL` - Public URL for the storefront
//! - `COMELONES_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `COMELONES_OWNER_EMAIL` - The single designated owner identity
//! - `NEQUI_CLIENT_ID` - Nequi gateway OAuth client ID
//! - `NEQUI_CLIENT_SECRET` - Nequi gateway OAuth client secret
//!
//! ## Optional
//! - `COMELONES_HOST` - Bind address (default: 127.0.0.1)
//! - `COMELONES_PORT` - Listen port (default: 3000)
//! - `COMELONES_ADMIN_EMAILS` - Comma-separated admin email list
//! - `COMELONES_RECEIPTS_DIR` - Directory for uploaded receipts (default: data/receipts)
//! - `NEQUI_BASE_URL` - Gateway API base URL (default: <https://api.nequi.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use comelones_core::role::RoleDirectory;
use comelones_core::{Email, EmailError};

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Invalid email in {0}: {1}")]
    InvalidEmail(String, EmailError),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Owner/admin identity configuration
    pub roles: RolesConfig,
    /// Nequi payment gateway configuration
    pub nequi: NequiConfig,
    /// Directory for uploaded payment receipts
    pub receipts_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Owner and admin identities, injected from the environment rather than
/// hardcoded so tests and deployments can substitute arbitrary sets.
#[derive(Debug, Clone)]
pub struct RolesConfig {
    /// The single designated owner identity
    pub owner_email: Email,
    /// Admin membership list
    pub admin_emails: Vec<Email>,
}

impl RolesConfig {
    /// Build the role directory consumed by the capability policy.
    #[must_use]
    pub fn directory(&self) -> RoleDirectory {
        RoleDirectory::new(self.owner_email.clone(), self.admin_emails.clone())
    }
}

/// Nequi payment gateway configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct NequiConfig {
    /// Gateway API base URL
    pub base_url: String,
    /// OAuth client ID (client-credentials grant)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for NequiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NequiConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("COMELONES_DATABASE_URL")?;
        let host = get_env_or_default("COMELONES_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("COMELONES_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("COMELONES_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("COMELONES_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("COMELONES_BASE_URL")?;
        let session_secret = get_validated_secret("COMELONES_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "COMELONES_SESSION_SECRET")?;

        let roles = RolesConfig::from_env()?;
        let nequi = NequiConfig::from_env()?;
        let receipts_dir = PathBuf::from(get_env_or_default("COMELONES_RECEIPTS_DIR", "data/receipts"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            roles,
            nequi,
            receipts_dir,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// URL the gateway calls back with payment confirmations.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/webhooks/nequi", self.base_url.trim_end_matches('/'))
    }
}

impl RolesConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let owner_raw = get_required_env("COMELONES_OWNER_EMAIL")?;
        let owner_email = Email::parse(&owner_raw)
            .map_err(|e| ConfigError::InvalidEmail("COMELONES_OWNER_EMAIL".to_string(), e))?;

        let admin_emails = match get_optional_env("COMELONES_ADMIN_EMAILS") {
            Some(raw) => parse_email_list(&raw)
                .map_err(|e| ConfigError::InvalidEmail("COMELONES_ADMIN_EMAILS".to_string(), e))?,
            None => Vec::new(),
        };

        Ok(Self {
            owner_email,
            admin_emails,
        })
    }
}

impl NequiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_env_or_default("NEQUI_BASE_URL", "https://api.nequi.com"),
            client_id: get_required_env("NEQUI_CLIENT_ID")?,
            client_secret: get_validated_secret("NEQUI_CLIENT_SECRET")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a comma-separated email list, skipping empty segments.
fn parse_email_list(raw: &str) -> Result<Vec<Email>, EmailError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Email::parse)
        .collect()
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_parse_email_list() {
        let emails = parse_email_list("a@x.com, b@y.com,,  c@z.com ").unwrap();
        assert_eq!(emails.len(), 3);
        assert_eq!(emails.first().unwrap().as_str(), "a@x.com");
    }

    #[test]
    fn test_parse_email_list_rejects_malformed_entries() {
        assert!(parse_email_list("a@x.com, no-arroba").is_err());
    }

    #[test]
    fn test_callback_url_strips_trailing_slash() {
        let config = sample_config("http://localhost:3000/");
        assert_eq!(config.callback_url(), "http://localhost:3000/webhooks/nequi");
    }

    #[test]
    fn test_socket_addr() {
        let config = sample_config("http://localhost:3000");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_nequi_config_debug_redacts_secret() {
        let config = NequiConfig {
            base_url: "https://api.nequi.com".to_string(),
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
    }

    fn sample_config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            roles: RolesConfig {
                owner_email: Email::parse("owner@comelonesfit.com").unwrap(),
                admin_emails: vec![],
            },
            nequi: NequiConfig {
                base_url: "https://api.nequi.com".to_string(),
                client_id: "client".to_string(),
                client_secret: SecretString::from("s3cr3t-v4lu3"),
            },
            receipts_dir: PathBuf::from("data/receipts"),
            sentry_dsn: None,
        }
    }
}
