//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ELLECTRA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ELLECTRA_TOKEN_SECRET` - Access token signing secret (min 32 chars, high entropy)
//! - `ELLECTRA_FRONTEND_URL` - Frontend origin the login flow redirects back to
//! - `ADMIN_EMAIL` - The single identity allowed to mutate the catalog
//!
//! ## Optional
//! - `ELLECTRA_HOST` - Bind address (default: 127.0.0.1)
//! - `ELLECTRA_PORT` - Listen port (default: 8000)
//! - `ELLECTRA_BASE_URL` - Public URL of this API (default: `http://{host}:{port}`)
//! - `ACCESS_TOKEN_EXPIRE_MINUTES` - Access token lifetime (default: 60)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Google login (both or neither)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` - Outbound email
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins (default: any)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use ellectra_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TOKEN_TTL_MINUTES: &str = "60";

/// Longest accepted access token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;
const DEFAULT_SMTP_PORT: &str = "587";

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
    /// Public base URL of this API
    pub base_url: String,
    /// Frontend origin that receives the token after login
    pub frontend_url: String,
    /// Access token settings
    pub token: TokenConfig,
    /// Administrator identity for catalog mutation
    pub admin_email: Email,
    /// Google login, when configured
    pub google: Option<GoogleOAuthConfig>,
    /// Outbound email, when configured
    pub smtp: Option<SmtpConfig>,
    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Access token signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// Lifetime of issued tokens in minutes
    pub ttl_minutes: i64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// Google OAuth client configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Callback URL registered with Google
    pub redirect_uri: String,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// SMTP configuration for notification email.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Sender address
    pub from_email: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_email", &self.from_email)
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

        let database_url = get_database_url("ELLECTRA_DATABASE_URL")?;
        let host = get_env_or_default("ELLECTRA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ELLECTRA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ELLECTRA_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ELLECTRA_PORT".to_string(), e.to_string()))?;
        let base_url = get_optional_env("ELLECTRA_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        validate_http_url("ELLECTRA_BASE_URL", &base_url)?;
        let frontend_url = get_required_env("ELLECTRA_FRONTEND_URL")?;
        validate_http_url("ELLECTRA_FRONTEND_URL", &frontend_url)?;

        let token = TokenConfig::from_env()?;
        let admin_email = Email::parse(&get_required_env("ADMIN_EMAIL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;
        let google = GoogleOAuthConfig::from_env(&base_url)?;
        let smtp = SmtpConfig::from_env()?;
        let cors_allowed_origins = parse_origins(&get_env_or_default("CORS_ALLOWED_ORIGINS", ""));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_url,
            token,
            admin_email,
            google,
            smtp,
            cors_allowed_origins,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Require an absolute `http` or `https` URL.
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("unsupported scheme {:?}", parsed.scheme()),
        ))
    }
}

impl TokenConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("ELLECTRA_TOKEN_SECRET")?;
        validate_token_secret(&secret, "ELLECTRA_TOKEN_SECRET")?;
        let ttl_minutes = parse_token_ttl(&get_env_or_default(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_TOKEN_TTL_MINUTES,
        ))?;
        Ok(Self {
            secret,
            ttl_minutes,
        })
    }
}

/// Parse a token lifetime in minutes, between 1 and [`MAX_TOKEN_TTL_MINUTES`].
fn parse_token_ttl(value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|minutes| (1..=MAX_TOKEN_TTL_MINUTES).contains(minutes))
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "ACCESS_TOKEN_EXPIRE_MINUTES".to_string(),
                format!("must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes"),
            )
        })
}

impl GoogleOAuthConfig {
    fn from_env(base_url: &str) -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("GOOGLE_CLIENT_ID"),
            get_optional_env("GOOGLE_CLIENT_SECRET"),
        ) {
            (None, None) => Ok(None),
            (Some(client_id), Some(client_secret)) => Ok(Some(Self {
                client_id,
                client_secret: SecretString::from(client_secret),
                redirect_uri: format!(
                    "{}/ellectra/v1/users/auth/google/callback",
                    base_url.trim_end_matches('/')
                ),
            })),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("GOOGLE_CLIENT_SECRET".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("GOOGLE_CLIENT_ID".to_string())),
        }
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };
        let port = get_env_or_default("SMTP_PORT", DEFAULT_SMTP_PORT)
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;
        Ok(Some(Self {
            host,
            port,
            username: get_required_env("SMTP_USERNAME")?,
            password: get_required_secret("SMTP_PASSWORD")?,
            from_email: get_required_env("EMAIL_FROM")?,
        }))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(str::to_owned)
        .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to the conventional `DATABASE_URL`.
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

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
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
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("TEST_URL", "https://ellectra.in").is_ok());
        assert!(validate_http_url("TEST_URL", "http://localhost:5173/").is_ok());
        assert!(matches!(
            validate_http_url("TEST_URL", "ftp://ellectra.in"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(validate_http_url("TEST_URL", "ellectra.in").is_err());
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_length() {
        assert!(validate_token_secret(&SecretString::from("short"), "TEST_TOKEN").is_err());
        assert!(validate_token_secret(&SecretString::from("a".repeat(32)), "TEST_TOKEN").is_ok());
    }

    #[test]
    fn test_parse_token_ttl() {
        assert_eq!(parse_token_ttl("60").unwrap(), 60);
        assert_eq!(parse_token_ttl(" 1440 ").unwrap(), 1440);
        assert_eq!(parse_token_ttl("525600").unwrap(), MAX_TOKEN_TTL_MINUTES);
        assert!(parse_token_ttl("525601").is_err());
        assert!(parse_token_ttl("9223372036854775807").is_err());
        assert!(parse_token_ttl("0").is_err());
        assert!(parse_token_ttl("-5").is_err());
        assert!(parse_token_ttl("an hour").is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert!(parse_origins("").is_empty());
        assert!(parse_origins("*").is_empty());
        assert_eq!(
            parse_origins("https://ellectra.in, http://localhost:5173 ,"),
            vec!["https://ellectra.in", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "0.0.0.0".parse().unwrap(),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            token: TokenConfig {
                secret: SecretString::from("x".repeat(32)),
                ttl_minutes: 60,
            },
            admin_email: Email::parse("admin@ellectra.in").unwrap(),
            google: None,
            smtp: None,
            cors_allowed_origins: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let google = GoogleOAuthConfig {
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
            redirect_uri: "http://localhost:8000/cb".to_string(),
        };
        let smtp = SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: "store@ellectra.in".to_string(),
            password: SecretString::from("super_secret_smtp_password"),
            from_email: "store@ellectra.in".to_string(),
        };
        let token = TokenConfig {
            secret: SecretString::from("super_secret_signing_key"),
            ttl_minutes: 30,
        };

        let debug_output = format!("{google:?} {smtp:?} {token:?}");

        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("smtp.gmail.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
        assert!(!debug_output.contains("super_secret_signing_key"));
    }
}
