//! Issue access tokens from the command line.
//!
//! Useful for exercising protected routes without going through Google
//! login. The token is signed with the same secret and lifetime the server
//! uses.
//!
//! # Environment Variables
//!
//! - `ELLECTRA_TOKEN_SECRET` - Access token signing secret
//! - `ACCESS_TOKEN_EXPIRE_MINUTES` - Token lifetime (default: 60)

use secrecy::SecretString;
use thiserror::Error;

use ellectra_core::Email;
use ellectra_storefront::services::auth::{AuthError, TokenService};

const DEFAULT_TTL_MINUTES: i64 = 60;

/// Errors from token issuance.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid ACCESS_TOKEN_EXPIRE_MINUTES: {0}")]
    InvalidTtl(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn ttl_minutes(raw: Option<String>) -> Result<i64, TokenError> {
    raw.map_or(Ok(DEFAULT_TTL_MINUTES), |raw| {
        raw.parse::<i64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(TokenError::InvalidTtl(raw))
    })
}

/// Print a signed token for `email`.
///
/// # Errors
///
/// Returns an error if the secret is missing, the TTL or email is invalid,
/// or signing fails.
pub fn issue(email: &str, name: &str) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("ELLECTRA_TOKEN_SECRET")
        .map(SecretString::from)
        .map_err(|_| TokenError::MissingEnvVar("ELLECTRA_TOKEN_SECRET"))?;
    let ttl = ttl_minutes(std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES").ok())?;
    let email = Email::parse(email).map_err(|e| TokenError::InvalidEmail(e.to_string()))?;

    let token = TokenService::new(&secret, ttl).issue(&email, name)?;
    tracing::info!(email = %email, ttl_minutes = ttl, "Issued access token");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_minutes() {
        assert_eq!(ttl_minutes(None).unwrap(), 60);
        assert_eq!(ttl_minutes(Some("15".to_owned())).unwrap(), 15);
        assert!(ttl_minutes(Some("0".to_owned())).is_err());
        assert!(ttl_minutes(Some("soon".to_owned())).is_err());
    }
}
