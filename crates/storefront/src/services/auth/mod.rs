//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs carrying the caller's email and display name. The
//! email is the only ownership key: protected operations resolve the user
//! from it on every request.

mod error;

pub use error::AuthError;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use ellectra_core::Email;

use crate::config::MAX_TOKEN_TTL_MINUTES;

/// Claims stored in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub fullname: String,
    pub iat: i64,
    pub exp: i64,
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub email: Email,
    pub full_name: String,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Create a token service signing with `secret`.
    ///
    /// A negative `ttl_minutes` issues tokens that are already expired.
    /// Lifetimes beyond [`MAX_TOKEN_TTL_MINUTES`] in either direction are
    /// clamped.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_minutes: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::minutes(
                ttl_minutes.clamp(-MAX_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES),
            ),
        }
    }

    /// Sign a token for `email`, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Encoding` if signing fails.
    pub fn issue(&self, email: &Email, full_name: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            fullname: full_name.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Check signature and expiry and return the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Expired` for a token past its `exp`, and
    /// `AuthError::InvalidToken` for anything else that fails to verify.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let email = Email::parse(&data.claims.email)
            .map_err(|e| AuthError::InvalidToken(format!("bad email claim: {e}")))?;

        Ok(Identity {
            email,
            full_name: data.claims.fullname,
        })
    }
}

/// Pull the token out of an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Allow only the configured admin through.
///
/// # Errors
///
/// Returns `AuthError::NotAdmin` unless `identity.email` equals `admin_email`.
pub fn require_admin(identity: &Identity, admin_email: &Email) -> Result<(), AuthError> {
    if &identity.email == admin_email {
        Ok(())
    } else {
        Err(AuthError::NotAdmin)
    }
}
