//! Authentication error types.

use thiserror::Error;

/// Errors raised while issuing or checking bearer tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on a protected request.
    #[error("missing bearer token")]
    MissingToken,

    /// Bad signature, malformed token or missing claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is past its `exp` claim.
    #[error("token has expired")]
    Expired,

    /// Valid token for someone other than the configured admin.
    #[error("admin access only")]
    NotAdmin,

    /// Signing a new token failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}
