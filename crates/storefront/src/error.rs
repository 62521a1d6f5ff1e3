//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error leaves the server as a JSON envelope:
//!
//! ```json
//! {"error": "HTTP 404", "message": "Product not found", "path": "/ellectra/v1/products/PRO123456"}
//! ```
//!
//! `IntoResponse` fills in status and message; the request path is added by
//! [`crate::middleware::error_envelope`], which sees the request URI.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::oauth::OAuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Token missing, invalid or not allowed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Google login failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An optional integration is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: format!("HTTP {}", status.as_u16()),
            message: message.into(),
            path: String::new(),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::Expired => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::NotAdmin => StatusCode::FORBIDDEN,
                AuthError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OAuth(err) => match err {
                OAuthError::InvalidState(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leave the server.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Resource not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::MissingToken => "Not authenticated".to_string(),
                AuthError::InvalidToken(_) => "Invalid authentication token".to_string(),
                AuthError::Expired => "Token has expired".to_string(),
                AuthError::NotAdmin => "Admin access only".to_string(),
                AuthError::Encoding(_) => "Internal server error".to_string(),
            },
            Self::OAuth(OAuthError::InvalidState(_)) => "Invalid login state".to_string(),
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
            Self::Database(_) | Self::OAuth(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        envelope_response(status, self.client_message())
    }
}

/// Render an error envelope with an empty path and attach it as a response
/// extension for [`crate::middleware::error_envelope`] to complete.
pub fn envelope_response(status: StatusCode, message: impl Into<String>) -> Response {
    let envelope = ErrorEnvelope::new(status, message);
    let mut response = (status, Json(envelope.clone())).into_response();
    response.extensions_mut().insert(envelope);
    response
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("order", "Placed order", Some(&[("order_id", "ORD3FA9C1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use ellectra_core::IdError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::NotFound("test".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::BadRequest("test".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::Conflict("test".to_string())), StatusCode::CONFLICT);
        assert_eq!(
            get_status(AppError::Auth(AuthError::MissingToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Auth(AuthError::Expired)), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Auth(AuthError::NotAdmin)), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("dup".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::IdGeneration(IdError::Exhausted {
                prefix: "ORD",
                attempts: 1000,
            }))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "invalid email in database".to_string(),
        ));
        assert_eq!(err.client_message(), "Internal server error");

        let err = AppError::Auth(AuthError::Expired);
        assert_eq!(err.client_message(), "Token has expired");
    }

    #[tokio::test]
    async fn test_envelope_body() {
        let response = AppError::NotFound("Product not found".to_string()).into_response();
        assert_eq!(
            response.extensions().get::<ErrorEnvelope>().map(|e| e.error.as_str()),
            Some("HTTP 404")
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "HTTP 404");
        assert_eq!(json["message"], "Product not found");
        assert_eq!(json["path"], "");
    }
}
