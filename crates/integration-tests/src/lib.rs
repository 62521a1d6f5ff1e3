//! Integration tests for the Ellectra storefront API.
//!
//! The tests drive the real router in-process against the in-memory store,
//! so they need no database or running server. The `db_postgres` tests run
//! the same router against `PostgreSQL` and are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ellectra-integration-tests
//!
//! # Database-backed tests (requires ELLECTRA_DATABASE_URL)
//! cargo test -p ellectra-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `api_access` - Health checks, authentication and the error envelope
//! - `api_catalog` - Admin catalog management and public browsing
//! - `api_cart_orders` - Cart lifecycle and order placement
//! - `db_postgres` - Transactions and queries against a real database

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use ellectra_core::Email;
use ellectra_storefront::config::{StorefrontConfig, TokenConfig};
use ellectra_storefront::db::{MemoryStore, Store};
use ellectra_storefront::error::AppError;
use ellectra_storefront::services::auth::TokenService;
use ellectra_storefront::services::email::Notifier;
use ellectra_storefront::services::users;
use ellectra_storefront::state::AppState;

/// Prefix every API route is mounted under.
pub const API: &str = "/ellectra/v1";

/// Email of the configured admin account.
pub const ADMIN_EMAIL: &str = "admin@ellectra.test";

/// Token signing secret shared by the app and the tests.
pub const TOKEN_SECRET: &str = "integration-test-secret";

/// A response reduced to what the tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// An in-process storefront, backed by a fresh [`MemoryStore`] unless built
/// with [`TestApp::with_store`].
pub struct TestApp<S = MemoryStore> {
    state: AppState<S>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build the app with Google login and email disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: Store> TestApp<S> {
    /// Build the app over `store` with Google login and email disabled.
    #[must_use]
    pub fn with_store(store: S) -> Self {
        let state = AppState::with_notifier(test_config(), store, Notifier::disabled());
        let router = ellectra_storefront::app(state.clone());
        Self { state, router }
    }

    #[must_use]
    pub const fn state(&self) -> &AppState<S> {
        &self.state
    }

    /// Log `email` in as on a first Google login and return its token.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is invalid or the store fails.
    pub async fn login(&self, email: &str, name: &str) -> Result<String, AppError> {
        let email = Email::parse(email).map_err(|e| AppError::BadRequest(e.to_string()))?;
        users::login(self.state.store(), self.state.tokens(), email, name).await
    }

    /// Token for the admin account.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn admin_token(&self) -> Result<String, AppError> {
        self.login(ADMIN_EMAIL, "Store Admin").await
    }

    /// Send one request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, &format!("{API}{path}"), token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, &format!("{API}{path}"), token, Some(body))
            .await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, &format!("{API}{path}"), token, Some(body))
            .await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, &format!("{API}{path}"), token, Some(body))
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, &format!("{API}{path}"), token, None)
            .await
    }
}

/// A token signed with the test secret that expired a minute ago.
///
/// # Errors
///
/// Returns an error if the email is invalid or signing fails.
pub fn expired_token(email: &str) -> Result<String, AppError> {
    let email = Email::parse(email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(TokenService::new(&SecretString::from(TOKEN_SECRET), -1).issue(&email, "Expired")?)
}

/// Parse a decimal the API serialized as a string.
///
/// # Panics
///
/// Panics if `value` is not a decimal string.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[allow(clippy::unwrap_used)]
fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: "http://localhost:8000".to_owned(),
        frontend_url: "http://localhost:5173".to_owned(),
        token: TokenConfig {
            secret: SecretString::from(TOKEN_SECRET),
            ttl_minutes: 60,
        },
        admin_email: Email::parse(ADMIN_EMAIL).unwrap(),
        google: None,
        smtp: None,
        cors_allowed_origins: Vec::new(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}
