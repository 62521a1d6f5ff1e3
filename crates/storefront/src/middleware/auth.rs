//! Authentication extractors.
//!
//! Both extractors read `Authorization: Bearer <token>` and verify it with
//! the state's [`TokenService`](crate::services::auth::TokenService).
//! Failures reject with an [`AppError`], so they render as the usual JSON
//! error envelope.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn profile(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.full_name)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::Store;
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, Identity, bearer_token, require_admin};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
pub struct RequireAuth(pub Identity);

/// Extractor that requires a valid bearer token for the admin account.
pub struct RequireAdmin(pub Identity);

fn identity_from_parts<S: Store>(parts: &Parts, state: &AppState<S>) -> Result<Identity, AppError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AuthError::MissingToken)?;

    let identity = state.tokens().verify(token)?;
    set_sentry_user(identity.email.as_str());
    Ok(identity)
}

impl<S: Store> FromRequestParts<AppState<S>> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts, state).map(Self)
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let identity = identity_from_parts(parts, state)?;
        if let Err(e) = require_admin(&identity, &state.config().admin_email) {
            tracing::warn!(email = %identity.email, "Rejected non-admin catalog mutation");
            return Err(e.into());
        }
        Ok(Self(identity))
    }
}
