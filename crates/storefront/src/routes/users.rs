//! Google login and account self-service.

use axum::{
    Json, Router,
    extract::State,
    response::Redirect,
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ellectra_core::Email;

use super::{ApiJson, ApiQuery, MessageResponse};
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::user::{ProfileUpdate, User};
use crate::services::auth::Identity;
use crate::services::oauth::{GoogleOAuthClient, OAuthError};
use crate::services::users;
use crate::state::AppState;

/// Build the users router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/users_google", get(google_login::<S>))
        .route("/auth/google/callback", get(google_callback::<S>))
        .route("/security_check", get(security_check))
        .route("/user_details", get(user_details::<S>))
        .route("/user_info_change", put(update_profile::<S>))
        .route("/user_delete", delete(delete_account::<S>))
}

fn google<S: Store>(state: &AppState<S>) -> Result<&GoogleOAuthClient> {
    state
        .google()
        .ok_or_else(|| AppError::ServiceUnavailable("Google login is not configured".to_owned()))
}

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /users/users_google
async fn google_login<S: Store>(State(state): State<AppState<S>>) -> Result<Redirect> {
    let url = google(&state)?.authorization_url()?;
    Ok(Redirect::to(&url))
}

/// GET /users/auth/google/callback
///
/// Redirects to the frontend with the issued token in the query string.
#[instrument(skip_all)]
async fn google_callback<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> Result<Redirect> {
    let google = google(&state)?;

    if let Some(error) = query.error {
        return Err(OAuthError::Provider(format!("authorization denied: {error}")).into());
    }
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(AppError::BadRequest("Missing code or state".to_owned()));
    };

    google.verify_state(&oauth_state)?;
    let access_token = google.exchange_code(&code).await?;
    let info = google.fetch_userinfo(&access_token).await?;
    let email = Email::parse(&info.email)
        .map_err(|e| OAuthError::Provider(format!("provider returned a bad email: {e}")))?;

    let token = users::login(
        state.store(),
        state.tokens(),
        email,
        info.name.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(Redirect::to(&format!(
        "{}/?token={}",
        state.config().frontend_url.trim_end_matches('/'),
        urlencoding::encode(&token)
    )))
}

/// GET /users/security_check
async fn security_check(RequireAuth(identity): RequireAuth) -> Json<Identity> {
    Json(identity)
}

/// GET /users/user_details
async fn user_details<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<User>> {
    Ok(Json(users::resolve(state.store(), &identity).await?))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: User,
}

/// PUT /users/user_info_change
async fn update_profile<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>> {
    let user = users::update_profile(state.store(), &identity, &update).await?;
    Ok(Json(ProfileResponse {
        message: "Profile updated successfully",
        user,
    }))
}

/// DELETE /users/user_delete
async fn delete_account<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<MessageResponse>> {
    users::delete_account(state.store(), &identity).await?;
    Ok(Json(MessageResponse {
        message: "Account deleted successfully",
    }))
}
