//! Account operations: login, profile and deletion.

use tracing::instrument;

use ellectra_core::Email;

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::models::user::{NewUser, ProfileUpdate, User};
use crate::services::auth::{Identity, TokenService};
use crate::services::validation;

/// Look up the user behind a verified identity.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the account no longer exists.
pub async fn resolve<S: UserRepository>(store: &S, identity: &Identity) -> Result<User> {
    store
        .get_user_by_email(&identity.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))
}

/// Find or create the account for `email` and issue a token for it.
///
/// This is the core of the OAuth callback; the provider only supplies the
/// verified email and display name.
///
/// # Errors
///
/// Returns an error if the store fails or the token cannot be signed.
#[instrument(skip_all, fields(email = %email))]
pub async fn login<S: UserRepository>(
    store: &S,
    tokens: &TokenService,
    email: Email,
    full_name: &str,
) -> Result<String> {
    let name = full_name.trim();
    let name = if name.is_empty() {
        email.as_str().split('@').next().unwrap_or_default().to_owned()
    } else {
        name.to_owned()
    };

    let user = match store.get_user_by_email(&email).await? {
        Some(user) => user,
        None => match store
            .create_user(NewUser {
                email: email.clone(),
                name: name.clone(),
            })
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, "Created user on first login");
                user
            }
            // A concurrent first login created the row between our read and insert.
            Err(RepositoryError::Conflict(_)) => store
                .get_user_by_email(&email)
                .await?
                .ok_or(RepositoryError::NotFound)?,
            Err(e) => return Err(e.into()),
        },
    };

    Ok(tokens.issue(&user.user_email, &name)?)
}

/// Apply a validated partial profile update.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty or invalid update and
/// `AppError::NotFound` if the account is gone.
#[instrument(skip_all, fields(email = %identity.email))]
pub async fn update_profile<S: UserRepository>(
    store: &S,
    identity: &Identity,
    update: &ProfileUpdate,
) -> Result<User> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_owned()));
    }
    let update = validation::profile(update)?;

    let user = resolve(store, identity).await?;
    store
        .update_user_profile(&user.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))
}

/// Delete the caller's account together with their carts and orders.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the account is already gone.
#[instrument(skip_all, fields(email = %identity.email))]
pub async fn delete_account<S: UserRepository>(store: &S, identity: &Identity) -> Result<()> {
    let user = resolve(store, identity).await?;
    if store.delete_user(&user.user_id).await? {
        tracing::info!(user_id = %user.user_id, "Deleted user account");
        Ok(())
    } else {
        Err(AppError::NotFound("User not found".to_owned()))
    }
}
