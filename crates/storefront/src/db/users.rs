//! User repository for database operations.
//!
//! Users are looked up by email on every authenticated request, so
//! `user_email` carries a unique index.

use std::future::Future;

use chrono::{DateTime, Utc};

use ellectra_core::{Email, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique, existing_ids};
use crate::models::user::{NewUser, ProfileUpdate, User};

/// Storage for customers.
pub trait UserRepository: Send + Sync {
    /// Get a user by their email address.
    fn get_user_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Create a user with a freshly generated id.
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    fn create_user(
        &self,
        new_user: NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Apply the fields present in `update`. `None` if the user is gone.
    fn update_user_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Delete a user together with their cart lines and orders.
    fn delete_user(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

const USER_COLUMNS: &str = "user_id, user_email, user_name, user_number, user_door_no, \
                            user_address, user_city, user_pincode, landmark, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: UserId,
    user_email: String,
    user_name: String,
    user_number: Option<i64>,
    user_door_no: Option<String>,
    user_address: Option<String>,
    user_city: Option<String>,
    user_pincode: Option<String>,
    landmark: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            user_id: row.user_id,
            user_email,
            user_name: row.user_name,
            user_number: row.user_number,
            user_door_no: row.user_door_no,
            user_address: row.user_address,
            user_city: row.user_city,
            user_pincode: row.user_pincode,
            landmark: row.landmark,
            created_at: row.created_at,
        })
    }
}

impl UserRepository for PgStore {
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let existing = existing_ids(self.pool(), "SELECT user_id FROM users").await?;
        let user_id = UserId::generate_unique(&existing, &mut rand::rng())?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (user_id, user_email, user_name) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user_id)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "user already exists"))?;

        User::try_from(row)
    }

    async fn update_user_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 user_name = COALESCE($2, user_name), \
                 user_number = COALESCE($3, user_number), \
                 user_door_no = COALESCE($4, user_door_no), \
                 user_address = COALESCE($5, user_address), \
                 user_city = COALESCE($6, user_city), \
                 user_pincode = COALESCE($7, user_pincode), \
                 landmark = COALESCE($8, landmark) \
             WHERE user_id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(update.user_name.as_deref())
        .bind(update.user_number)
        .bind(update.user_door_no.as_deref())
        .bind(update.user_address.as_deref())
        .bind(update.user_city.as_deref())
        .bind(update.user_pincode.as_deref())
        .bind(update.landmark.as_deref())
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}
