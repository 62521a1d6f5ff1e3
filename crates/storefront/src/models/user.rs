//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ellectra_core::{Email, UserId};

/// A storefront customer (domain type).
///
/// Created on first successful Google login. Contact and address fields stay
/// empty until the customer fills in their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub user_email: Email,
    pub user_name: String,
    /// Ten-digit phone number.
    pub user_number: Option<i64>,
    pub user_door_no: Option<String>,
    pub user_address: Option<String>,
    pub user_city: Option<String>,
    /// Six-digit postal code.
    pub user_pincode: Option<String>,
    pub landmark: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user on first login.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub user_number: Option<i64>,
    pub user_door_no: Option<String>,
    pub user_address: Option<String>,
    pub user_city: Option<String>,
    pub user_pincode: Option<String>,
    pub landmark: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.user_number.is_none()
            && self.user_door_no.is_none()
            && self.user_address.is_none()
            && self.user_city.is_none()
            && self.user_pincode.is_none()
            && self.landmark.is_none()
    }
}
