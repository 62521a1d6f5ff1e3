//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Bearer token issuance, verification and the admin gate
//! - `oauth` - Google sign-in
//! - `users` - Login, profile and account deletion
//! - `catalog` - Category and product reads plus admin mutations
//! - `cart` - Cart lines with add-or-merge semantics
//! - `orders` - Order placement, history and status updates
//! - `email` - Order and cart notifications
//!
//! Services are free functions generic over the repository traits in
//! [`crate::db`], so the same code runs against `PgStore` and `MemoryStore`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod oauth;
pub mod orders;
pub mod users;
pub(crate) mod validation;
