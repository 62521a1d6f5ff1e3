//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! Everything below is nested under `/ellectra/v1`.
//!
//! ```text
//! # Users
//! GET    /users/users_google                 - Start Google login
//! GET    /users/auth/google/callback         - Finish Google login, redirect with token
//! GET    /users/security_check               - Echo the verified identity
//! GET    /users/user_details                 - Caller's profile
//! PUT    /users/user_info_change             - Partial profile update
//! DELETE /users/user_delete                  - Delete account, carts and orders
//!
//! # Catalog (public)
//! GET    /products                           - Products (category_id, page, page_size)
//! GET    /products/search?q=                 - Search names and descriptions
//! GET    /products/{id}                      - One product
//! GET    /products/categories                - Categories (page, page_size)
//! GET    /products/categories/all            - Every category, name and id only
//! GET    /products/categories/{id}           - One category
//!
//! # Cart (requires auth)
//! POST   /cart/add                           - Add or merge a line
//! GET    /cart/view                          - List lines
//! PUT    /cart/update/{cart_id}              - Set quantity
//! DELETE /cart/delete/{cart_id}              - Remove line
//!
//! # Orders (requires auth)
//! POST   /past_order/add                     - Place an order
//! GET    /past_order/view                    - History (page, page_size, status)
//! GET    /past_order/view/{order_id}         - One order
//! PATCH  /past_order/update-status/{order_id} - Set payment/fulfillment status
//! PUT    /past_order/update/{order_id}       - Edit delivery details while Pending
//! DELETE /past_order/delete/{order_id}       - Delete an order
//! GET    /past_order/stats                   - Totals by status
//! GET    /past_order/status-options          - Allowed status values (public)
//!
//! # Admin (requires the admin account)
//! POST           /admin/operation/categories
//! GET/PUT/DELETE /admin/operation/categories/{id}
//! POST           /admin/operation/products
//! GET/PUT/DELETE /admin/operation/products/{id}
//! ```

pub mod admin;
pub mod cart;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
};
use serde::Serialize;

use ellectra_core::PageRequest;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Prefix every API route is nested under.
pub const API_PREFIX: &str = "/ellectra/v1";

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Build a page request from optional query parameters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for page 0 or an out-of-range page size.
pub fn page_request(page: Option<u32>, page_size: Option<u32>, default_size: u32) -> Result<PageRequest> {
    PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(default_size))
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Create all API routes, relative to [`API_PREFIX`].
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/past_order", orders::router())
        .nest("/admin/operation", admin::router())
}
