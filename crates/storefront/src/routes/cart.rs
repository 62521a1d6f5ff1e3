//! Cart route handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tracing::instrument;

use ellectra_core::CartLineId;

use super::{ApiJson, ApiPath, MessageResponse};
use crate::db::Store;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::cart::{AddToCart, CartLineView, UpdateCartLine};
use crate::services::cart::{self, EMPTY_CART_MESSAGE};
use crate::state::AppState;

/// Build the cart routes router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/add", post(add::<S>))
        .route("/view", get(view::<S>))
        .route("/update/{cart_id}", put(update::<S>))
        .route("/delete/{cart_id}", delete(remove::<S>))
}

#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub message: &'static str,
    pub cart_item: CartLineView,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub cart: Vec<CartLineView>,
}

/// POST /cart/add
#[instrument(skip_all)]
async fn add<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiJson(request): ApiJson<AddToCart>,
) -> Result<Json<CartLineResponse>> {
    let cart_item = cart::add_or_merge(state.store(), state.notifier(), &identity, &request).await?;
    Ok(Json(CartLineResponse {
        message: "Cart updated successfully",
        cart_item,
    }))
}

/// GET /cart/view
async fn view<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart = cart::view_cart(state.store(), &identity).await?;
    let message = cart.is_empty().then_some(EMPTY_CART_MESSAGE);
    Ok(Json(CartResponse { message, cart }))
}

/// PUT /cart/update/{cart_id}
async fn update<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(cart_id): ApiPath<CartLineId>,
    ApiJson(request): ApiJson<UpdateCartLine>,
) -> Result<Json<CartLineResponse>> {
    let cart_item = cart::update_quantity(state.store(), &identity, &cart_id, request.quantity).await?;
    Ok(Json(CartLineResponse {
        message: "Cart item updated successfully",
        cart_item,
    }))
}

/// DELETE /cart/delete/{cart_id}
async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(cart_id): ApiPath<CartLineId>,
) -> Result<Json<MessageResponse>> {
    cart::remove(state.store(), &identity, &cart_id).await?;
    Ok(Json(MessageResponse {
        message: "Item deleted from cart",
    }))
}
