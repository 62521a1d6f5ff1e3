//! Order route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ellectra_core::{OrderId, OrderStatus, Page};

use super::{ApiJson, ApiPath, ApiQuery, MessageResponse, page_request};
use crate::db::Store;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::order::{
    DeliveryUpdate, Order, OrderStats, OrderView, PlaceOrderRequest, StatusUpdate,
};
use crate::services::orders::{self, ORDER_PAGE_SIZE, StatusOptions};
use crate::state::AppState;

/// Build the order routes router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/add", post(place::<S>))
        .route("/view", get(history::<S>))
        .route("/view/{order_id}", get(detail::<S>))
        .route("/update-status/{order_id}", patch(update_status::<S>))
        .route("/update/{order_id}", put(update_delivery::<S>))
        .route("/delete/{order_id}", delete(remove::<S>))
        .route("/stats", get(stats::<S>))
        .route("/status-options", get(status_options))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub message: &'static str,
    pub order: Order,
}

/// POST /past_order/add
#[instrument(skip_all)]
async fn place<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiJson(request): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let order = orders::place_order(state.store(), state.notifier(), &identity, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: "Order placed successfully",
            order,
        }),
    ))
}

/// GET /past_order/view
async fn history<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Page<OrderView>>> {
    let page = page_request(query.page, query.page_size, ORDER_PAGE_SIZE)?;
    Ok(Json(
        orders::view_orders(state.store(), &identity, page, query.status).await?,
    ))
}

/// GET /past_order/view/{order_id}
async fn detail<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    Ok(Json(orders::view_order(state.store(), &identity, &order_id).await?))
}

/// PATCH /past_order/update-status/{order_id}
async fn update_status<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<OrderResponse>> {
    let order = orders::update_status(state.store(), &identity, &order_id, &update).await?;
    Ok(Json(OrderResponse {
        message: "Order status updated successfully",
        order,
    }))
}

/// PUT /past_order/update/{order_id}
async fn update_delivery<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(update): ApiJson<DeliveryUpdate>,
) -> Result<Json<OrderResponse>> {
    let order = orders::update_delivery(state.store(), &identity, &order_id, &update).await?;
    Ok(Json(OrderResponse {
        message: "Order details updated successfully",
        order,
    }))
}

/// DELETE /past_order/delete/{order_id}
async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<MessageResponse>> {
    orders::delete_order(state.store(), &identity, &order_id).await?;
    Ok(Json(MessageResponse {
        message: "Order deleted successfully",
    }))
}

/// GET /past_order/stats
async fn stats<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<OrderStats>> {
    Ok(Json(orders::stats(state.store(), &identity).await?))
}

/// GET /past_order/status-options
async fn status_options() -> Json<StatusOptions> {
    Json(orders::status_options())
}
