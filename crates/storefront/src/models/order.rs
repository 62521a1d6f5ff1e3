//! Order domain types.
//!
//! An order stores a frozen snapshot of what was bought: product id,
//! quantity and the unit price at the time of purchase. Product names and
//! images are looked up live when orders are displayed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ellectra_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use super::cart::UNKNOWN_PRODUCT_NAME;
use super::catalog::Product;
use super::user::User;

/// Default `delivery_type` for new orders.
pub const DEFAULT_DELIVERY_TYPE: &str = "Home Delivery";

/// One purchased line, captured at order time. Stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub pro_id: ProductId,
    pub quantity: u32,
    pub price_per_item: Decimal,
    pub item_total: Decimal,
}

/// Where and how an order is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryDetails {
    pub delivery_address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub delivery_type: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    /// Nullable in storage; new orders always start as `Pending`.
    pub status: Option<OrderStatus>,
    #[serde(flatten)]
    pub delivery: DeliveryDetails,
    pub order_date: DateTime<Utc>,
}

/// A priced order ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery: DeliveryDetails,
}

/// Result of persisting an order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    /// Cart lines deleted because their product was ordered.
    pub cart_lines_removed: u64,
}

/// Outcome of a delivery-details edit.
#[derive(Debug, Clone)]
pub enum DeliveryUpdateOutcome {
    Updated(Order),
    /// No order with that id belongs to the caller.
    NotFound,
    /// The order exists but has left `Pending`.
    NotModifiable(Option<OrderStatus>),
}

/// Order count and value for one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTotals {
    pub status: Option<OrderStatus>,
    pub count: i64,
    pub total_amount: Decimal,
}

impl StatusTotals {
    /// Fulfillment order, with orders that carry no status last.
    #[must_use]
    pub const fn sort_key(&self) -> (bool, Option<OrderStatus>) {
        (self.status.is_none(), self.status)
    }
}

/// Aggregates over a user's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub total_amount: Decimal,
    pub by_status: Vec<StatusTotals>,
}

impl OrderStats {
    /// Sum the groups and list them in fulfillment order.
    #[must_use]
    pub fn from_groups(mut by_status: Vec<StatusTotals>) -> Self {
        by_status.sort_by_key(StatusTotals::sort_key);
        Self {
            total_orders: by_status.iter().map(|group| group.count).sum(),
            total_amount: by_status.iter().map(|group| group.total_amount).sum(),
            by_status,
        }
    }
}

/// One requested line in `POST /past_order/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub pro_id: ProductId,
    pub quantity: i64,
}

/// Request body for `POST /past_order/add`.
///
/// Totals are never accepted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub delivery_type: Option<String>,
}

/// Request body for `PATCH /past_order/update-status/{order_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<OrderStatus>,
}

/// Request body for `PUT /past_order/update/{order_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryUpdate {
    pub payment_status: Option<PaymentStatus>,
    pub delivery_address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub delivery_type: Option<String>,
}

/// An order item joined with its live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemView {
    pub pro_id: ProductId,
    pub product_name: String,
    pub product_img: Option<String>,
    pub quantity: u32,
    pub price_per_item: Decimal,
    pub item_total: Decimal,
}

impl OrderItemView {
    /// Attach live product details, or placeholders when the product is gone.
    #[must_use]
    pub fn enrich(item: OrderItem, product: Option<&Product>) -> Self {
        Self {
            product_name: product.map_or_else(
                || UNKNOWN_PRODUCT_NAME.to_owned(),
                |p| p.product_name.clone(),
            ),
            product_img: product.map(|p| p.product_img.clone()),
            pro_id: item.pro_id,
            quantity: item.quantity,
            price_per_item: item.price_per_item,
            item_total: item.item_total,
        }
    }
}

/// An order as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub user_phoneno: Option<i64>,
    pub items: Vec<OrderItemView>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: Option<OrderStatus>,
    #[serde(flatten)]
    pub delivery: DeliveryDetails,
    pub order_date: DateTime<Utc>,
}

impl OrderView {
    /// Build the view, resolving each item through `lookup`.
    pub fn build<'p>(
        order: Order,
        owner: &User,
        mut lookup: impl FnMut(&ProductId) -> Option<&'p Product>,
    ) -> Self {
        Self {
            items: order
                .items
                .into_iter()
                .map(|item| {
                    let product = lookup(&item.pro_id);
                    OrderItemView::enrich(item, product)
                })
                .collect(),
            order_id: order.order_id,
            user_id: order.user_id,
            user_name: owner.user_name.clone(),
            user_email: owner.user_email.to_string(),
            user_phoneno: owner.user_number,
            total_amount: order.total_amount,
            payment_status: order.payment_status,
            status: order.status,
            delivery: order.delivery,
            order_date: order.order_date,
        }
    }
}
