//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ellectra_core::{CartLineId, ProductId, UserId};

/// Shown in place of a product that no longer exists.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// One (user, product) pair in a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub cart_id: CartLineId,
    pub user_id: UserId,
    pub pro_id: ProductId,
    pub quantity: i32,
    /// `quantity × price` as of the last write to this line.
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new cart line.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub pro_id: ProductId,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// A cart line joined with its live product.
///
/// Product fields are `None` when the product has been deleted since the
/// line was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineDetail {
    pub line: CartLine,
    pub product_name: Option<String>,
    pub product_img: Option<String>,
    pub price: Option<Decimal>,
}

/// Cart line as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub cart_id: CartLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_img: Option<String>,
    pub price_per_item: Option<Decimal>,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl From<CartLineDetail> for CartLineView {
    fn from(detail: CartLineDetail) -> Self {
        Self {
            cart_id: detail.line.cart_id,
            product_id: detail.line.pro_id,
            product_name: detail
                .product_name
                .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_owned()),
            product_img: detail.product_img,
            price_per_item: detail.price,
            quantity: detail.line.quantity,
            total_price: detail.line.total_price,
        }
    }
}

/// Request body for `POST /cart/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub pro_id: ProductId,
    pub quantity: i32,
}

/// Request body for `PUT /cart/update/{cart_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartLine {
    pub quantity: i32,
}
