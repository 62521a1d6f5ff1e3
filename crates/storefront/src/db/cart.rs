//! Cart line repository.
//!
//! Every query is scoped by `user_id`: a line id on its own never grants access.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use ellectra_core::{CartLineId, Price, ProductId, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique, existing_ids};
use crate::models::cart::{CartLine, CartLineDetail, NewCartLine};

/// Storage for cart lines.
pub trait CartRepository: Send + Sync {
    /// The caller's line for `pro_id`, if any.
    fn get_cart_line_for_product(
        &self,
        user_id: &UserId,
        pro_id: &ProductId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    fn get_cart_line(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    /// Insert a line with a freshly generated id.
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a line for
    /// the product.
    fn insert_cart_line(
        &self,
        line: NewCartLine,
    ) -> impl Future<Output = Result<CartLine, RepositoryError>> + Send;

    fn set_cart_line_quantity(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
        quantity: i32,
        total_price: Decimal,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    /// All lines for a user joined with their live products, oldest first.
    fn list_cart(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<CartLineDetail>, RepositoryError>> + Send;

    fn delete_cart_line(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

const CART_COLUMNS: &str = "cart_id, user_id, pro_id, quantity, total_price, created_at";

#[derive(sqlx::FromRow)]
struct CartRow {
    cart_id: CartLineId,
    user_id: UserId,
    pro_id: ProductId,
    quantity: i32,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for CartLine {
    fn from(row: CartRow) -> Self {
        Self {
            cart_id: row.cart_id,
            user_id: row.user_id,
            pro_id: row.pro_id,
            quantity: row.quantity,
            total_price: row.total_price,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartDetailRow {
    #[sqlx(flatten)]
    line: CartRow,
    product_name: Option<String>,
    product_img: Option<String>,
    price: Option<Price>,
}

impl From<CartDetailRow> for CartLineDetail {
    fn from(row: CartDetailRow) -> Self {
        Self {
            line: row.line.into(),
            product_name: row.product_name,
            product_img: row.product_img,
            price: row.price.map(|price| price.amount()),
        }
    }
}

impl CartRepository for PgStore {
    async fn get_cart_line_for_product(
        &self,
        user_id: &UserId,
        pro_id: &ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM cart_lines WHERE user_id = $1 AND pro_id = $2"
        ))
        .bind(user_id)
        .bind(pro_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn get_cart_line(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM cart_lines WHERE cart_id = $1 AND user_id = $2"
        ))
        .bind(cart_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn insert_cart_line(&self, line: NewCartLine) -> Result<CartLine, RepositoryError> {
        let existing = existing_ids(self.pool(), "SELECT cart_id FROM cart_lines").await?;
        let cart_id = CartLineId::generate_unique(&existing, &mut rand::rng())?;

        let row = sqlx::query_as::<_, CartRow>(&format!(
            "INSERT INTO cart_lines (cart_id, user_id, pro_id, quantity, total_price) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CART_COLUMNS}"
        ))
        .bind(&cart_id)
        .bind(&line.user_id)
        .bind(&line.pro_id)
        .bind(line.quantity)
        .bind(line.total_price)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "product is already in the cart"))?;

        Ok(row.into())
    }

    async fn set_cart_line_quantity(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
        quantity: i32,
        total_price: Decimal,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "UPDATE cart_lines SET quantity = $3, total_price = $4 \
             WHERE cart_id = $1 AND user_id = $2 \
             RETURNING {CART_COLUMNS}"
        ))
        .bind(cart_id)
        .bind(user_id)
        .bind(quantity)
        .bind(total_price)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLineDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartDetailRow>(
            "SELECT c.cart_id, c.user_id, c.pro_id, c.quantity, c.total_price, c.created_at, \
                    p.product_name, p.product_img, p.price \
             FROM cart_lines c \
             LEFT JOIN products p ON p.pro_id = c.pro_id \
             WHERE c.user_id = $1 \
             ORDER BY c.created_at, c.cart_id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(CartLineDetail::from).collect())
    }

    async fn delete_cart_line(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
    ) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND user_id = $2")
            .bind(cart_id)
            .bind(user_id)
            .execute(self.pool())
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
