//! Order repository.
//!
//! Order placement runs as a single transaction: id generation, insert and
//! cart cleanup either all commit or none do.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use ellectra_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique, existing_ids};
use crate::models::order::{
    DeliveryDetails, DeliveryUpdate, DeliveryUpdateOutcome, NewOrder, Order, OrderItem,
    PlacedOrder, StatusTotals,
};

/// Storage for orders.
pub trait OrderRepository: Send + Sync {
    /// Persist an order and delete the owner's cart lines for every ordered
    /// product, atomically.
    fn place_order(
        &self,
        order: NewOrder,
    ) -> impl Future<Output = Result<PlacedOrder, RepositoryError>> + Send;

    fn count_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Newest first.
    fn list_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    fn get_order(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Overwrite whichever statuses are `Some`.
    fn update_order_status(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        payment_status: Option<PaymentStatus>,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Edit delivery metadata of a `Pending` order.
    fn update_order_delivery(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        update: &DeliveryUpdate,
    ) -> impl Future<Output = Result<DeliveryUpdateOutcome, RepositoryError>> + Send;

    fn delete_order(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Count and value of a user's orders grouped by status.
    fn order_totals_by_status(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<StatusTotals>, RepositoryError>> + Send;
}

const ORDER_COLUMNS: &str = "order_id, user_id, items, total_amount, payment_status, status, \
                             delivery_address, city, pincode, landmark, delivery_type, order_date";

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: OrderId,
    user_id: UserId,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    payment_status: PaymentStatus,
    status: Option<OrderStatus>,
    delivery_address: Option<String>,
    city: Option<String>,
    pincode: Option<String>,
    landmark: Option<String>,
    delivery_type: String,
    order_date: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.order_id,
            user_id: row.user_id,
            items: row.items.0,
            total_amount: row.total_amount,
            payment_status: row.payment_status,
            status: row.status,
            delivery: DeliveryDetails {
                delivery_address: row.delivery_address,
                city: row.city,
                pincode: row.pincode,
                landmark: row.landmark,
                delivery_type: row.delivery_type,
            },
            order_date: row.order_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatusTotalsRow {
    status: Option<OrderStatus>,
    count: i64,
    total_amount: Decimal,
}

impl OrderRepository for PgStore {
    async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let existing = existing_ids(&mut *tx, "SELECT order_id FROM orders").await?;
        let order_id = OrderId::generate_unique(&existing, &mut rand::rng())?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (order_id, user_id, items, total_amount, payment_status, status, \
                                 delivery_address, city, pincode, landmark, delivery_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order_id)
        .bind(&order.user_id)
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.payment_status)
        .bind(OrderStatus::Pending)
        .bind(order.delivery.delivery_address.as_deref())
        .bind(order.delivery.city.as_deref())
        .bind(order.delivery.pincode.as_deref())
        .bind(order.delivery.landmark.as_deref())
        .bind(&order.delivery.delivery_type)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order id already exists"))?;

        let ordered: Vec<ProductId> = order.items.iter().map(|item| item.pro_id.clone()).collect();
        let cart_lines_removed =
            sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND pro_id = ANY($2)")
                .bind(&order.user_id)
                .bind(&ordered)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        tx.commit().await?;

        Ok(PlacedOrder {
            order: row.into(),
            cart_lines_removed,
        })
    }

    async fn count_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(self.pool())
        .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
    }

    async fn list_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY order_date DESC, order_id \
             LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn get_order(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Order::from))
    }

    async fn update_order_status(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        payment_status: Option<PaymentStatus>,
        status: Option<OrderStatus>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET \
                 payment_status = COALESCE($3, payment_status), \
                 status = COALESCE($4, status) \
             WHERE order_id = $1 AND user_id = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(user_id)
        .bind(payment_status)
        .bind(status)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Order::from))
    }

    async fn update_order_delivery(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        update: &DeliveryUpdate,
    ) -> Result<DeliveryUpdateOutcome, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let current: Option<Option<OrderStatus>> = sqlx::query_scalar(
            "SELECT status FROM orders WHERE order_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match current {
            None => return Ok(DeliveryUpdateOutcome::NotFound),
            Some(status) if !status.is_some_and(|s| s.is_modifiable()) => {
                return Ok(DeliveryUpdateOutcome::NotModifiable(status));
            }
            Some(_) => {}
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET \
                 payment_status = COALESCE($3, payment_status), \
                 delivery_address = COALESCE($4, delivery_address), \
                 city = COALESCE($5, city), \
                 pincode = COALESCE($6, pincode), \
                 landmark = COALESCE($7, landmark), \
                 delivery_type = COALESCE($8, delivery_type) \
             WHERE order_id = $1 AND user_id = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(user_id)
        .bind(update.payment_status)
        .bind(update.delivery_address.as_deref())
        .bind(update.city.as_deref())
        .bind(update.pincode.as_deref())
        .bind(update.landmark.as_deref())
        .bind(update.delivery_type.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(DeliveryUpdateOutcome::Updated(row.into()))
    }

    async fn delete_order(&self, user_id: &UserId, order_id: &OrderId) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM orders WHERE order_id = $1 AND user_id = $2")
            .bind(order_id)
            .bind(user_id)
            .execute(self.pool())
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn order_totals_by_status(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<StatusTotals>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusTotalsRow>(
            "SELECT status, COUNT(*) AS count, COALESCE(SUM(total_amount), 0) AS total_amount \
             FROM orders WHERE user_id = $1 \
             GROUP BY status \
             ORDER BY CASE status \
                 WHEN 'Pending' THEN 0 \
                 WHEN 'Out for Delivery' THEN 1 \
                 WHEN 'Delivered' THEN 2 \
                 ELSE 3 END",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusTotals {
                status: row.status,
                count: row.count,
                total_amount: row.total_amount,
            })
            .collect())
    }
}
