//! Order placement and history.
//!
//! Prices are read from the catalog when an order is placed and frozen into
//! the order's item snapshots; later price changes never touch placed orders.
//! Status transitions are not enforced in either direction.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use ellectra_core::{
    OrderId, OrderStatus, Page, PageInfo, PageRequest, PaymentStatus, ProductId,
    checked_amount_add,
};

use crate::db::{CatalogRepository, OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::catalog::Product;
use crate::models::order::{
    DEFAULT_DELIVERY_TYPE, DeliveryDetails, DeliveryUpdate, DeliveryUpdateOutcome, NewOrder,
    Order, OrderItem, OrderItemRequest, OrderItemView, OrderStats, OrderView, PlaceOrderRequest,
    StatusUpdate,
};
use crate::models::user::User;
use crate::services::auth::Identity;
use crate::services::email::{Notifier, OrderPlacedMessage};
use crate::services::users;

/// Default page size for order history.
pub const ORDER_PAGE_SIZE: u32 = 20;

/// Allowed values for both status fields.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOptions {
    pub payment_status_options: [PaymentStatus; 2],
    pub order_status_options: [OrderStatus; 3],
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_owned())
}

fn order_too_large() -> AppError {
    AppError::BadRequest("Order total is too large".to_owned())
}

fn index_products(products: Vec<Product>) -> HashMap<ProductId, Product> {
    products
        .into_iter()
        .map(|product| (product.pro_id.clone(), product))
        .collect()
}

/// Price requested lines against live products.
///
/// Every line becomes its own snapshot, so repeated products stay separate.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty request, a non-positive
/// quantity or a total past `ellectra_core::MAX_AMOUNT`, and `AppError::NotFound` naming the first unknown product.
pub fn price_items(
    requests: &[OrderItemRequest],
    products: &HashMap<ProductId, Product>,
) -> Result<(Vec<OrderItem>, Decimal)> {
    if requests.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".to_owned(),
        ));
    }

    let quantities = requests
        .iter()
        .map(|request| {
            u32::try_from(request.quantity)
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| AppError::BadRequest("Quantity must be greater than 0".to_owned()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut total = Decimal::ZERO;
    let mut items = Vec::with_capacity(requests.len());
    for (request, quantity) in requests.iter().zip(quantities) {
        let product = products.get(&request.pro_id).ok_or_else(|| {
            AppError::NotFound(format!("Product {} not found", request.pro_id))
        })?;
        let item_total = product.price.line_total(quantity).ok_or_else(order_too_large)?;
        total = checked_amount_add(total, item_total).ok_or_else(order_too_large)?;
        items.push(OrderItem {
            pro_id: request.pro_id.clone(),
            quantity,
            price_per_item: product.price.amount(),
            item_total,
        });
    }

    Ok((items, total))
}

/// Place an order for the caller and clear the ordered products from their
/// cart.
///
/// The confirmation email is queued only after the order has committed.
///
/// # Errors
///
/// Returns `AppError::BadRequest` or `AppError::NotFound` from
/// [`price_items`], and a database error if the transaction fails.
#[instrument(skip_all, fields(email = %identity.email, items = request.items.len()))]
pub async fn place_order<S>(
    store: &S,
    notifier: &Notifier,
    identity: &Identity,
    request: PlaceOrderRequest,
) -> Result<Order>
where
    S: CatalogRepository + OrderRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;

    let ids: Vec<ProductId> = request.items.iter().map(|i| i.pro_id.clone()).collect();
    let products = index_products(store.get_products(&ids).await?);
    let (items, total_amount) = price_items(&request.items, &products)?;

    let placed = store
        .place_order(NewOrder {
            user_id: user.user_id.clone(),
            items,
            total_amount,
            payment_status: request.payment_status.unwrap_or_default(),
            delivery: DeliveryDetails {
                delivery_address: request.delivery_address,
                city: request.city,
                pincode: request.pincode,
                landmark: request.landmark,
                delivery_type: request
                    .delivery_type
                    .unwrap_or_else(|| DEFAULT_DELIVERY_TYPE.to_owned()),
            },
        })
        .await?;

    let order = placed.order;
    tracing::info!(
        order_id = %order.order_id,
        total = %order.total_amount,
        cart_lines_removed = placed.cart_lines_removed,
        "Order placed"
    );
    add_breadcrumb(
        "order",
        "Order placed",
        Some(&[("order_id", order.order_id.as_str())]),
    );

    notifier.order_placed(OrderPlacedMessage {
        to: user.user_email.clone(),
        customer_name: user.user_name.clone(),
        order_id: order.order_id.clone(),
        items: order
            .items
            .iter()
            .map(|item| OrderItemView::enrich(item.clone(), products.get(&item.pro_id)))
            .collect(),
        total_amount: order.total_amount,
        delivery_type: order.delivery.delivery_type.clone(),
    });

    Ok(order)
}

async fn enrich<S: CatalogRepository>(
    store: &S,
    owner: &User,
    orders: Vec<Order>,
) -> Result<Vec<OrderView>> {
    let mut ids: Vec<ProductId> = orders
        .iter()
        .flat_map(|order| order.items.iter().map(|item| item.pro_id.clone()))
        .collect();
    ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();

    let products = index_products(store.get_products(&ids).await?);
    Ok(orders
        .into_iter()
        .map(|order| OrderView::build(order, owner, |id| products.get(id)))
        .collect())
}

/// The caller's orders, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user does not exist.
pub async fn view_orders<S>(
    store: &S,
    identity: &Identity,
    page: PageRequest,
    status: Option<OrderStatus>,
) -> Result<Page<OrderView>>
where
    S: CatalogRepository + OrderRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    let total = store.count_orders(&user.user_id, status).await?;
    let orders = store
        .list_orders(&user.user_id, status, page.limit(), page.offset())
        .await?;
    let items = enrich(store, &user, orders).await?;
    Ok(Page::new(items, PageInfo::new(page, total)))
}

/// # Errors
///
/// Returns `AppError::NotFound` if the order is absent or not the caller's.
pub async fn view_order<S>(store: &S, identity: &Identity, order_id: &OrderId) -> Result<OrderView>
where
    S: CatalogRepository + OrderRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    let order = store
        .get_order(&user.user_id, order_id)
        .await?
        .ok_or_else(order_not_found)?;
    enrich(store, &user, vec![order])
        .await?
        .pop()
        .ok_or_else(order_not_found)
}

/// Overwrite the payment and/or fulfillment status of an order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when neither field is set and
/// `AppError::NotFound` if the order is absent or not the caller's.
#[instrument(skip(store, identity), fields(email = %identity.email))]
pub async fn update_status<S>(
    store: &S,
    identity: &Identity,
    order_id: &OrderId,
    update: &StatusUpdate,
) -> Result<Order>
where
    S: OrderRepository + UserRepository,
{
    if update.payment_status.is_none() && update.status.is_none() {
        return Err(AppError::BadRequest(
            "Provide payment_status or status".to_owned(),
        ));
    }

    let user = users::resolve(store, identity).await?;
    let order = store
        .update_order_status(&user.user_id, order_id, update.payment_status, update.status)
        .await?
        .ok_or_else(order_not_found)?;
    tracing::info!(payment_status = %order.payment_status, status = ?order.status, "Order status updated");
    Ok(order)
}

/// Edit the delivery details of a `Pending` order.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order is absent or not the caller's,
/// and `AppError::Conflict` if it has already left `Pending`.
#[instrument(skip(store, identity, update), fields(email = %identity.email))]
pub async fn update_delivery<S>(
    store: &S,
    identity: &Identity,
    order_id: &OrderId,
    update: &DeliveryUpdate,
) -> Result<Order>
where
    S: OrderRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    match store
        .update_order_delivery(&user.user_id, order_id, update)
        .await?
    {
        DeliveryUpdateOutcome::Updated(order) => Ok(order),
        DeliveryUpdateOutcome::NotFound => Err(order_not_found()),
        DeliveryUpdateOutcome::NotModifiable(status) => {
            tracing::debug!(?status, "Rejected delivery edit");
            Err(AppError::Conflict("Order cannot be modified".to_owned()))
        }
    }
}

/// # Errors
///
/// Returns `AppError::NotFound` if the order is absent or not the caller's.
#[instrument(skip(store, identity), fields(email = %identity.email))]
pub async fn delete_order<S>(store: &S, identity: &Identity, order_id: &OrderId) -> Result<()>
where
    S: OrderRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    if store.delete_order(&user.user_id, order_id).await? {
        Ok(())
    } else {
        Err(order_not_found())
    }
}

/// Order count and value per status, plus grand totals.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user does not exist.
pub async fn stats<S>(store: &S, identity: &Identity) -> Result<OrderStats>
where
    S: OrderRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    Ok(OrderStats::from_groups(
        store.order_totals_by_status(&user.user_id).await?,
    ))
}

#[must_use]
pub const fn status_options() -> StatusOptions {
    StatusOptions {
        payment_status_options: PaymentStatus::ALL,
        order_status_options: OrderStatus::ALL,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use ellectra_core::{Email, Price};

    use super::*;
    use crate::db::{CartRepository, MemoryStore};
    use crate::models::cart::AddToCart;
    use crate::models::catalog::{NewCategory, NewProduct, ProductInput};
    use crate::models::user::NewUser;
    use crate::services::{cart, catalog};

    struct Fixture {
        store: MemoryStore,
        identity: Identity,
        products: Vec<Product>,
    }

    async fn fixture(prices: &[&str]) -> Fixture {
        let store = MemoryStore::new();
        let email = Email::parse("ada@example.com").unwrap();
        store
            .create_user(NewUser {
                email: email.clone(),
                name: "Ada".to_owned(),
            })
            .await
            .unwrap();
        let category = store
            .insert_category(NewCategory {
                name: "Parts".to_owned(),
                image: "https://img.test/c.png".to_owned(),
            })
            .await
            .unwrap();

        let mut products = Vec::new();
        for (i, price) in prices.iter().enumerate() {
            products.push(
                store
                    .insert_product(NewProduct {
                        cat_id: category.cat_id.clone(),
                        name: format!("Part {i}"),
                        description: "Spare part for testing".to_owned(),
                        price: Price::parse(price).unwrap(),
                        image: "https://img.test/p.png".to_owned(),
                    })
                    .await
                    .unwrap(),
            );
        }

        Fixture {
            store,
            identity: Identity {
                email,
                full_name: "Ada".to_owned(),
            },
            products,
        }
    }

    fn line(product: &Product, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            pro_id: product.pro_id.clone(),
            quantity,
        }
    }

    fn request(items: Vec<OrderItemRequest>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            items,
            payment_status: None,
            delivery_address: Some("12 Ellectra Street".to_owned()),
            city: Some("Chennai".to_owned()),
            pincode: Some("600042".to_owned()),
            landmark: None,
            delivery_type: None,
        }
    }

    async fn place(f: &Fixture, items: Vec<OrderItemRequest>) -> Order {
        place_order(&f.store, &Notifier::disabled(), &f.identity, request(items))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_total_is_sum_of_line_totals() {
        let f = fixture(&["50", "25"]).await;
        let [p1, p2] = [&f.products[0], &f.products[1]];

        let order = place(&f, vec![line(p1, 1), line(p2, 2)]).await;

        assert_eq!(order.total_amount, Decimal::from_str("100.00").unwrap());
        assert_eq!(order.items.len(), 2);
        assert!(order.order_id.as_str().starts_with("ORD"));
        assert_eq!(order.status, Some(OrderStatus::Pending));
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.delivery.delivery_type, DEFAULT_DELIVERY_TYPE);
    }

    #[tokio::test]
    async fn test_duplicate_products_stay_separate_lines() {
        let f = fixture(&["10"]).await;
        let p = &f.products[0];

        let order = place(&f, vec![line(p, 1), line(p, 2)]).await;
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_amount, Decimal::from(30));
    }

    #[tokio::test]
    async fn test_rejects_bad_items() {
        let f = fixture(&["10"]).await;
        let notifier = Notifier::disabled();

        let empty = place_order(&f.store, &notifier, &f.identity, request(vec![])).await;
        assert!(matches!(empty, Err(AppError::BadRequest(_))));

        let zero = place_order(
            &f.store,
            &notifier,
            &f.identity,
            request(vec![line(&f.products[0], 0)]),
        )
        .await;
        assert!(matches!(zero, Err(AppError::BadRequest(_))));

        let missing = OrderItemRequest {
            pro_id: ProductId::new("PROMISSING"),
            quantity: 1,
        };
        let err = place_order(
            &f.store,
            &notifier,
            &f.identity,
            request(vec![line(&f.products[0], 1), missing]),
        )
        .await;
        match err {
            Err(AppError::NotFound(message)) => assert!(message.contains("PROMISSING")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_placing_order_clears_ordered_cart_lines() {
        let f = fixture(&["10", "20"]).await;
        let notifier = Notifier::disabled();
        for product in &f.products {
            cart::add_or_merge(
                &f.store,
                &notifier,
                &f.identity,
                &AddToCart {
                    pro_id: product.pro_id.clone(),
                    quantity: 3,
                },
            )
            .await
            .unwrap();
        }

        // Ordering fewer than are in the cart still removes the whole line.
        place(&f, vec![line(&f.products[0], 1)]).await;

        let remaining = cart::view_cart(&f.store, &f.identity).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.first().unwrap().product_id, f.products[1].pro_id);
    }

    fn reprice(product: &Product, price: &str) -> ProductInput {
        ProductInput {
            cat_id: product.cat_id.clone(),
            product_name: product.product_name.clone(),
            product_description: product.product_description.clone(),
            price: price.to_owned(),
            product_img: product.product_img.clone(),
        }
    }

    #[tokio::test]
    async fn test_snapshot_survives_price_change() {
        let f = fixture(&["50", "25"]).await;
        let [p1, p2] = [&f.products[0], &f.products[1]];
        let order = place(&f, vec![line(p1, 1), line(p2, 2)]).await;

        catalog::update_product(&f.store, &p1.pro_id, &reprice(p1, "75"))
            .await
            .unwrap();
        catalog::update_product(&f.store, &p2.pro_id, &reprice(p2, "5.50"))
            .await
            .unwrap();

        let view = view_order(&f.store, &f.identity, &order.order_id).await.unwrap();
        let prices: Vec<_> = view.items.iter().map(|item| item.price_per_item).collect();
        assert_eq!(prices, [Decimal::from(50), Decimal::from(25)]);
        assert_eq!(view.items.get(1).unwrap().item_total, Decimal::from(50));
        assert_eq!(view.total_amount, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_snapshot_survives_product_deletion() {
        let f = fixture(&["40"]).await;
        let product = &f.products[0];
        let order = place(&f, vec![line(product, 2)]).await;

        f.store.delete_product(&product.pro_id).await.unwrap();

        let view = view_order(&f.store, &f.identity, &order.order_id).await.unwrap();
        let item = view.items.first().unwrap();
        assert_eq!(item.product_name, "Unknown Product");
        assert_eq!(item.product_img, None);
        assert_eq!(item.item_total, Decimal::from(80));
        assert_eq!(view.total_amount, Decimal::from(80));
        assert_eq!(view.user_name, "Ada");
    }

    #[tokio::test]
    async fn test_oversized_order_total_is_rejected() {
        let f = fixture(&["9999999999.99", "1"]).await;
        let notifier = Notifier::disabled();
        let [top, cheap] = [&f.products[0], &f.products[1]];

        for items in [
            vec![line(top, 2)],
            vec![line(top, i64::from(u32::MAX))],
            vec![line(top, 1), line(cheap, 1)],
        ] {
            let err = place_order(&f.store, &notifier, &f.identity, request(items)).await;
            assert!(matches!(err, Err(AppError::BadRequest(_))), "{err:?}");
        }

        let too_many = place_order(
            &f.store,
            &notifier,
            &f.identity,
            request(vec![line(cheap, i64::from(u32::MAX) + 1)]),
        )
        .await;
        assert!(matches!(too_many, Err(AppError::BadRequest(_))));

        let history = view_orders(&f.store, &f.identity, PageRequest::new(1, 20).unwrap(), None)
            .await
            .unwrap();
        assert_eq!(history.info.total_count, 0);

        let order = place(&f, vec![line(top, 1)]).await;
        assert_eq!(order.total_amount, ellectra_core::MAX_AMOUNT);
    }

    #[tokio::test]
    async fn test_update_status_requires_a_field() {
        let f = fixture(&["10"]).await;
        let order = place(&f, vec![line(&f.products[0], 1)]).await;

        let err = update_status(&f.store, &f.identity, &order.order_id, &StatusUpdate::default()).await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));

        let err = update_status(
            &f.store,
            &f.identity,
            &OrderId::new("ORD000000"),
            &StatusUpdate {
                status: Some(OrderStatus::Delivered),
                ..StatusUpdate::default()
            },
        )
        .await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_status_transitions_are_not_enforced() {
        let f = fixture(&["10"]).await;
        let order = place(&f, vec![line(&f.products[0], 1)]).await;

        for status in [OrderStatus::Delivered, OrderStatus::Pending] {
            let updated = update_status(
                &f.store,
                &f.identity,
                &order.order_id,
                &StatusUpdate {
                    status: Some(status),
                    ..StatusUpdate::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(updated.status, Some(status));
        }
    }

    #[tokio::test]
    async fn test_status_update_keeps_the_other_field() {
        let f = fixture(&["10"]).await;
        let order = place(&f, vec![line(&f.products[0], 1)]).await;

        let shipped = update_status(
            &f.store,
            &f.identity,
            &order.order_id,
            &StatusUpdate {
                status: Some(OrderStatus::OutForDelivery),
                ..StatusUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(shipped.status, Some(OrderStatus::OutForDelivery));
        assert_eq!(shipped.payment_status, PaymentStatus::Pending);

        let paid = update_status(
            &f.store,
            &f.identity,
            &order.order_id,
            &StatusUpdate {
                payment_status: Some(PaymentStatus::Successfully),
                ..StatusUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Successfully);
        assert_eq!(paid.status, Some(OrderStatus::OutForDelivery));

        let stored = view_order(&f.store, &f.identity, &order.order_id).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Successfully);
        assert_eq!(stored.status, Some(OrderStatus::OutForDelivery));
    }

    #[tokio::test]
    async fn test_delivery_edit_only_while_pending() {
        let f = fixture(&["10"]).await;
        let order = place(&f, vec![line(&f.products[0], 1)]).await;
        let edit = DeliveryUpdate {
            city: Some("Madurai".to_owned()),
            ..DeliveryUpdate::default()
        };

        let updated = update_delivery(&f.store, &f.identity, &order.order_id, &edit)
            .await
            .unwrap();
        assert_eq!(updated.delivery.city.as_deref(), Some("Madurai"));
        assert_eq!(updated.delivery.pincode.as_deref(), Some("600042"));

        update_status(
            &f.store,
            &f.identity,
            &order.order_id,
            &StatusUpdate {
                status: Some(OrderStatus::Delivered),
                ..StatusUpdate::default()
            },
        )
        .await
        .unwrap();

        let err = update_delivery(&f.store, &f.identity, &order.order_id, &edit).await;
        assert!(matches!(err, Err(AppError::Conflict(_))));

        let err = update_delivery(&f.store, &f.identity, &OrderId::new("ORD000000"), &edit).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_filter_and_stats() {
        let f = fixture(&["10", "5"]).await;
        let first = place(&f, vec![line(&f.products[0], 1)]).await;
        place(&f, vec![line(&f.products[1], 2)]).await;
        update_status(
            &f.store,
            &f.identity,
            &first.order_id,
            &StatusUpdate {
                status: Some(OrderStatus::Delivered),
                ..StatusUpdate::default()
            },
        )
        .await
        .unwrap();

        let all = view_orders(&f.store, &f.identity, PageRequest::new(1, 20).unwrap(), None)
            .await
            .unwrap();
        assert_eq!(all.info.total_count, 2);

        let delivered = view_orders(
            &f.store,
            &f.identity,
            PageRequest::new(1, 20).unwrap(),
            Some(OrderStatus::Delivered),
        )
        .await
        .unwrap();
        assert_eq!(delivered.items.len(), 1);
        assert_eq!(delivered.items.first().unwrap().order_id, first.order_id);

        let stats = stats(&f.store, &f.identity).await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_amount, Decimal::from(20));
        assert_eq!(stats.by_status.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_order() {
        let f = fixture(&["10"]).await;
        let order = place(&f, vec![line(&f.products[0], 1)]).await;

        delete_order(&f.store, &f.identity, &order.order_id).await.unwrap();
        assert!(matches!(
            view_order(&f.store, &f.identity, &order.order_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(f.store.list_cart(&order.user_id).await.unwrap().is_empty());
    }
}
