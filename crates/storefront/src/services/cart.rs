//! Cart operations.
//!
//! A user has at most one line per product; adding a product that is already
//! in the cart increases that line's quantity. Line totals are always
//! recomputed from the live product price.
//!
//! Add-or-merge reads the existing line and then writes it without a row
//! lock, so two concurrent adds of the same product can lose one increment.
//! The `UNIQUE (user_id, pro_id)` constraint still prevents duplicate lines:
//! the losing insert fails with a conflict.

use rust_decimal::Decimal;
use tracing::instrument;

use ellectra_core::{CartLineId, Price};

use crate::db::{CartRepository, CatalogRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::cart::{AddToCart, CartLineDetail, CartLineView, NewCartLine};
use crate::models::catalog::Product;
use crate::services::auth::Identity;
use crate::services::email::{CartUpdatedMessage, Notifier};
use crate::services::users;

/// Message returned alongside an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";

fn positive_quantity(quantity: i32) -> Result<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| AppError::BadRequest("Quantity must be at least 1".to_owned()))
}

fn line_total(price: &Price, quantity: i32) -> Result<Decimal> {
    price
        .line_total(positive_quantity(quantity)?)
        .ok_or_else(|| AppError::BadRequest("Cart item total is too large".to_owned()))
}

fn view(line: crate::models::cart::CartLine, product: &Product) -> CartLineView {
    CartLineView::from(CartLineDetail {
        line,
        product_name: Some(product.product_name.clone()),
        product_img: Some(product.product_img.clone()),
        price: Some(product.price.amount()),
    })
}

/// Add `quantity` of a product to the caller's cart, merging with an
/// existing line for the same product.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a quantity below 1 and
/// `AppError::NotFound` if the user or product does not exist.
#[instrument(skip_all, fields(email = %identity.email, pro_id = %request.pro_id))]
pub async fn add_or_merge<S>(
    store: &S,
    notifier: &Notifier,
    identity: &Identity,
    request: &AddToCart,
) -> Result<CartLineView>
where
    S: CartRepository + CatalogRepository + UserRepository,
{
    positive_quantity(request.quantity)?;
    let user = users::resolve(store, identity).await?;
    let product = store
        .get_product(&request.pro_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let line = match store
        .get_cart_line_for_product(&user.user_id, &product.pro_id)
        .await?
    {
        Some(existing) => {
            let quantity = existing
                .quantity
                .checked_add(request.quantity)
                .ok_or_else(|| AppError::BadRequest("Quantity is too large".to_owned()))?;
            let total = line_total(&product.price, quantity)?;
            store
                .set_cart_line_quantity(&user.user_id, &existing.cart_id, quantity, total)
                .await?
                .ok_or_else(|| AppError::NotFound("Cart item not found".to_owned()))?
        }
        None => {
            store
                .insert_cart_line(NewCartLine {
                    user_id: user.user_id.clone(),
                    pro_id: product.pro_id.clone(),
                    quantity: request.quantity,
                    total_price: line_total(&product.price, request.quantity)?,
                })
                .await?
        }
    };

    tracing::info!(cart_id = %line.cart_id, quantity = line.quantity, "Cart updated");
    notifier.cart_updated(CartUpdatedMessage {
        to: user.user_email.clone(),
        customer_name: user.user_name.clone(),
        product_name: product.product_name.clone(),
        product_img: product.product_img.clone(),
        quantity: line.quantity,
        price_per_item: product.price.amount(),
    });

    Ok(view(line, &product))
}

/// The caller's cart lines joined with live product details.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user does not exist.
pub async fn view_cart<S>(store: &S, identity: &Identity) -> Result<Vec<CartLineView>>
where
    S: CartRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    Ok(store
        .list_cart(&user.user_id)
        .await?
        .into_iter()
        .map(CartLineView::from)
        .collect())
}

/// Set a line's quantity and recompute its total from the current price.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the line is not the caller's or its
/// product no longer exists.
#[instrument(skip(store, identity), fields(email = %identity.email))]
pub async fn update_quantity<S>(
    store: &S,
    identity: &Identity,
    cart_id: &CartLineId,
    quantity: i32,
) -> Result<CartLineView>
where
    S: CartRepository + CatalogRepository + UserRepository,
{
    positive_quantity(quantity)?;
    let user = users::resolve(store, identity).await?;
    let line = store
        .get_cart_line(&user.user_id, cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_owned()))?;
    let product = store
        .get_product(&line.pro_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let total = line_total(&product.price, quantity)?;
    let line = store
        .set_cart_line_quantity(&user.user_id, cart_id, quantity, total)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_owned()))?;
    Ok(view(line, &product))
}

/// Remove one of the caller's cart lines.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the line is not the caller's.
#[instrument(skip(store, identity), fields(email = %identity.email))]
pub async fn remove<S>(store: &S, identity: &Identity, cart_id: &CartLineId) -> Result<()>
where
    S: CartRepository + UserRepository,
{
    let user = users::resolve(store, identity).await?;
    if store.delete_cart_line(&user.user_id, cart_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Cart item not found".to_owned()))
    }
}
