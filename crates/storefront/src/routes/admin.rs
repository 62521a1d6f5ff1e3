//! Catalog administration, restricted to the configured admin account.

use axum::{Json, Router, extract::State, http::StatusCode, routing::{get, post}};
use serde::Serialize;
use tracing::instrument;

use ellectra_core::{CategoryId, ProductId};

use super::{ApiJson, ApiPath, MessageResponse};
use crate::db::Store;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::catalog::{Category, CategoryInput, Product, ProductInput};
use crate::services::catalog;
use crate::state::AppState;

/// Build the admin routes router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/categories", post(create_category::<S>))
        .route(
            "/categories/{id}",
            get(show_category::<S>)
                .put(update_category::<S>)
                .delete(delete_category::<S>),
        )
        .route("/products", post(create_product::<S>))
        .route(
            "/products/{id}",
            get(show_product::<S>)
                .put(update_product::<S>)
                .delete(delete_product::<S>),
        )
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub message: &'static str,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: &'static str,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct CategoryDeleted {
    pub message: &'static str,
    pub deleted_products_count: u64,
}

#[instrument(skip_all, fields(admin = %admin.email))]
async fn create_category<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let category = catalog::create_category(state.store(), &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: "Category created successfully",
            category,
        }),
    ))
}

async fn show_category<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(catalog::get_category(state.store(), &id).await?))
}

#[instrument(skip_all, fields(admin = %admin.email, %id))]
async fn update_category<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<CategoryResponse>> {
    let category = catalog::update_category(state.store(), &id, &input).await?;
    Ok(Json(CategoryResponse {
        message: "Category updated successfully",
        category,
    }))
}

#[instrument(skip_all, fields(admin = %admin.email, %id))]
async fn delete_category<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryDeleted>> {
    let deleted_products_count = catalog::delete_category(state.store(), &id).await?;
    Ok(Json(CategoryDeleted {
        message: "Category deleted successfully",
        deleted_products_count,
    }))
}

#[instrument(skip_all, fields(admin = %admin.email))]
async fn create_product<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let product = catalog::create_product(state.store(), &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully",
            product,
        }),
    ))
}

async fn show_product<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(catalog::get_product(state.store(), &id).await?))
}

#[instrument(skip_all, fields(admin = %admin.email, %id))]
async fn update_product<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductResponse>> {
    let product = catalog::update_product(state.store(), &id, &input).await?;
    Ok(Json(ProductResponse {
        message: "Product updated successfully",
        product,
    }))
}

#[instrument(skip_all, fields(admin = %admin.email, %id))]
async fn delete_product<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>> {
    catalog::delete_product(state.store(), &id).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
