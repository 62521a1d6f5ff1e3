//! Public catalog route handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use ellectra_core::{CategoryId, Page, ProductId};

use super::{ApiPath, ApiQuery, page_request};
use crate::db::Store;
use crate::error::Result;
use crate::models::catalog::{Category, CategorySummary, Product};
use crate::services::catalog::{self, CATALOG_PAGE_SIZE};
use crate::state::AppState;

/// Build the product routes router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_products::<S>))
        .route("/search", get(search::<S>))
        .route("/categories", get(list_categories::<S>))
        .route("/categories/all", get(all_categories::<S>))
        .route("/categories/{id}", get(show_category::<S>))
        .route("/{id}", get(show_product::<S>))
}

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<CategoryId>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<Product>,
}

/// GET /products/categories
async fn list_categories<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> Result<Json<Page<Category>>> {
    let page = page_request(query.page, query.page_size, CATALOG_PAGE_SIZE)?;
    Ok(Json(catalog::list_categories(state.store(), page).await?))
}

/// GET /products/categories/all
async fn all_categories<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<CategorySummary>>> {
    Ok(Json(catalog::all_categories(state.store()).await?))
}

/// GET /products/categories/{id}
async fn show_category<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(catalog::get_category(state.store(), &id).await?))
}

/// GET /products
async fn list_products<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Json<Page<Product>>> {
    let page = page_request(query.page, query.page_size, CATALOG_PAGE_SIZE)?;
    Ok(Json(
        catalog::list_products(state.store(), query.category_id.as_ref(), page).await?,
    ))
}

/// GET /products/search?q=
async fn search<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let results = catalog::search_products(state.store(), &query.q).await?;
    Ok(Json(SearchResponse {
        query: query.q.trim().to_owned(),
        count: results.len(),
        results,
    }))
}

/// GET /products/{id}
async fn show_product<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(catalog::get_product(state.store(), &id).await?))
}
