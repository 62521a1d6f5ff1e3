//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ellectra_core::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub cat_id: CategoryId,
    pub cat_name: String,
    /// Hosted image URL.
    pub cat_img: String,
    pub created_at: DateTime<Utc>,
}

/// A product belonging to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub pro_id: ProductId,
    pub cat_id: CategoryId,
    pub product_name: String,
    pub product_description: String,
    pub price: Price,
    /// Hosted image URL.
    pub product_img: String,
    pub created_at: DateTime<Utc>,
}

/// Category name and id, for unpaginated pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub cat_id: CategoryId,
    pub cat_name: String,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            cat_id: category.cat_id,
            cat_name: category.cat_name,
        }
    }
}

/// Admin request body for creating or editing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub cat_name: String,
    pub cat_img: String,
}

/// Admin request body for creating or editing a product.
///
/// `price` arrives as text and is validated into a [`Price`] by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub cat_id: CategoryId,
    pub product_name: String,
    pub product_description: String,
    pub price: String,
    pub product_img: String,
}

/// Validated category fields handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub image: String,
}

/// Validated product fields handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub cat_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
}
