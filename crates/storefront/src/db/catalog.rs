//! Category and product repository.

use std::future::Future;

use chrono::{DateTime, Utc};

use ellectra_core::{CategoryId, Price, ProductId};

use super::{PgStore, RepositoryError, conflict_on_unique, existing_ids};
use crate::models::catalog::{Category, NewCategory, NewProduct, Product};

/// Storage for categories and products.
pub trait CatalogRepository: Send + Sync {
    fn count_categories(&self) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Newest first.
    fn list_categories(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// Every category, ordered by name.
    fn all_categories(&self) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    fn get_category(
        &self,
        id: &CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Case-insensitive name lookup, optionally ignoring one category.
    fn find_category_by_name(
        &self,
        name: &str,
        excluding: Option<&CategoryId>,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    fn insert_category(
        &self,
        category: NewCategory,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    fn update_category(
        &self,
        id: &CategoryId,
        category: NewCategory,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Delete a category and its products in one transaction.
    ///
    /// Returns the number of products removed, or `None` if the category
    /// does not exist.
    fn delete_category(
        &self,
        id: &CategoryId,
    ) -> impl Future<Output = Result<Option<u64>, RepositoryError>> + Send;

    fn count_products(
        &self,
        category: Option<&CategoryId>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Newest first, optionally within one category.
    fn list_products(
        &self,
        category: Option<&CategoryId>,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Batch lookup. Missing ids are simply absent from the result.
    fn get_products(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Case-insensitive name lookup, optionally ignoring one product.
    fn find_product_by_name(
        &self,
        name: &str,
        excluding: Option<&ProductId>,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Case-insensitive substring match over name and description.
    fn search_products(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn insert_product(
        &self,
        product: NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    fn update_product(
        &self,
        id: &ProductId,
        product: NewProduct,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn delete_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

const CATEGORY_COLUMNS: &str = "cat_id, cat_name, cat_img, created_at";
const PRODUCT_COLUMNS: &str =
    "pro_id, cat_id, product_name, product_description, price, product_img, created_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    cat_id: CategoryId,
    cat_name: String,
    cat_img: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            cat_id: row.cat_id,
            cat_name: row.cat_name,
            cat_img: row.cat_img,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    pro_id: ProductId,
    cat_id: CategoryId,
    product_name: String,
    product_description: String,
    price: Price,
    product_img: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            pro_id: row.pro_id,
            cat_id: row.cat_id,
            product_name: row.product_name,
            product_description: row.product_description,
            price: row.price,
            product_img: row.product_img,
            created_at: row.created_at,
        }
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn to_count(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count).map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
}

impl CatalogRepository for PgStore {
    async fn count_categories(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool())
            .await?;
        to_count(count)
    }

    async fn list_categories(&self, limit: i64, offset: i64) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             ORDER BY created_at DESC, cat_id \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn all_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY cat_name"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE cat_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Category::from))
    }

    async fn find_category_by_name(
        &self,
        name: &str,
        excluding: Option<&CategoryId>,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE lower(cat_name) = lower($1) AND ($2::text IS NULL OR cat_id <> $2) \
             LIMIT 1"
        ))
        .bind(name)
        .bind(excluding)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Category::from))
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let existing = existing_ids(self.pool(), "SELECT cat_id FROM categories").await?;
        let cat_id = CategoryId::generate_unique(&existing, &mut rand::rng())?;

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (cat_id, cat_name, cat_img) \
             VALUES ($1, $2, $3) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&cat_id)
        .bind(&category.name)
        .bind(&category.image)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?;

        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: &CategoryId,
        category: NewCategory,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories SET cat_name = $2, cat_img = $3 \
             WHERE cat_id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&category.name)
        .bind(&category.image)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?;

        Ok(row.map(Category::from))
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<Option<u64>, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let found: Option<CategoryId> =
            sqlx::query_scalar("SELECT cat_id FROM categories WHERE cat_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return Ok(None);
        }

        let products_removed = sqlx::query("DELETE FROM products WHERE cat_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM categories WHERE cat_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(products_removed))
    }

    async fn count_products(&self, category: Option<&CategoryId>) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE ($1::text IS NULL OR cat_id = $1)")
                .bind(category)
                .fetch_one(self.pool())
                .await?;
        to_count(count)
    }

    async fn list_products(
        &self,
        category: Option<&CategoryId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::text IS NULL OR cat_id = $1) \
             ORDER BY created_at DESC, pro_id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE pro_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE pro_id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product_by_name(
        &self,
        name: &str,
        excluding: Option<&ProductId>,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE lower(product_name) = lower($1) AND ($2::text IS NULL OR pro_id <> $2) \
             LIMIT 1"
        ))
        .bind(name)
        .bind(excluding)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE product_name ILIKE $1 OR product_description ILIKE $1 \
             ORDER BY product_name"
        ))
        .bind(like_pattern(query))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let existing = existing_ids(self.pool(), "SELECT pro_id FROM products").await?;
        let pro_id = ProductId::generate_unique(&existing, &mut rand::rng())?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (pro_id, cat_id, product_name, product_description, price, product_img) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&pro_id)
        .bind(&product.cat_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?;

        Ok(row.into())
    }

    async fn update_product(
        &self,
        id: &ProductId,
        product: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET cat_id = $2, product_name = $3, product_description = $4, \
                                 price = $5, product_img = $6 \
             WHERE pro_id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&product.cat_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?;

        Ok(row.map(Product::from))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM products WHERE pro_id = $1")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
