//! Catalog reads and admin mutations.
//!
//! Reads are public. Mutations are reached only through admin-gated routes;
//! names are unique per kind, case-insensitively.

use tracing::instrument;

use ellectra_core::{CategoryId, Page, PageInfo, PageRequest, ProductId};

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::models::catalog::{Category, CategoryInput, CategorySummary, Product, ProductInput};
use crate::services::validation;

/// Default page size for category and product listings.
pub const CATALOG_PAGE_SIZE: u32 = 9;

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_owned())
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

/// One page of categories, newest first.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn list_categories<S: CatalogRepository>(
    store: &S,
    page: PageRequest,
) -> Result<Page<Category>> {
    let total = store.count_categories().await?;
    let items = store.list_categories(page.limit(), page.offset()).await?;
    Ok(Page::new(items, PageInfo::new(page, total)))
}

/// Every category as a name/id pair, sorted by name.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn all_categories<S: CatalogRepository>(store: &S) -> Result<Vec<CategorySummary>> {
    Ok(store
        .all_categories()
        .await?
        .into_iter()
        .map(CategorySummary::from)
        .collect())
}

/// # Errors
///
/// Returns `AppError::NotFound` if no category has this id.
pub async fn get_category<S: CatalogRepository>(store: &S, id: &CategoryId) -> Result<Category> {
    store.get_category(id).await?.ok_or_else(category_not_found)
}

/// One page of products, newest first, optionally within one category.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn list_products<S: CatalogRepository>(
    store: &S,
    category: Option<&CategoryId>,
    page: PageRequest,
) -> Result<Page<Product>> {
    let total = store.count_products(category).await?;
    let items = store
        .list_products(category, page.limit(), page.offset())
        .await?;
    Ok(Page::new(items, PageInfo::new(page, total)))
}

/// # Errors
///
/// Returns `AppError::NotFound` if no product has this id.
pub async fn get_product<S: CatalogRepository>(store: &S, id: &ProductId) -> Result<Product> {
    store.get_product(id).await?.ok_or_else(product_not_found)
}

/// Case-insensitive substring search over product names and descriptions.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a blank query.
#[instrument(skip(store))]
pub async fn search_products<S: CatalogRepository>(store: &S, query: &str) -> Result<Vec<Product>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("Search query cannot be empty".to_owned()));
    }
    Ok(store.search_products(query).await?)
}

/// # Errors
///
/// Returns `AppError::BadRequest` for invalid fields and `AppError::Conflict`
/// if the name is taken.
#[instrument(skip_all, fields(name = %input.cat_name))]
pub async fn create_category<S: CatalogRepository>(
    store: &S,
    input: &CategoryInput,
) -> Result<Category> {
    let category = validation::category(input)?;
    if store.find_category_by_name(&category.name, None).await?.is_some() {
        return Err(AppError::Conflict("Category already exists".to_owned()));
    }

    let created = store.insert_category(category).await?;
    tracing::info!(cat_id = %created.cat_id, "Created category");
    Ok(created)
}

/// # Errors
///
/// Returns `AppError::NotFound` for an unknown id and `AppError::Conflict`
/// if another category already has the name.
#[instrument(skip(store, input))]
pub async fn update_category<S: CatalogRepository>(
    store: &S,
    id: &CategoryId,
    input: &CategoryInput,
) -> Result<Category> {
    let category = validation::category(input)?;
    if store.get_category(id).await?.is_none() {
        return Err(category_not_found());
    }
    if store
        .find_category_by_name(&category.name, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Another category already has this name".to_owned(),
        ));
    }

    store
        .update_category(id, category)
        .await?
        .ok_or_else(category_not_found)
}

/// Delete a category and all of its products.
///
/// Returns how many products were deleted with it.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown id.
#[instrument(skip(store))]
pub async fn delete_category<S: CatalogRepository>(store: &S, id: &CategoryId) -> Result<u64> {
    let deleted_products = store
        .delete_category(id)
        .await?
        .ok_or_else(category_not_found)?;
    tracing::info!(deleted_products, "Deleted category");
    Ok(deleted_products)
}

/// # Errors
///
/// Returns `AppError::BadRequest` for invalid fields, `AppError::NotFound`
/// for an unknown category and `AppError::Conflict` if the name is taken.
#[instrument(skip_all, fields(name = %input.product_name))]
pub async fn create_product<S: CatalogRepository>(
    store: &S,
    input: &ProductInput,
) -> Result<Product> {
    let product = validation::product(input)?;
    if store.get_category(&product.cat_id).await?.is_none() {
        return Err(category_not_found());
    }
    if store.find_product_by_name(&product.name, None).await?.is_some() {
        return Err(AppError::Conflict("Product already exists".to_owned()));
    }

    let created = store.insert_product(product).await?;
    tracing::info!(pro_id = %created.pro_id, "Created product");
    Ok(created)
}

/// # Errors
///
/// Same as [`create_product`], plus `AppError::NotFound` for an unknown
/// product id.
#[instrument(skip(store, input))]
pub async fn update_product<S: CatalogRepository>(
    store: &S,
    id: &ProductId,
    input: &ProductInput,
) -> Result<Product> {
    let product = validation::product(input)?;
    if store.get_product(id).await?.is_none() {
        return Err(product_not_found());
    }
    if store.get_category(&product.cat_id).await?.is_none() {
        return Err(category_not_found());
    }
    if store
        .find_product_by_name(&product.name, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Another product already has this name".to_owned(),
        ));
    }

    store
        .update_product(id, product)
        .await?
        .ok_or_else(product_not_found)
}

/// # Errors
///
/// Returns `AppError::NotFound` for an unknown id.
#[instrument(skip(store))]
pub async fn delete_product<S: CatalogRepository>(store: &S, id: &ProductId) -> Result<()> {
    if store.delete_product(id).await? {
        Ok(())
    } else {
        Err(product_not_found())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn category_input(name: &str) -> CategoryInput {
        CategoryInput {
            cat_name: name.to_owned(),
            cat_img: "https://img.test/cat.png".to_owned(),
        }
    }

    fn product_input(cat_id: &CategoryId, name: &str, price: &str) -> ProductInput {
        ProductInput {
            cat_id: cat_id.clone(),
            product_name: name.to_owned(),
            product_description: format!("{name} for hobby electronics"),
            price: price.to_owned(),
            product_img: "https://img.test/p.png".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_category_names_unique_case_insensitive() {
        let store = MemoryStore::new();
        create_category(&store, &category_input("Sensors")).await.unwrap();

        let err = create_category(&store, &category_input("sensors")).await;
        assert!(matches!(err, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_category_keeps_own_name() {
        let store = MemoryStore::new();
        let sensors = create_category(&store, &category_input("Sensors")).await.unwrap();
        create_category(&store, &category_input("Motors")).await.unwrap();

        let renamed = update_category(&store, &sensors.cat_id, &category_input("SENSORS"))
            .await
            .unwrap();
        assert_eq!(renamed.cat_name, "SENSORS");

        let err = update_category(&store, &sensors.cat_id, &category_input("motors")).await;
        assert!(matches!(err, Err(AppError::Conflict(_))));

        let err = update_category(&store, &CategoryId::new("CAT000000"), &category_input("X Y")).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_category_reports_product_count() {
        let store = MemoryStore::new();
        let category = create_category(&store, &category_input("Sensors")).await.unwrap();
        for name in ["Ultrasonic Sensor", "PIR Sensor", "Hall Sensor"] {
            create_product(&store, &product_input(&category.cat_id, name, "120"))
                .await
                .unwrap();
        }

        assert_eq!(delete_category(&store, &category.cat_id).await.unwrap(), 3);
        assert_eq!(store.count_products(None).await.unwrap(), 0);
        assert!(matches!(
            delete_category(&store, &category.cat_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_product_requires_category() {
        let store = MemoryStore::new();
        let err = create_product(
            &store,
            &product_input(&CategoryId::new("CAT123456"), "Servo Motor", "300"),
        )
        .await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_product_pagination() {
        let store = MemoryStore::new();
        let category = create_category(&store, &category_input("Parts")).await.unwrap();
        for i in 0..21 {
            create_product(&store, &product_input(&category.cat_id, &format!("Part {i:02}"), "10"))
                .await
                .unwrap();
        }

        let page = list_products(&store, None, PageRequest::new(3, 9).unwrap())
            .await
            .unwrap();
        assert_eq!(page.info.total_pages, 3);
        assert_eq!(page.items.len(), 3);
        assert!(!page.info.has_more);

        let first = list_products(&store, Some(&category.cat_id), PageRequest::new(1, 9).unwrap())
            .await
            .unwrap();
        assert!(first.info.has_more);
        // Newest first.
        assert_eq!(first.items.first().unwrap().product_name, "Part 20");
    }

    #[tokio::test]
    async fn test_search_products() {
        let store = MemoryStore::new();
        let category = create_category(&store, &category_input("Parts")).await.unwrap();
        create_product(&store, &product_input(&category.cat_id, "Servo Motor", "300"))
            .await
            .unwrap();
        create_product(&store, &product_input(&category.cat_id, "LED Strip", "80"))
            .await
            .unwrap();

        let found = search_products(&store, "  servo ").await.unwrap();
        assert_eq!(found.len(), 1);
        // Descriptions are searched too.
        assert_eq!(search_products(&store, "HOBBY").await.unwrap().len(), 2);
        assert!(matches!(
            search_products(&store, "   ").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
