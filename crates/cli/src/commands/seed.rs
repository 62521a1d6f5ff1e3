//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Sensors
//!     image: https://cdn.ellectra.in/cat/sensors.png
//!     products:
//!       - name: Ultrasonic Sensor HC-SR04
//!         description: Distance sensor with a 2 cm to 4 m range
//!         price: "120.00"
//!         image: https://cdn.ellectra.in/pro/hc-sr04.png
//! ```
//!
//! Seeding is idempotent: categories and products that already exist (by
//! name, case-insensitively) are skipped.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use ellectra_storefront::db::{self, CatalogRepository, PgStore};
use ellectra_storefront::error::AppError;
use ellectra_storefront::models::catalog::{CategoryInput, ProductInput};
use ellectra_storefront::services::catalog;

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Could not read {0}: {1}")]
    Io(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{context}: {source}")]
    Catalog {
        context: String,
        #[source]
        source: AppError,
    },
}

#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub categories_skipped: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

/// Seed the catalog from `file_path` into the configured database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or an entry fails validation.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("ELLECTRA_DATABASE_URL"))?;

    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Io(file_path.to_owned(), e))?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;
    info!(categories = seed.categories.len(), "Parsed catalog");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let summary = seed_catalog(&PgStore::new(pool), &seed).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories_created);
    info!("  Categories skipped (already exist): {}", summary.categories_skipped);
    info!("  Products created: {}", summary.products_created);
    info!("  Products skipped (already exist): {}", summary.products_skipped);
    Ok(())
}

/// Insert every category and product in `seed` that does not exist yet.
///
/// # Errors
///
/// Returns `SeedError::Catalog` naming the first entry that fails.
pub async fn seed_catalog<S: CatalogRepository>(
    store: &S,
    seed: &CatalogSeed,
) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for category in &seed.categories {
        let context = |source: AppError| SeedError::Catalog {
            context: format!("category {:?}", category.name),
            source,
        };

        let cat_id = match store
            .find_category_by_name(category.name.trim(), None)
            .await
            .map_err(|e| context(e.into()))?
        {
            Some(existing) => {
                summary.categories_skipped += 1;
                existing.cat_id
            }
            None => {
                let input = CategoryInput {
                    cat_name: category.name.clone(),
                    cat_img: category.image.clone(),
                };
                summary.categories_created += 1;
                catalog::create_category(store, &input)
                    .await
                    .map_err(context)?
                    .cat_id
            }
        };

        for product in &category.products {
            let exists = store
                .find_product_by_name(product.name.trim(), None)
                .await
                .map_err(|e| context(e.into()))?
                .is_some();
            if exists {
                summary.products_skipped += 1;
                continue;
            }

            let input = ProductInput {
                cat_id: cat_id.clone(),
                product_name: product.name.clone(),
                product_description: product.description.clone(),
                price: product.price.clone(),
                product_img: product.image.clone(),
            };
            catalog::create_product(store, &input)
                .await
                .map_err(|source| SeedError::Catalog {
                    context: format!("product {:?}", product.name),
                    source,
                })?;
            summary.products_created += 1;
        }
    }

    Ok(summary)
}
