//! Database operations for the storefront.
//!
//! # Tables
//!
//! - `users` - Customers, created on first Google login
//! - `categories` - Product categories (names unique, case-insensitive)
//! - `products` - Catalog products, cascade-deleted with their category
//! - `cart_lines` - One row per (user, product); may outlive its product
//! - `orders` - Placed orders with a JSONB item snapshot
//!
//! # Repositories
//!
//! Each table group has a repository trait ([`UserRepository`],
//! [`CatalogRepository`], [`CartRepository`], [`OrderRepository`]). Handlers
//! and services are generic over [`Store`], which bundles all four. Two
//! stores exist: [`PgStore`] for production and [`MemoryStore`] for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p ellectra-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod memory;
pub mod orders;
pub mod users;

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use ellectra_core::IdError;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgExecutor, PgPool};
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate category name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// No free identifier could be drawn.
    #[error(transparent)]
    IdGeneration(#[from] IdError),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Everything the HTTP layer needs from storage.
pub trait Store:
    UserRepository + CatalogRepository + CartRepository + OrderRepository + Clone + 'static
{
    /// Check that the backing store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Load every id in a table so a fresh one can be drawn against them.
async fn existing_ids<'e, E, T>(executor: E, query: &'static str) -> Result<HashSet<T>, RepositoryError>
where
    E: PgExecutor<'e>,
    T: From<String> + Eq + Hash,
{
    let ids: Vec<String> = sqlx::query_scalar(query).fetch_all(executor).await?;
    Ok(ids.into_iter().map(T::from).collect())
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
