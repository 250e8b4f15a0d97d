//! Product catalog with an in-process cache.
//!
//! The catalog is read on every cart mutation (price lookup) and on
//! every cart load (deleted-product reconciliation), so the product
//! list is cached with a short TTL rather than hitting `PostgreSQL`
//! each time. Catalog writes happen out of process (the seeder), so
//! freshness rests on the TTL alone.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use comelones_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;

/// How long a cached product list stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache key for the single product-list entry.
const PRODUCTS_KEY: &str = "products";

/// Cached read access to the product catalog.
#[derive(Clone)]
pub struct Catalog {
    pool: PgPool,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl Catalog {
    /// Create a catalog backed by the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(CACHE_TTL)
            .build();

        Self { pool, cache }
    }

    /// All products, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache is cold and the database
    /// read fails.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(products) = self.cache.get(PRODUCTS_KEY).await {
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(&self.pool).list().await?);
        self.cache.insert(PRODUCTS_KEY, Arc::clone(&products)).await;
        Ok(products)
    }

    /// Look up a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be loaded.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products().await?;
        Ok(products.iter().find(|p| &p.id == id).cloned())
    }

    /// The set of live product IDs, for cart reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be loaded.
    pub async fn live_ids(&self) -> Result<HashSet<ProductId>, RepositoryError> {
        let products = self.products().await?;
        Ok(products.iter().map(|p| p.id.clone()).collect())
    }
}
