//! Product catalog repository.

use sqlx::{PgPool, Row};

use comelones_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, price, description, image_url, created_at
            FROM product
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Product {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    price: row.try_get("price")?,
                    description: row.try_get("description")?,
                    image_url: row.try_get("image_url")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// List the IDs of every live product. The seeder uses this to find
    /// rows absent from the seed file when pruning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_ids(&self) -> Result<Vec<ProductId>, RepositoryError> {
        let rows = sqlx::query("SELECT id FROM product")
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok(row.try_get("id")?))
            .collect()
    }

    /// Insert or update a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO product (id, name, price, description, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                price = EXCLUDED.price,
                description = EXCLUDED.description,
                image_url = EXCLUDED.image_url
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.description.as_ref())
        .bind(product.image_url.as_ref())
        .bind(product.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a product. Returns `true` if a row was removed.
    ///
    /// Existing carts may still reference the ID; the cart layer prunes
    /// those entries on the next load.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
