//! Cart repository: one persisted cart document per user.
//!
//! Items are stored as a JSONB document; the derived `total` and
//! `item_count` columns are denormalized alongside so the merge
//! heuristic can compare snapshots without deserializing the items.
//! Writes are wholesale upserts of the current snapshot; the last
//! write wins.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use comelones_core::UserId;
use comelones_core::cart::{Cart, CartItem};

use super::RepositoryError;

/// Repository for persisted cart documents.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the persisted cart for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored item document does
    /// not deserialize.
    pub async fn get(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT items, total, item_count, updated_at
            FROM cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: serde_json::Value = row.try_get("items")?;
        let items: Vec<CartItem> = serde_json::from_value(items).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart items for {user_id}: {e}"))
        })?;

        let item_count: i32 = row.try_get("item_count")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Some(Cart {
            owner_id: Some(user_id.clone()),
            items,
            total: row.try_get("total")?,
            item_count: u32::try_from(item_count).unwrap_or(0),
            updated_at: Some(updated_at),
        }))
    }

    /// Persist a cart snapshot for a user, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert(&self, user_id: &UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let items = serde_json::to_value(&cart.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize cart items: {e}"))
        })?;

        sqlx::query(
            r"
            INSERT INTO cart (user_id, items, total, item_count, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET items = EXCLUDED.items,
                total = EXCLUDED.total,
                item_count = EXCLUDED.item_count,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(user_id)
        .bind(items)
        .bind(cart.total)
        .bind(i32::try_from(cart.item_count).unwrap_or(i32::MAX))
        .bind(cart.updated_at.unwrap_or_else(Utc::now))
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
