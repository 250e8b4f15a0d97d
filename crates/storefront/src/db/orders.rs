//! Order repository: immutable order records with a mutable status column.
//!
//! Line items are frozen into a JSONB document at insert time. Normal
//! lifecycle transitions are guarded by the expected prior status so a
//! concurrent writer cannot silently clobber a transition; the admin
//! override path deliberately skips that guard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use comelones_core::order::{CustomerInfo, Order, OrderLineItem, OrderStatus, PaymentMethod};
use comelones_core::{OrderId, UserId};

use super::RepositoryError;

/// Filters for the order listing query.
///
/// Mirrors the consumed document-store contract: equality on `status` and
/// `user_id`, a `created_at` range, ordering, and a limit.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<UserId>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Order by `created_at` descending when `true` (the default listing).
    pub newest_first: bool,
    pub limit: Option<i64>,
}

/// Aggregate row for the dashboard metrics command.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusMetric {
    pub status: OrderStatus,
    pub orders: i64,
    pub revenue: Decimal,
}

/// Repository for order records.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a freshly created order.
    ///
    /// Single atomic insert: a failure leaves no partial order behind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order ID already exists,
    /// `RepositoryError::Database` for other failures.
    pub async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let items = serde_json::to_value(&order.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize order items: {e}"))
        })?;

        sqlx::query(
            r"
            INSERT INTO product_order
                (id, items, total, customer_name, customer_email, customer_phone,
                 shipping_address, user_id, payment_method, status, receipt_url,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(&order.id)
        .bind(items)
        .bind(order.total)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(&order.customer.shipping_address)
        .bind(order.user_id.as_ref())
        .bind(order.payment_method.to_string())
        .bind(order.status.to_string())
        .bind(order.receipt_url.as_ref())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("order already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, items, total, customer_name, customer_email, customer_phone,
                   shipping_address, user_id, payment_method, status, receipt_url,
                   created_at, updated_at
            FROM product_order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_order).transpose()
    }

    /// Apply a guarded lifecycle transition.
    ///
    /// The update only lands when the stored status still equals `from`;
    /// a concurrent transition loses the race and surfaces as a conflict
    /// instead of silently overwriting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist and
    /// `RepositoryError::Conflict` if its status changed concurrently.
    pub async fn transition(
        &self,
        id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_order
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            ",
        )
        .bind(to.to_string())
        .bind(now)
        .bind(id)
        .bind(from.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if self.get(id).await?.is_none() {
                return Err(RepositoryError::NotFound);
            }
            return Err(RepositoryError::Conflict(format!(
                "order {id} is no longer {from}"
            )));
        }

        Ok(())
    }

    /// Force a status unconditionally (admin override path).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn force_status(
        &self,
        id: &OrderId,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_order
            SET status = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(to.to_string())
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Record the public URL of an uploaded payment receipt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_receipt_url(
        &self,
        id: &OrderId,
        receipt_url: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_order
            SET receipt_url = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(receipt_url)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete an order (explicit admin action only).
    ///
    /// Returns `true` if the order was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List orders matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r"
            SELECT id, items, total, customer_name, customer_email, customer_phone,
                   shipping_address, user_id, payment_method, status, receipt_url,
                   created_at, updated_at
            FROM product_order
            WHERE 1 = 1
            ",
        );

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.to_string());
        }
        if let Some(ref user_id) = filter.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }
        if let Some(after) = filter.created_after {
            query.push(" AND created_at >= ");
            query.push_bind(after);
        }
        if let Some(before) = filter.created_before {
            query.push(" AND created_at <= ");
            query.push_bind(before);
        }

        query.push(if filter.newest_first {
            " ORDER BY created_at DESC"
        } else {
            " ORDER BY created_at ASC"
        });

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }

        let rows = query.build().fetch_all(self.pool).await?;
        rows.into_iter().map(row_to_order).collect()
    }

    /// Order counts and revenue, grouped by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_metrics(&self) -> Result<Vec<StatusMetric>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT status, COUNT(*) AS orders, COALESCE(SUM(total), 0) AS revenue
            FROM product_order
            GROUP BY status
            ORDER BY status
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                let status = status
                    .parse::<OrderStatus>()
                    .map_err(RepositoryError::DataCorruption)?;
                Ok(StatusMetric {
                    status,
                    orders: row.try_get("orders")?,
                    revenue: row.try_get("revenue")?,
                })
            })
            .collect()
    }
}

/// Map a database row to an [`Order`].
fn row_to_order(row: PgRow) -> Result<Order, RepositoryError> {
    let items: serde_json::Value = row.try_get("items")?;
    let items: Vec<OrderLineItem> = serde_json::from_value(items)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid order items: {e}")))?;

    let payment_method: String = row.try_get("payment_method")?;
    let payment_method = payment_method
        .parse::<PaymentMethod>()
        .map_err(RepositoryError::DataCorruption)?;

    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(RepositoryError::DataCorruption)?;

    Ok(Order {
        id: row.try_get("id")?,
        items,
        total: row.try_get("total")?,
        customer: CustomerInfo {
            name: row.try_get("customer_name")?,
            email: row.try_get("customer_email")?,
            phone: row.try_get("customer_phone")?,
            shipping_address: row.try_get("shipping_address")?,
        },
        user_id: row.try_get("user_id")?,
        payment_method,
        status,
        receipt_url: row.try_get("receipt_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
