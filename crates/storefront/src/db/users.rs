//! User repository.
//!
//! The identity provider owns authentication; this table only records
//! which users have logged in and what role the storefront assigned
//! them. The role column is reasserted on every login so a change to
//! the configured role directory heals stale records automatically.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use comelones_core::role::UserRole;
use comelones_core::{Email, UserId};

use super::RepositoryError;

/// Repository for storefront users.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user on first login, or refresh email and role on
    /// subsequent logins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_on_login(
        &self,
        id: &UserId,
        email: &Email,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront_user (id, email, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                role = EXCLUDED.role,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(id)
        .bind(email)
        .bind(role.to_string())
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
