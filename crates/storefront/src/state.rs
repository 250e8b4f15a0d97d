//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use comelones_core::role::RoleDirectory;

use crate::config::StorefrontConfig;
use crate::services::{CartSync, Catalog, Checkout, GatewayError, NequiClient, ReceiptStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    roles: RoleDirectory,
    catalog: Catalog,
    cart_sync: CartSync,
    checkout: Checkout,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway HTTP client fails to build.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, GatewayError> {
        let roles = config.roles.directory();
        let nequi = NequiClient::new(config.nequi.clone(), config.callback_url())?;
        let receipts = ReceiptStore::new(config.receipts_dir.clone(), &config.base_url);

        let catalog = Catalog::new(pool.clone());
        let cart_sync = CartSync::new(pool.clone(), catalog.clone());
        let checkout = Checkout::new(pool.clone(), nequi, receipts);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                roles,
                catalog,
                cart_sync,
                checkout,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the role directory.
    #[must_use]
    pub fn roles(&self) -> &RoleDirectory {
        &self.inner.roles
    }

    /// Get a reference to the cached product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the cart sync service.
    #[must_use]
    pub fn cart_sync(&self) -> &CartSync {
        &self.inner.cart_sync
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }
}
