//! Cart synchronization between the session and `PostgreSQL`.
//!
//! The session cart is always authoritative for reads: every handler
//! works against it and the response reflects it immediately. For
//! authenticated users each mutation is also written through to the
//! persisted cart, best effort. A write-through failure never rolls
//! back the session mutation; it is reported in the response as
//! `sync_error` and the client may retry via the explicit resync
//! endpoint.
//!
//! On login the session cart and the persisted cart are reconciled
//! with a wholesale merge heuristic (`comelones_core::cart`), so items
//! a guest collected before signing in survive the transition.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::warn;

use comelones_core::cart::{Cart, CartAction, MergeWinner, merge_preference};
use comelones_core::{ProductId, UserId};

use crate::db::CartRepository;
use crate::error::Result;
use crate::models::{CurrentUser, session_keys};

use super::catalog::Catalog;

/// A cart plus the outcome of its last persistence attempt.
///
/// `sync_error` is `None` when the cart is fully synced (or the user is
/// a guest, whose cart has no persisted copy).
#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub sync_error: Option<String>,
}

/// Session/database cart synchronization.
#[derive(Clone)]
pub struct CartSync {
    pool: PgPool,
    catalog: Catalog,
}

impl CartSync {
    /// Create a new cart sync service.
    #[must_use]
    pub const fn new(pool: PgPool, catalog: Catalog) -> Self {
        Self { pool, catalog }
    }

    /// Load the session cart, pruning lines whose product has been
    /// deleted from the catalog. A pruned cart is written through to
    /// the persisted copy when a user is logged in, so the dead lines
    /// do not resurface at the next login merge.
    ///
    /// Reconciliation is best effort: when the catalog cannot be
    /// loaded the cart is returned as-is rather than failing the read.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn load(&self, session: &Session, user: Option<&CurrentUser>) -> Result<CartView> {
        let cart = self.session_cart(session).await?;

        match self.catalog.live_ids().await {
            Ok(live) => match prune_deleted(cart, &live) {
                Pruned::Unchanged(cart) => Ok(CartView {
                    cart,
                    sync_error: None,
                }),
                Pruned::Changed(cart) => {
                    session.insert(session_keys::CART, &cart).await?;
                    let sync_error = match user {
                        Some(user) => self.write_through(&user.id, &cart).await,
                        None => None,
                    };
                    Ok(CartView { cart, sync_error })
                }
            },
            Err(e) => {
                warn!(error = %e, "catalog unavailable, skipping cart reconciliation");
                Ok(CartView {
                    cart,
                    sync_error: None,
                })
            }
        }
    }

    /// Apply a cart action to the session cart, writing through to the
    /// persisted cart when a user is logged in.
    ///
    /// The session mutation always succeeds or the whole call fails;
    /// the database write-through is best effort and reported via
    /// `sync_error`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn apply(
        &self,
        session: &Session,
        user: Option<&CurrentUser>,
        action: CartAction,
    ) -> Result<CartView> {
        let mut cart = self.session_cart(session).await?;
        cart.owner_id = user.map(|u| u.id.clone());

        let cart = cart.dispatch(action, Utc::now());
        session.insert(session_keys::CART, &cart).await?;

        let sync_error = match user {
            Some(user) => self.write_through(&user.id, &cart).await,
            None => None,
        };

        Ok(CartView { cart, sync_error })
    }

    /// Push the session cart to the database unconditionally.
    ///
    /// This is the manual recovery path after a failed write-through,
    /// so unlike [`Self::apply`] a persistence failure here is an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the upsert fails.
    pub async fn resync(&self, session: &Session, user: &CurrentUser) -> Result<CartView> {
        let mut cart = self.session_cart(session).await?;
        cart.owner_id = Some(user.id.clone());

        CartRepository::new(&self.pool).upsert(&user.id, &cart).await?;
        session.insert(session_keys::CART, &cart).await?;

        Ok(CartView {
            cart,
            sync_error: None,
        })
    }

    /// Reconcile the guest session cart with the user's persisted cart
    /// at login, adopting whichever side the merge heuristic prefers.
    ///
    /// Failures reading or writing the persisted cart degrade to the
    /// session cart so a database outage never blocks login.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn sync_on_login(&self, session: &Session, user: &CurrentUser) -> Result<CartView> {
        let mut local = self.session_cart(session).await?;
        local.owner_id = Some(user.id.clone());

        let repo = CartRepository::new(&self.pool);
        let remote = match repo.get(&user.id).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, user_id = %user.id, "failed to load persisted cart at login");
                session.insert(session_keys::CART, &local).await?;
                return Ok(CartView {
                    cart: local,
                    sync_error: Some(e.to_string()),
                });
            }
        };

        let winner = match remote {
            Some(ref remote) => match merge_preference(&local, remote) {
                MergeWinner::Local => local,
                MergeWinner::Remote => {
                    let mut cart = remote.clone();
                    cart.owner_id = Some(user.id.clone());
                    cart
                }
            },
            None => local,
        };

        session.insert(session_keys::CART, &winner).await?;
        let sync_error = self.write_through(&user.id, &winner).await;

        Ok(CartView {
            cart: winner,
            sync_error,
        })
    }

    /// Reset the session cart at logout.
    ///
    /// The persisted cart is left untouched; it will be merged back the
    /// next time the user logs in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn reset(&self, session: &Session) -> Result<()> {
        session
            .insert(session_keys::CART, &Cart::empty(None))
            .await?;
        Ok(())
    }

    /// Best-effort upsert. Returns the error message on failure instead
    /// of failing the request.
    async fn write_through(&self, user_id: &UserId, cart: &Cart) -> Option<String> {
        match CartRepository::new(&self.pool).upsert(user_id, cart).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "cart write-through failed");
                Some(e.to_string())
            }
        }
    }

    async fn session_cart(&self, session: &Session) -> Result<Cart> {
        Ok(session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_else(|| Cart::empty(None)))
    }
}

/// Outcome of reconciling a cart against the live catalog.
enum Pruned {
    Unchanged(Cart),
    Changed(Cart),
}

/// Drop cart lines whose product no longer exists in the catalog.
fn prune_deleted(cart: Cart, live: &HashSet<ProductId>) -> Pruned {
    let missing = cart.ids_missing_from(live.iter());
    if missing.is_empty() {
        Pruned::Unchanged(cart)
    } else {
        Pruned::Changed(cart.dispatch(CartAction::RemoveDeletedProducts { ids: missing }, Utc::now()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use comelones_core::cart::ProductRef;
    use rust_decimal_macros::dec;

    fn cart_with(ids: &[&str]) -> Cart {
        ids.iter().fold(Cart::empty(None), |cart, id| {
            cart.dispatch(
                CartAction::AddItem {
                    product: ProductRef {
                        id: ProductId::new(*id),
                        name: (*id).to_string(),
                        price: dec!(10000),
                    },
                },
                Utc::now(),
            )
        })
    }

    #[test]
    fn test_prune_drops_deleted_lines() {
        let live: HashSet<ProductId> = [ProductId::new("batido")].into_iter().collect();

        match prune_deleted(cart_with(&["batido", "retirado"]), &live) {
            Pruned::Changed(cart) => {
                assert_eq!(cart.items.len(), 1);
                assert_eq!(cart.items.first().unwrap().id, ProductId::new("batido"));
            }
            Pruned::Unchanged(_) => panic!("deleted line should be pruned"),
        }
    }

    #[test]
    fn test_prune_leaves_live_cart_alone() {
        let live: HashSet<ProductId> = [ProductId::new("batido"), ProductId::new("bowl")]
            .into_iter()
            .collect();

        match prune_deleted(cart_with(&["batido", "bowl"]), &live) {
            Pruned::Unchanged(cart) => assert_eq!(cart.items.len(), 2),
            Pruned::Changed(_) => panic!("live lines should be kept"),
        }
    }
}
