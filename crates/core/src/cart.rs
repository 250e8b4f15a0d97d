//! Cart state, the mutation reducer, and the merge heuristic.
//!
//! The cart is a plain state-machine object: every mutation goes through
//! [`Cart::dispatch`], a pure function of `(state, action) -> state` with
//! no side effects. Persistence (session storage for guests, the document
//! store for authenticated users) is layered on top by the storefront
//! crate.
//!
//! # Invariants
//!
//! After every dispatch:
//! - `total == Σ(item.price × item.quantity)`
//! - `item_count == Σ(item.quantity)`
//! - every item has `1 <= quantity <= CartItem::MAX_QUANTITY`
//!
//! The derived fields are recomputed on every mutation, never patched
//! incrementally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, UserId};

/// A single line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product this line refers to. Unique within a cart.
    pub id: ProductId,
    /// Product name, denormalized at add time.
    pub name: String,
    /// Unit price in COP.
    pub price: Decimal,
    /// Units of this product. Always >= 1; a non-positive quantity update
    /// removes the line instead, and anything above
    /// [`CartItem::MAX_QUANTITY`] is clamped.
    pub quantity: u32,
}

impl CartItem {
    /// Largest quantity a single line may hold. Keeps the derived
    /// `item_count` far away from integer overflow.
    pub const MAX_QUANTITY: u32 = 9_999;

    /// Price of this line (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A cart snapshot: items plus derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Owning user, or `None` for a guest cart held only in the session.
    pub owner_id: Option<UserId>,
    /// Cart lines, keyed by product ID.
    pub items: Vec<CartItem>,
    /// Derived: sum of line totals.
    pub total: Decimal,
    /// Derived: sum of line quantities.
    pub item_count: u32,
    /// When the cart was last mutated. `None` until the first mutation,
    /// which matters for the merge heuristic below.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A product reference carried by [`CartAction::AddItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

/// Actions accepted by the cart reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    /// Add one unit of a product. Repeated adds accumulate on one line.
    AddItem { product: ProductRef },
    /// Remove a line. Silent no-op when the product is not in the cart.
    RemoveItem { id: ProductId },
    /// Set a line's quantity absolutely. A quantity <= 0 removes the
    /// line; anything above [`CartItem::MAX_QUANTITY`] is clamped.
    UpdateQuantity { id: ProductId, quantity: i64 },
    /// Reset to an empty cart.
    Clear,
    /// Drop lines whose backing product no longer exists in the catalog.
    RemoveDeletedProducts { ids: Vec<ProductId> },
}

/// Which side of a divergent local/remote cart pair should win a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeWinner {
    /// The local (session/guest) cart overwrites the remote one.
    Local,
    /// The remote (persisted) cart replaces local state.
    Remote,
}

impl Cart {
    /// Create an empty cart for the given owner.
    #[must_use]
    pub fn empty(owner_id: Option<UserId>) -> Self {
        Self {
            owner_id,
            ..Self::default()
        }
    }

    /// `true` when the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply an action, returning the next cart state.
    ///
    /// Pure: the caller supplies `now`, which becomes the cart's
    /// `updated_at`. Derived totals are always recomputed from the items.
    #[must_use]
    pub fn dispatch(mut self, action: CartAction, now: DateTime<Utc>) -> Self {
        match action {
            CartAction::AddItem { product } => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == product.id) {
                    item.quantity = item.quantity.saturating_add(1).min(CartItem::MAX_QUANTITY);
                } else {
                    self.items.push(CartItem {
                        id: product.id,
                        name: product.name,
                        price: product.price,
                        quantity: 1,
                    });
                }
            }
            CartAction::RemoveItem { id } => {
                self.items.retain(|i| i.id != id);
            }
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    self.items.retain(|i| i.id != id);
                } else if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
                    item.quantity = u32::try_from(quantity)
                        .map_or(CartItem::MAX_QUANTITY, |q| q.min(CartItem::MAX_QUANTITY));
                }
            }
            CartAction::Clear => {
                self.items.clear();
            }
            CartAction::RemoveDeletedProducts { ids } => {
                self.items.retain(|i| !ids.contains(&i.id));
            }
        }

        self.recompute();
        self.updated_at = Some(now);
        self
    }

    /// Product IDs in this cart that are absent from the live catalog.
    ///
    /// Feed the result into [`CartAction::RemoveDeletedProducts`] to
    /// reconcile the cart after a catalog change.
    #[must_use]
    pub fn ids_missing_from<'a, I>(&self, live: I) -> Vec<ProductId>
    where
        I: IntoIterator<Item = &'a ProductId>,
    {
        let live: Vec<&ProductId> = live.into_iter().collect();
        self.items
            .iter()
            .filter(|i| !live.contains(&&i.id))
            .map(|i| i.id.clone())
            .collect()
    }

    fn recompute(&mut self) {
        self.total = self.items.iter().map(CartItem::line_total).sum();
        self.item_count = self
            .items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity));
    }
}

/// Decide which of two divergent cart snapshots wins a merge.
///
/// This is a wholesale, heuristic choice, not an item-level
/// reconciliation: the loser is discarded entirely. The local cart wins
/// when it has a strictly greater `item_count`, or failing that when its
/// `updated_at` is strictly newer. The `item_count` comparison is
/// evaluated first, so a guest cart with items beats an empty remote cart
/// even when the remote timestamp is newer. In every other case the
/// remote cart is adopted.
#[must_use]
pub fn merge_preference(local: &Cart, remote: &Cart) -> MergeWinner {
    if local.item_count > remote.item_count {
        return MergeWinner::Local;
    }

    match (local.updated_at, remote.updated_at) {
        (Some(l), Some(r)) if l > r => MergeWinner::Local,
        (Some(_), None) => MergeWinner::Local,
        _ => MergeWinner::Remote,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn product(id: &str, price: Decimal) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            price,
        }
    }

    fn assert_invariants(cart: &Cart) {
        let total: Decimal = cart.items.iter().map(CartItem::line_total).sum();
        let count: u32 = cart.items.iter().map(|i| i.quantity).sum();
        assert_eq!(cart.total, total);
        assert_eq!(cart.item_count, count);
        assert!(cart.items.iter().all(|i| i.quantity >= 1));
    }

    #[test]
    fn test_add_item_inserts_with_quantity_one() {
        let cart = Cart::default().dispatch(
            CartAction::AddItem {
                product: product("p1", dec!(10000)),
            },
            at(1),
        );

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count, 1);
        assert_eq!(cart.total, dec!(10000));
        assert_eq!(cart.updated_at, Some(at(1)));
        assert_invariants(&cart);
    }

    #[test]
    fn test_add_same_product_twice_accumulates() {
        let p = product("p1", dec!(10000));
        let cart = Cart::default()
            .dispatch(CartAction::AddItem { product: p.clone() }, at(1))
            .dispatch(CartAction::AddItem { product: p }, at(2));

        // One line with quantity 2, not two lines.
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items.first().unwrap().quantity, 2);
        assert_eq!(cart.total, dec!(20000));
        assert_invariants(&cart);
    }

    #[test]
    fn test_remove_item_recomputes_totals() {
        let cart = Cart::default()
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(1),
            )
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(2),
            )
            .dispatch(
                CartAction::AddItem {
                    product: product("p2", dec!(5000)),
                },
                at(3),
            );

        assert_eq!(cart.total, dec!(25000));
        assert_eq!(cart.item_count, 3);

        let cart = cart.dispatch(
            CartAction::RemoveItem {
                id: ProductId::new("p1"),
            },
            at(4),
        );

        assert_eq!(cart.total, dec!(5000));
        assert_eq!(cart.item_count, 1);
        assert_invariants(&cart);
    }

    #[test]
    fn test_remove_absent_item_is_a_noop() {
        let cart = Cart::default().dispatch(
            CartAction::AddItem {
                product: product("p1", dec!(10000)),
            },
            at(1),
        );
        let cart = cart.dispatch(
            CartAction::RemoveItem {
                id: ProductId::new("ghost"),
            },
            at(2),
        );

        assert_eq!(cart.items.len(), 1);
        assert_invariants(&cart);
    }

    #[test]
    fn test_update_quantity_is_absolute() {
        let cart = Cart::default()
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(1),
            )
            .dispatch(
                CartAction::UpdateQuantity {
                    id: ProductId::new("p1"),
                    quantity: 5,
                },
                at(2),
            );

        assert_eq!(cart.items.first().unwrap().quantity, 5);
        assert_eq!(cart.total, dec!(50000));
        assert_invariants(&cart);
    }

    #[test]
    fn test_update_quantity_zero_and_negative_remove() {
        for quantity in [0, -1] {
            let cart = Cart::default()
                .dispatch(
                    CartAction::AddItem {
                        product: product("p1", dec!(10000)),
                    },
                    at(1),
                )
                .dispatch(
                    CartAction::UpdateQuantity {
                        id: ProductId::new("p1"),
                        quantity,
                    },
                    at(2),
                );

            let removed = Cart::default()
                .dispatch(
                    CartAction::AddItem {
                        product: product("p1", dec!(10000)),
                    },
                    at(1),
                )
                .dispatch(
                    CartAction::RemoveItem {
                        id: ProductId::new("p1"),
                    },
                    at(2),
                );

            assert_eq!(cart, removed);
            assert!(cart.is_empty());
            assert_invariants(&cart);
        }
    }

    #[test]
    fn test_huge_quantities_clamp_instead_of_overflowing() {
        let mut cart = Cart::default()
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(1),
            )
            .dispatch(
                CartAction::AddItem {
                    product: product("p2", dec!(5000)),
                },
                at(2),
            );

        // Two lines forced to the u32 ceiling must not overflow the
        // derived item_count sum.
        for id in ["p1", "p2"] {
            cart = cart.dispatch(
                CartAction::UpdateQuantity {
                    id: ProductId::new(id),
                    quantity: i64::from(u32::MAX),
                },
                at(3),
            );
        }

        for item in &cart.items {
            assert_eq!(item.quantity, CartItem::MAX_QUANTITY);
        }
        assert_eq!(cart.item_count, 2 * CartItem::MAX_QUANTITY);
        assert_invariants(&cart);
    }

    #[test]
    fn test_add_item_clamps_at_max_quantity() {
        let cart = Cart::default()
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(1),
            )
            .dispatch(
                CartAction::UpdateQuantity {
                    id: ProductId::new("p1"),
                    quantity: i64::from(CartItem::MAX_QUANTITY),
                },
                at(2),
            )
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(3),
            );

        assert_eq!(cart.items.first().unwrap().quantity, CartItem::MAX_QUANTITY);
        assert_invariants(&cart);
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let cart = Cart::default()
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(1),
            )
            .dispatch(CartAction::Clear, at(2));

        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
        assert_invariants(&cart);
    }

    #[test]
    fn test_remove_deleted_products() {
        let cart = Cart::default()
            .dispatch(
                CartAction::AddItem {
                    product: product("p1", dec!(10000)),
                },
                at(1),
            )
            .dispatch(
                CartAction::AddItem {
                    product: product("p2", dec!(5000)),
                },
                at(2),
            );

        let live = [ProductId::new("p2")];
        let missing = cart.ids_missing_from(&live);
        assert_eq!(missing, vec![ProductId::new("p1")]);

        let cart = cart.dispatch(CartAction::RemoveDeletedProducts { ids: missing }, at(3));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items.first().unwrap().id, ProductId::new("p2"));
        assert_invariants(&cart);
    }

    #[test]
    fn test_invariants_hold_over_action_sequence() {
        let actions = vec![
            CartAction::AddItem {
                product: product("p1", dec!(12500)),
            },
            CartAction::AddItem {
                product: product("p2", dec!(8000)),
            },
            CartAction::AddItem {
                product: product("p1", dec!(12500)),
            },
            CartAction::UpdateQuantity {
                id: ProductId::new("p2"),
                quantity: 4,
            },
            CartAction::RemoveItem {
                id: ProductId::new("p1"),
            },
            CartAction::UpdateQuantity {
                id: ProductId::new("p2"),
                quantity: 0,
            },
        ];

        let mut cart = Cart::default();
        for (i, action) in actions.into_iter().enumerate() {
            cart = cart.dispatch(action, at(i64::try_from(i).unwrap()));
            assert_invariants(&cart);
        }
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_local_wins_on_greater_item_count() {
        let local = Cart {
            item_count: 3,
            updated_at: Some(at(100)),
            ..Cart::default()
        };
        let remote = Cart {
            item_count: 1,
            updated_at: Some(at(50)),
            ..Cart::default()
        };

        assert_eq!(merge_preference(&local, &remote), MergeWinner::Local);
    }

    #[test]
    fn test_merge_remote_wins_on_count_and_recency() {
        let local = Cart {
            item_count: 1,
            updated_at: Some(at(50)),
            ..Cart::default()
        };
        let remote = Cart {
            item_count: 5,
            updated_at: Some(at(100)),
            ..Cart::default()
        };

        assert_eq!(merge_preference(&local, &remote), MergeWinner::Remote);
    }

    #[test]
    fn test_merge_item_count_precedes_timestamp() {
        // Guest cart with items but no timestamp beats a newer empty
        // remote cart: the count comparison runs first.
        let local = Cart {
            item_count: 2,
            updated_at: None,
            ..Cart::default()
        };
        let remote = Cart {
            item_count: 0,
            updated_at: Some(Utc::now()),
            ..Cart::default()
        };

        assert_eq!(merge_preference(&local, &remote), MergeWinner::Local);
    }

    #[test]
    fn test_merge_local_wins_on_newer_timestamp_alone() {
        let local = Cart {
            item_count: 1,
            updated_at: Some(at(200)),
            ..Cart::default()
        };
        let remote = Cart {
            item_count: 1,
            updated_at: Some(at(100)),
            ..Cart::default()
        };

        assert_eq!(merge_preference(&local, &remote), MergeWinner::Local);
    }

    #[test]
    fn test_merge_ties_go_to_remote() {
        let local = Cart {
            item_count: 2,
            updated_at: Some(at(100)),
            ..Cart::default()
        };
        let remote = local.clone();

        assert_eq!(merge_preference(&local, &remote), MergeWinner::Remote);
    }

    #[test]
    fn test_merge_untouched_local_adopts_remote() {
        let local = Cart::default();
        let remote = Cart {
            item_count: 2,
            updated_at: Some(at(100)),
            ..Cart::default()
        };

        assert_eq!(merge_preference(&local, &remote), MergeWinner::Remote);
    }
}
