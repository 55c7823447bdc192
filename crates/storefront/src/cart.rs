//! Persisted cart store.
//!
//! [`CartStore`] wraps a [`Cart`] with write-through persistence to an
//! injected [`KeyValueStore`]. Every mutation is followed by a full rewrite of
//! the stored representation (`{"items": [...]}`), so a store reopened from the
//! same backend always reflects the last successful write.
//!
//! Persistence is best-effort. Read failures and corrupt values rehydrate as
//! an empty cart; write failures are logged and the store keeps serving the
//! in-memory state, retrying on the next mutation. Neither ever reaches the
//! caller.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use barbaro_core::{Cart, CartItem, ProductId, ProductSnapshot};

use crate::storage::KeyValueStore;

/// Storage key for the single-cart namespace; per-visitor keys append `:{token}`.
pub const CART_NAMESPACE: &str = "barbaro-cart-storage";

/// Opaque per-visitor cart identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartToken(Uuid);

impl CartToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Storage key for this token's cart.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{CART_NAMESPACE}:{}", self.0)
    }
}

impl fmt::Display for CartToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CartToken {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A cart bound to a storage key, persisted after every mutation.
pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    loading: bool,
    persisted: bool,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("cart", &self.cart)
            .field("loading", &self.loading)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart stored under `key`, rehydrating it if present.
    ///
    /// Never fails: unreadable or corrupt values are logged and the store
    /// starts empty.
    pub fn open(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (cart, persisted) = match storage.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => (cart, true),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding corrupt persisted cart");
                    (Cart::new(), true)
                }
            },
            Ok(None) => (Cart::new(), true),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read persisted cart, starting empty");
                (Cart::new(), false)
            }
        };

        tracing::debug!(key = %key, items = cart.len(), "Cart rehydrated");

        Self {
            cart,
            storage,
            key,
            loading: false,
            persisted,
        }
    }

    /// Open the single cart under [`CART_NAMESPACE`].
    pub fn open_default(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::open(storage, CART_NAMESPACE)
    }

    /// Open the cart belonging to a visitor token.
    pub fn for_token(storage: Arc<dyn KeyValueStore>, token: &CartToken) -> Self {
        Self::open(storage, token.storage_key())
    }

    /// Add `quantity` units of `product`, merging with an existing entry.
    ///
    /// Returns the product's resulting quantity (0 if nothing was stored).
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: u32) -> u32 {
        let id = product.id.clone();
        let result = self.cart.add_item(product, quantity);
        tracing::debug!(key = %self.key, product_id = %id, quantity, result, "Cart add");
        self.commit();
        result
    }

    /// Set an item's absolute quantity; zero or less removes it.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> u32 {
        let result = self.cart.update_quantity(id, quantity);
        tracing::debug!(key = %self.key, product_id = %id, quantity, result, "Cart update");
        self.commit();
        result
    }

    /// Remove an item. Removing an absent item is not an error.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let removed = self.cart.remove_item(id);
        tracing::debug!(key = %self.key, product_id = %id, removed, "Cart remove");
        self.commit();
        removed
    }

    /// Remove every item.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        tracing::debug!(key = %self.key, "Cart cleared");
        self.commit();
    }

    /// Set the UI busy flag. Not persisted; has no effect on items.
    pub const fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Whether a view marked the cart busy.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the last read or write against storage succeeded.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Storage key this cart is bound to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// Look up an item by product ID.
    #[must_use]
    pub fn item(&self, id: &ProductId) -> Option<&CartItem> {
        self.cart.item(id)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    /// Whether an item has reached its stock ceiling.
    #[must_use]
    pub fn at_stock_limit(&self, id: &ProductId) -> bool {
        self.cart.at_stock_limit(id)
    }

    /// Write the full cart through to storage.
    fn commit(&mut self) {
        let result = serde_json::to_string(&self.cart)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .set(&self.key, &raw)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => {
                if !self.persisted {
                    tracing::info!(key = %self.key, "Cart persistence recovered");
                }
                self.persisted = true;
            }
            Err(error) => {
                if self.persisted {
                    tracing::warn!(key = %self.key, %error, "Cart persistence failed, continuing in memory");
                } else {
                    tracing::debug!(key = %self.key, %error, "Cart persistence still failing");
                }
                self.persisted = false;
            }
        }
    }
}
