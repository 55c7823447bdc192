//! Cart maintenance commands.
//!
//! Operates directly on a file-backed cart directory, the same layout the
//! storefront uses when `STOREFRONT_CART_DIR` is set.
//!
//! # Usage
//!
//! ```bash
//! # Inspect the default cart
//! bn-cli cart show --store-dir ./carts
//!
//! # Edit a visitor's cart by token
//! bn-cli cart add --store-dir ./carts --cart 3f2b6c1e-... \
//!     --catalog crates/storefront/catalog.yaml --product whey-isolate-1kg -q 2
//! bn-cli cart update --store-dir ./carts --product whey-isolate-1kg -q 0
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use barbaro_core::{CurrencyCode, Price, ProductId};
use barbaro_storefront::cart::{CartStore, CartToken};
use barbaro_storefront::catalog::Catalog;
use barbaro_storefront::storage::FileStore;

use super::CommandError;

/// Which cart a command operates on.
#[derive(Debug, Clone)]
pub struct CartTarget {
    /// Directory holding persisted carts.
    pub store_dir: PathBuf,
    /// Visitor token; `None` selects the single default cart.
    pub token: Option<Uuid>,
}

impl CartTarget {
    fn open(&self) -> Result<CartStore, CommandError> {
        let storage = Arc::new(FileStore::open(&self.store_dir)?);
        Ok(match self.token {
            Some(token) => CartStore::for_token(storage, &CartToken::from(token)),
            None => CartStore::open_default(storage),
        })
    }
}

/// Fail if the last write-through did not reach disk.
fn ensure_persisted(store: &CartStore) -> Result<(), CommandError> {
    if store.is_persisted() {
        Ok(())
    } else {
        Err(CommandError::NotPersisted(store.key().to_string()))
    }
}

fn log_summary(store: &CartStore, currency: CurrencyCode) {
    tracing::info!("Cart {}", store.key());
    if store.items().is_empty() {
        tracing::info!("  (empty)");
        return;
    }

    for item in store.items() {
        let limit = if item.at_stock_limit() { " [stock limit]" } else { "" };
        tracing::info!(
            "  {} x{} @ {} = {}{}",
            item.product.id,
            item.quantity,
            Price::new(item.product.price, currency),
            Price::new(item.line_total(), currency),
            limit
        );
    }
    tracing::info!(
        "  Total: {} item(s), {}",
        store.total_items(),
        Price::new(store.total_price(), currency)
    );
}

fn currency_from(catalog: Option<&Path>) -> Result<CurrencyCode, CommandError> {
    Ok(match catalog {
        Some(path) => Catalog::load(path)?.currency(),
        None => CurrencyCode::default(),
    })
}

/// Show a cart's contents and totals.
///
/// # Errors
///
/// Returns an error if the cart directory or catalog cannot be opened.
pub fn show(target: &CartTarget, catalog: Option<&Path>) -> Result<CartStore, CommandError> {
    let currency = currency_from(catalog)?;
    let store = target.open()?;
    log_summary(&store, currency);
    Ok(store)
}

/// Add a catalog product to a cart.
///
/// # Errors
///
/// Returns an error if the product is unknown or out of stock, or the cart
/// cannot be saved.
pub fn add(
    target: &CartTarget,
    catalog: &Path,
    product_id: &ProductId,
    quantity: u32,
) -> Result<CartStore, CommandError> {
    let catalog = Catalog::load(catalog)?;
    let product = catalog
        .get(product_id)
        .cloned()
        .ok_or_else(|| CommandError::UnknownProduct(product_id.clone()))?;

    if !product.in_stock() {
        return Err(CommandError::OutOfStock(product.id));
    }

    let mut store = target.open()?;
    let result = store.add_item(product, quantity);
    ensure_persisted(&store)?;

    tracing::info!("{product_id} now at quantity {result}");
    log_summary(&store, catalog.currency());
    Ok(store)
}

/// Set a line's quantity; zero or negative removes it.
///
/// # Errors
///
/// Returns an error if the cart cannot be opened or saved.
pub fn update(
    target: &CartTarget,
    product_id: &ProductId,
    quantity: i64,
) -> Result<CartStore, CommandError> {
    let mut store = target.open()?;
    if store.item(product_id).is_none() {
        tracing::warn!("{product_id} is not in the cart, nothing to update");
    }

    store.update_quantity(product_id, quantity);
    ensure_persisted(&store)?;
    log_summary(&store, CurrencyCode::default());
    Ok(store)
}

/// Remove a line from a cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be opened or saved.
pub fn remove(target: &CartTarget, product_id: &ProductId) -> Result<CartStore, CommandError> {
    let mut store = target.open()?;
    if !store.remove_item(product_id) {
        tracing::warn!("{product_id} is not in the cart");
    }

    ensure_persisted(&store)?;
    log_summary(&store, CurrencyCode::default());
    Ok(store)
}

/// Empty a cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be opened or saved.
pub fn clear(target: &CartTarget) -> Result<CartStore, CommandError> {
    let mut store = target.open()?;
    store.clear_cart();
    ensure_persisted(&store)?;
    tracing::info!("Cart {} cleared", store.key());
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    const CATALOG: &str = "\
currency: USD
products:
  - { id: whey, name: Whey, price: \"49.90\", stock: 3 }
  - { id: bar, name: Protein Bar, price: \"2.50\" }
  - { id: shaker, name: Shaker, price: \"9.99\", stock: 0 }
";

    fn setup() -> (tempfile::TempDir, CartTarget, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.yaml");
        fs::write(&catalog, CATALOG).unwrap();
        let target = CartTarget {
            store_dir: dir.path().join("carts"),
            token: None,
        };
        (dir, target, catalog)
    }

    #[test]
    fn test_add_persists_across_invocations() {
        let (_dir, target, catalog) = setup();

        add(&target, &catalog, &ProductId::new("bar"), 2).unwrap();
        add(&target, &catalog, &ProductId::new("bar"), 3).unwrap();

        let store = show(&target, Some(&catalog)).unwrap();
        assert_eq!(store.total_items(), 5);
        assert_eq!(store.total_price().to_string(), "12.50");
    }

    #[test]
    fn test_add_clamps_to_stock() {
        let (_dir, target, catalog) = setup();

        let store = add(&target, &catalog, &ProductId::new("whey"), 10).unwrap();
        assert_eq!(store.item(&ProductId::new("whey")).unwrap().quantity, 3);
    }

    #[test]
    fn test_add_unknown_product() {
        let (_dir, target, catalog) = setup();

        let result = add(&target, &catalog, &ProductId::new("nope"), 1);
        assert!(matches!(result, Err(CommandError::UnknownProduct(_))));
    }

    #[test]
    fn test_add_out_of_stock() {
        let (_dir, target, catalog) = setup();

        let result = add(&target, &catalog, &ProductId::new("shaker"), 1);
        assert!(matches!(result, Err(CommandError::OutOfStock(_))));
    }

    #[test]
    fn test_update_and_remove() {
        let (_dir, target, catalog) = setup();
        add(&target, &catalog, &ProductId::new("bar"), 2).unwrap();
        add(&target, &catalog, &ProductId::new("whey"), 1).unwrap();

        let store = update(&target, &ProductId::new("bar"), 7).unwrap();
        assert_eq!(store.total_items(), 8);

        let store = update(&target, &ProductId::new("bar"), -1).unwrap();
        assert!(store.item(&ProductId::new("bar")).is_none());

        let store = remove(&target, &ProductId::new("whey")).unwrap();
        assert!(store.items().is_empty());

        // Removing again is a no-op
        remove(&target, &ProductId::new("whey")).unwrap();
    }

    #[test]
    fn test_tokens_are_isolated() {
        let (_dir, target, catalog) = setup();
        let visitor = CartTarget {
            token: Some(Uuid::new_v4()),
            ..target.clone()
        };

        add(&visitor, &catalog, &ProductId::new("bar"), 1).unwrap();

        assert!(show(&target, None).unwrap().items().is_empty());
        assert_eq!(show(&visitor, None).unwrap().total_items(), 1);
    }

    #[test]
    fn test_clear() {
        let (_dir, target, catalog) = setup();
        add(&target, &catalog, &ProductId::new("bar"), 4).unwrap();

        clear(&target).unwrap();
        assert!(show(&target, None).unwrap().items().is_empty());
    }
}
