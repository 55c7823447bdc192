//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! bn-cli catalog check --catalog crates/storefront/catalog.yaml
//! ```

use std::path::Path;

use barbaro_core::Price;
use barbaro_storefront::catalog::Catalog;

use super::CommandError;

/// Load and validate a catalog file, logging a summary of its products.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read, parsed, or validated.
pub fn check(path: &Path) -> Result<Catalog, CommandError> {
    let catalog = Catalog::load(path)?;
    let currency = catalog.currency();

    tracing::info!("Catalog OK: {} products ({})", catalog.len(), currency);
    for product in catalog.products() {
        let stock = product
            .stock
            .map_or_else(|| "untracked".to_string(), |stock| stock.to_string());
        tracing::info!(
            "  {} - {} @ {} (stock: {})",
            product.id,
            product.name,
            Price::new(product.price, currency),
            stock
        );
    }

    let out_of_stock = catalog.products().iter().filter(|p| !p.in_stock()).count();
    if out_of_stock > 0 {
        tracing::warn!("{out_of_stock} product(s) are out of stock");
    }

    Ok(catalog)
}
