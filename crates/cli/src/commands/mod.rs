//! CLI subcommand implementations.

pub mod cart;
pub mod catalog;

use thiserror::Error;

use barbaro_core::ProductId;
use barbaro_storefront::catalog::CatalogError;
use barbaro_storefront::storage::StorageError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Product is not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// Product has no stock left.
    #[error("Product is out of stock: {0}")]
    OutOfStock(ProductId),

    /// The change was applied in memory but could not be written.
    #[error("Cart {0} could not be saved")]
    NotPersisted(String),
}
