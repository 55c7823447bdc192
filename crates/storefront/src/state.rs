//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog and cart storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    carts: Arc<dyn KeyValueStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `catalog` - Product catalog
    /// * `carts` - Backend holding persisted carts
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Catalog, carts: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts,
            }),
        }
    }

    /// Build state from configuration: load the catalog and open cart storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the cart directory
    /// cannot be created.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let catalog = Catalog::load(&config.catalog_path)?;

        let carts: Arc<dyn KeyValueStore> = match &config.cart_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "Persisting carts to disk");
                Arc::new(FileStore::open(dir)?)
            }
            None => {
                tracing::warn!("STOREFRONT_CART_DIR not set, carts are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config, catalog, carts))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a handle to the cart storage backend.
    #[must_use]
    pub fn carts(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.inner.carts)
    }
}
