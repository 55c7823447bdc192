//! Product catalog loaded from a YAML file.
//!
//! The catalog is the source products are snapshotted from when they are
//! added to a cart.
//!
//! # Format
//!
//! ```yaml
//! currency: USD
//! products:
//!   - id: whey-isolate-1kg
//!     name: Whey Isolate 1kg
//!     price: "49.90"
//!     stock: 12
//!     image: /static/img/whey-isolate.webp
//! ```

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use barbaro_core::{CurrencyCode, ProductId, ProductSnapshot};

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(ProductId),
    #[error("Product {0} has a negative price")]
    NegativePrice(ProductId),
    #[error("Product {0} has an empty name")]
    EmptyName(ProductId),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    currency: CurrencyCode,
    #[serde(default)]
    products: Vec<ProductSnapshot>,
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    currency: CurrencyCode,
    products: Vec<ProductSnapshot>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from products, validating them.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate IDs, negative prices, or empty names.
    pub fn new(
        currency: CurrencyCode,
        products: Vec<ProductSnapshot>,
    ) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if product.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(product.id.clone()));
            }
            if product.price < Decimal::ZERO {
                return Err(CatalogError::NegativePrice(product.id.clone()));
            }
            if index.insert(product.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
        }

        Ok(Self {
            currency,
            products,
            index,
        })
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.currency, file.products)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.len(),
            currency = %catalog.currency,
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&ProductSnapshot> {
        self.index
            .get(id)
            .and_then(|&position| self.products.get(position))
    }

    /// All products in file order.
    #[must_use]
    pub fn products(&self) -> &[ProductSnapshot] {
        &self.products
    }

    /// Store currency.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
currency: EUR
products:
  - id: whey-1kg
    name: Whey Protein 1kg
    price: "39.90"
    stock: 4
    image: /static/img/whey.webp
  - id: creatine-300g
    name: Creatine Monohydrate 300g
    price: "19.50"
"#;

    #[test]
    fn test_parse_sample_catalog() {
        let catalog = Catalog::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(catalog.currency(), CurrencyCode::EUR);
        assert_eq!(catalog.len(), 2);

        let whey = catalog.get(&ProductId::new("whey-1kg")).unwrap();
        assert_eq!(whey.price, Decimal::new(3990, 2));
        assert_eq!(whey.stock, Some(4));

        let creatine = catalog.get(&ProductId::new("creatine-300g")).unwrap();
        assert_eq!(creatine.stock, None);
        assert_eq!(creatine.image, None);
    }

    #[test]
    fn test_products_keep_file_order() {
        let catalog = Catalog::from_yaml_str(SAMPLE).unwrap();
        let ids: Vec<&str> = catalog.products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["whey-1kg", "creatine-300g"]);
    }

    #[test]
    fn test_currency_defaults_to_usd() {
        let catalog = Catalog::from_yaml_str("products: []").unwrap();
        assert_eq!(catalog.currency(), CurrencyCode::USD);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
products:
  - { id: a, name: A, price: "1" }
  - { id: a, name: A again, price: "2" }
"#;
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::DuplicateProduct(id)) if id.as_str() == "a"
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let yaml = r#"
products:
  - { id: a, name: A, price: "-1" }
"#;
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::NegativePrice(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let yaml = r#"
products:
  - { id: a, name: "  ", price: "1" }
"#;
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::EmptyName(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        assert!(matches!(
            Catalog::from_yaml_str("products: [ {"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            Catalog::load("/nonexistent/catalog.yaml"),
            Err(CatalogError::Io { .. })
        ));
    }
}
