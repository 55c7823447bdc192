//! Denormalized product snapshot stored inside cart items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A copy of a catalog product taken at the moment it was added to a cart.
///
/// Snapshots are owned by the cart, so later catalog price changes do not
/// retroactively affect items already in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Stock ceiling. `None` means the ceiling is unknown and quantities are unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Image URL or asset path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductSnapshot {
    /// Create a snapshot with no stock ceiling and no image.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock: None,
            image: None,
        }
    }

    /// Set the stock ceiling.
    #[must_use]
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Whether the product can currently be purchased.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock != Some(0)
    }

    /// Clamp a requested quantity to the stock ceiling, if one is known.
    #[must_use]
    pub fn clamp_quantity(&self, quantity: u32) -> u32 {
        self.stock.map_or(quantity, |stock| quantity.min(stock))
    }
}
