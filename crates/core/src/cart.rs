//! Shopping cart model.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s, unique by product ID, with
//! every quantity at least 1. All operations are infallible in-memory edits;
//! persistence lives in the storefront crate's `CartStore`.
//!
//! # Stock ceilings
//!
//! When a product snapshot carries a stock ceiling, quantities are clamped to
//! it. Snapshots without a ceiling are unbounded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ProductSnapshot};

/// One product/quantity pair within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product snapshot taken when the item was first added.
    pub product: ProductSnapshot,
    /// Quantity, always at least 1 while the item is in a cart.
    pub quantity: u32,
}

impl CartItem {
    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }

    /// Whether the quantity has reached the product's stock ceiling.
    #[must_use]
    pub fn at_stock_limit(&self) -> bool {
        self.product
            .stock
            .is_some_and(|stock| self.quantity >= stock)
    }
}

/// The ordered collection of items representing current purchase intent.
///
/// Serializes as `{ "items": [...] }`. Deserialization re-establishes the
/// invariants: zero quantities are dropped, duplicate product IDs are merged
/// into the first occurrence, and quantities are clamped to stock ceilings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartRepr")]
pub struct Cart {
    items: Vec<CartItem>,
}

/// Wire shape used when deserializing a cart.
#[derive(Deserialize)]
struct CartRepr {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl From<CartRepr> for Cart {
    fn from(repr: CartRepr) -> Self {
        Self::from_items(repr.items)
    }
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from arbitrary items, normalizing them.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add_item(item.product, item.quantity);
        }
        cart
    }

    /// Add `quantity` units of `product`.
    ///
    /// Merges into an existing entry by summing quantities (the existing
    /// snapshot is kept), otherwise appends a new entry. Returns the resulting
    /// quantity for the product, which is 0 when nothing is stored (zero
    /// quantity requested for a new product, or product out of stock).
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: u32) -> u32 {
        if let Some(item) = self.item_mut(&product.id) {
            let merged = item.quantity.saturating_add(quantity);
            item.quantity = item.product.clamp_quantity(merged);
            let quantity = item.quantity;
            if quantity == 0 {
                self.remove_item(&product.id);
            }
            return quantity;
        }

        let quantity = product.clamp_quantity(quantity);
        if quantity == 0 {
            return 0;
        }

        self.items.push(CartItem { product, quantity });
        quantity
    }

    /// Set the absolute quantity of an item.
    ///
    /// A quantity of zero or less removes the item. Unknown IDs are ignored.
    /// Returns the resulting quantity (0 when the item is absent afterward).
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> u32 {
        if quantity <= 0 {
            self.remove_item(id);
            return 0;
        }

        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        let Some(item) = self.item_mut(id) else {
            return 0;
        };

        item.quantity = item.product.clamp_quantity(requested);
        let quantity = item.quantity;
        if quantity == 0 {
            self.remove_item(id);
        }
        quantity
    }

    /// Remove an item. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product.id != id);
        self.items.len() != before
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up an item by product ID.
    #[must_use]
    pub fn item(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product.id == id)
    }

    fn item_mut(&mut self, id: &ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| &item.product.id == id)
    }

    /// Quantity of a product, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.item(id).map_or(0, |item| item.quantity)
    }

    /// Whether the item exists and has reached its stock ceiling.
    #[must_use]
    pub fn at_stock_limit(&self, id: &ProductId) -> bool {
        self.item(id).is_some_and(CartItem::at_stock_limit)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of unit price times quantity over all items.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(id: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot::new(id, format!("Product {id}"), Decimal::from(price))
    }

    fn ids(cart: &Cart) -> Vec<&str> {
        cart.items().iter().map(|i| i.product.id.as_str()).collect()
    }

    #[test]
    fn test_add_update_remove_scenario() {
        let mut cart = Cart::new();
        let a = product("A", 100);

        cart.add_item(a.clone(), 2);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), Decimal::from(200));

        cart.add_item(a, 3);
        assert_eq!(cart.quantity_of(&ProductId::new("A")), 5);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), Decimal::from(500));

        cart.update_quantity(&ProductId::new("A"), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("A")), 1);
        assert_eq!(cart.total_price(), Decimal::from(100));

        cart.remove_item(&ProductId::new("A"));
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_distinct_products_preserve_order() {
        let mut cart = Cart::new();
        cart.add_item(product("B", 50), 1);
        cart.add_item(product("C", 75), 1);

        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), Decimal::from(125));
        assert_eq!(cart.len(), 2);
        assert_eq!(ids(&cart), ["B", "C"]);
    }

    #[test]
    fn test_merge_keeps_original_snapshot() {
        let mut cart = Cart::new();
        cart.add_item(product("A", 100), 1);
        cart.add_item(product("A", 80), 1);

        let item = cart.item(&ProductId::new("A")).unwrap();
        assert_eq!(item.product.price, Decimal::from(100));
        assert_eq!(item.quantity, 2);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_update_non_positive_removes() {
        for quantity in [0, -1, -50] {
            let mut cart = Cart::new();
            cart.add_item(product("A", 10), 3);
            assert_eq!(cart.update_quantity(&ProductId::new("A"), quantity), 0);
            assert!(cart.item(&ProductId::new("A")).is_none());
        }
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product("A", 10), 1);
        let before = cart.clone();

        assert_eq!(cart.update_quantity(&ProductId::new("missing"), 4), 0);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(product("A", 10), 1);
        cart.add_item(product("B", 20), 1);

        assert!(cart.remove_item(&ProductId::new("A")));
        let once = cart.clone();
        assert!(!cart.remove_item(&ProductId::new("A")));
        assert_eq!(cart, once);
    }

    #[test]
    fn test_add_zero_quantity_stores_nothing() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(product("A", 10), 0), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_ceiling_clamps_add_and_update() {
        let mut cart = Cart::new();
        let limited = product("A", 10).with_stock(3);

        assert_eq!(cart.add_item(limited.clone(), 2), 2);
        assert!(!cart.at_stock_limit(&ProductId::new("A")));
        assert_eq!(cart.add_item(limited, 5), 3);
        assert!(cart.at_stock_limit(&ProductId::new("A")));
        assert_eq!(cart.update_quantity(&ProductId::new("A"), 10), 3);
        assert_eq!(cart.update_quantity(&ProductId::new("A"), 1), 1);
    }

    #[test]
    fn test_out_of_stock_product_is_not_added() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(product("A", 10).with_stock(0), 1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add_item(product("A", 10), 1);
        cart.add_item(product("B", 10), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let mut cart = Cart::new();
        cart.add_item(product("A", 10), 2);

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value["items"][0]["product"]["id"], "A");
        assert_eq!(value["items"][0]["quantity"], 2);
        assert!(value.get("loading").is_none());
    }

    #[test]
    fn test_deserialize_normalizes_items() {
        let json = r#"{
            "items": [
                {"product": {"id": "A", "name": "A", "price": "10"}, "quantity": 2},
                {"product": {"id": "B", "name": "B", "price": "5"}, "quantity": 0},
                {"product": {"id": "A", "name": "A", "price": "10"}, "quantity": 1},
                {"product": {"id": "C", "name": "C", "price": "1", "stock": 2}, "quantity": 9}
            ]
        }"#;

        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(ids(&cart), ["A", "C"]);
        assert_eq!(cart.quantity_of(&ProductId::new("A")), 3);
        assert_eq!(cart.quantity_of(&ProductId::new("C")), 2);
    }

    #[test]
    fn test_deserialize_missing_items_is_empty() {
        let cart: Cart = serde_json::from_str("{}").unwrap();
        assert!(cart.is_empty());
    }

    fn arb_ops() -> impl Strategy<Value = Vec<(u8, u32, i64)>> {
        prop::collection::vec((0u8..4, 1u32..20, -3i64..20), 0..40)
    }

    proptest! {
        #[test]
        fn prop_repeated_adds_sum(quantities in prop::collection::vec(1u32..1000, 1..20)) {
            let mut cart = Cart::new();
            for q in &quantities {
                cart.add_item(product("A", 7), *q);
            }
            let expected: u32 = quantities.iter().sum();
            prop_assert_eq!(cart.quantity_of(&ProductId::new("A")), expected);
            prop_assert_eq!(cart.len(), 1);
        }

        #[test]
        fn prop_invariants_and_totals_hold(ops in arb_ops()) {
            let mut cart = Cart::new();
            for (slot, add, set) in ops {
                let id = format!("P{slot}");
                let price = i64::from(slot) * 10 + 5;
                if set % 2 == 0 {
                    cart.add_item(product(&id, price), add);
                } else {
                    cart.update_quantity(&ProductId::new(id), set);
                }

                let mut seen = std::collections::HashSet::new();
                for item in cart.items() {
                    prop_assert!(item.quantity >= 1);
                    prop_assert!(seen.insert(item.product.id.clone()));
                }

                let items: u64 = cart.items().iter().map(|i| u64::from(i.quantity)).sum();
                let price: Decimal = cart
                    .items()
                    .iter()
                    .map(|i| i.product.price * Decimal::from(i.quantity))
                    .sum();
                prop_assert_eq!(cart.total_items(), items);
                prop_assert_eq!(cart.total_price(), price);
            }
        }

        #[test]
        fn prop_json_round_trip_preserves_items(ops in arb_ops()) {
            let mut cart = Cart::new();
            for (slot, add, _) in ops {
                cart.add_item(product(&format!("P{slot}"), 3), add);
            }

            let json = serde_json::to_string(&cart).unwrap();
            let restored: Cart = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(restored, cart);
        }
    }
}
