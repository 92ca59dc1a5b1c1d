//! Shopping cart store.
//!
//! A [`Cart`] holds the shopper's line items for a browsing session plus the
//! drawer visibility flag. All operations are synchronous and infallible;
//! items are caller-supplied and trusted. Persistence is not handled here:
//! [`CartCodec`] is the only place a cart is turned into bytes and back.
//!
//! Invariants:
//! - at most one line item per product id
//! - every stored quantity is at least 1
//! - line items keep insertion order

mod codec;

pub use codec::{CART_FORMAT_VERSION, CartCodec, CartDecodeError};

use serde::{Deserialize, Serialize};

use crate::catalog::ProductCategory;
use crate::{Price, ProductId};

/// One product/quantity pair inside the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price in cents.
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub category: ProductCategory,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Price of this line (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    #[serde(default)]
    is_open: bool,
}

impl Cart {
    /// An empty, closed cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            is_open: false,
        }
    }

    /// Build a cart from previously stored items.
    ///
    /// Repeated ids are merged by summing their quantities and zero-quantity
    /// entries are dropped, so a hand-edited or stale blob still yields a
    /// cart that upholds the invariants.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.position(&item.id) {
                Some(index) => {
                    if let Some(existing) = cart.items.get_mut(index) {
                        existing.quantity = existing.quantity.saturating_add(item.quantity);
                    }
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line item by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the cart drawer is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Add one unit of `item`.
    ///
    /// If the product is already in the cart its quantity is incremented by
    /// one; otherwise the item is appended with quantity one, whatever
    /// quantity the caller supplied. Adding always opens the drawer.
    pub fn add_item(&mut self, item: CartItem) {
        match self.position(&item.id) {
            Some(index) => {
                if let Some(existing) = self.items.get_mut(index) {
                    existing.quantity = existing.quantity.saturating_add(1);
                }
            }
            None => self.items.push(CartItem { quantity: 1, ..item }),
        }
        self.is_open = true;
    }

    /// Remove the line item for `id`. Removing an absent id is a no-op.
    pub fn remove_item(&mut self, id: &ProductId) {
        self.items.retain(|item| &item.id != id);
    }

    /// Set the quantity for `id`.
    ///
    /// A quantity of zero or less removes the line. A positive quantity
    /// replaces the stored one verbatim; there is no upper bound. Ids not in
    /// the cart are ignored.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == id) {
            item.quantity = quantity;
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price × quantity` over all line items.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub const fn open(&mut self) {
        self.is_open = true;
    }

    pub const fn close(&mut self) {
        self.is_open = false;
    }

    pub const fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            image: None,
            quantity: 1,
            category: ProductCategory::Firestick,
        }
    }

    #[test]
    fn test_repeated_add_increments_single_entry() {
        let mut cart = Cart::new();
        for _ in 0..5 {
            cart.add_item(item("a", 100));
        }
        cart.add_item(item("b", 50));
        cart.add_item(item("a", 100));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.get(&ProductId::new("a")).unwrap().quantity, 6);
        assert_eq!(cart.get(&ProductId::new("b")).unwrap().quantity, 1);
        assert_eq!(cart.items()[0].id.as_str(), "a");
    }

    #[test]
    fn test_add_ignores_supplied_quantity_and_opens_drawer() {
        let mut cart = Cart::new();
        assert!(!cart.is_open());
        cart.add_item(CartItem {
            quantity: 40,
            ..item("a", 100)
        });
        assert_eq!(cart.get(&ProductId::new("a")).unwrap().quantity, 1);
        assert!(cart.is_open());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(item("a", 100));
        cart.add_item(item("b", 100));
        cart.remove_item(&ProductId::new("a"));
        let after_first = cart.clone();
        cart.remove_item(&ProductId::new("a"));
        assert_eq!(cart, after_first);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        cart.add_item(item("a", 100));

        cart.update_quantity(&ProductId::new("a"), 7);
        assert_eq!(cart.get(&ProductId::new("a")).unwrap().quantity, 7);

        cart.update_quantity(&ProductId::new("missing"), 3);
        assert_eq!(cart.items().len(), 1);

        cart.update_quantity(&ProductId::new("a"), 0);
        assert!(cart.is_empty());

        cart.add_item(item("b", 100));
        cart.update_quantity(&ProductId::new("b"), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_matches_sum_of_lines() {
        let mut cart = Cart::new();
        cart.add_item(item("a", 1999));
        cart.add_item(item("a", 1999));
        cart.add_item(item("b", 4500));
        cart.update_quantity(&ProductId::new("b"), 3);

        let expected: i64 = cart
            .items()
            .iter()
            .map(|i| i.price.cents() * i64::from(i.quantity))
            .sum();
        assert_eq!(cart.total().cents(), expected);
        assert_eq!(cart.total().cents(), 2 * 1999 + 3 * 4500);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_add_twice_then_remove_scenario() {
        let mut cart = Cart::new();
        cart.add_item(item("A", 10));
        cart.add_item(item("A", 10));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total().cents(), 20);

        cart.remove_item(&ProductId::new("A"));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_clear_keeps_drawer_state() {
        let mut cart = Cart::new();
        cart.add_item(item("a", 100));
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.is_open());
        cart.toggle();
        assert!(!cart.is_open());
    }

    #[test]
    fn test_from_items_merges_duplicates_and_drops_zero() {
        let cart = Cart::from_items([
            CartItem {
                quantity: 2,
                ..item("a", 100)
            },
            CartItem {
                quantity: 0,
                ..item("b", 100)
            },
            CartItem {
                quantity: 3,
                ..item("a", 100)
            },
        ]);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }
}
