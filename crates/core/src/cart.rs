//! The per-session shopping cart.
//!
//! A [`Cart`] maps product IDs to requested quantities. It lives in the
//! browser session (never in a database table) and is discarded once an
//! order has been placed.
//!
//! Session data is untrusted: [`Cart::from_raw`] rebuilds a typed cart from
//! the stored `{"<product id>": quantity}` map and silently drops anything
//! that is not a positive product ID with a positive quantity. Every mutation
//! that knows the product's stock clamps the quantity to it, so a cart line
//! never asks for more than was available at the time of the last change.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A requested quantity: always at least 1 and at most [`Quantity::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Upper bound for a single cart line.
    pub const MAX: u32 = 10_000;

    /// Returns `None` for zero or anything above [`Quantity::MAX`].
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 || value > Self::MAX {
            None
        } else {
            Some(Self(value))
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("quantity out of range: {value}"))
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

/// Direction of a cart line update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    Increase,
    Decrease,
}

impl FromStr for CartUpdate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            other => Err(format!("unknown cart action: {other}")),
        }
    }
}

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),
}

/// Upper bound for a line given the product's current stock.
fn stock_limit(stock: i32) -> u32 {
    u32::try_from(stock).unwrap_or(0).min(Quantity::MAX)
}

/// A shopping cart: product ID to requested quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: BTreeMap<ProductId, Quantity>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from its raw session representation.
    ///
    /// Keys that are not positive integers and quantities that are not
    /// positive are dropped; oversized quantities are clamped to
    /// [`Quantity::MAX`].
    #[must_use]
    pub fn from_raw(raw: &BTreeMap<String, i64>) -> Self {
        let lines = raw
            .iter()
            .filter_map(|(key, &qty)| {
                let id = key.parse::<ProductId>().ok()?;
                let qty = u32::try_from(qty.min(i64::from(Quantity::MAX))).ok()?;
                Some((id, Quantity::new(qty)?))
            })
            .collect();
        Self { lines }
    }

    /// The raw session representation of this cart.
    #[must_use]
    pub fn to_raw(&self) -> BTreeMap<String, i64> {
        self.lines
            .iter()
            .map(|(id, qty)| (id.to_string(), i64::from(qty.get())))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.values().map(|q| q.get()).sum()
    }

    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> Option<u32> {
        self.lines.get(&product_id).map(|q| q.get())
    }

    /// Iterate over `(product, quantity)` in product ID order.
    pub fn lines(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.lines.iter().map(|(id, q)| (*id, q.get()))
    }

    /// Product IDs in the cart.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.keys().copied().collect()
    }

    /// Add one unit of a product, clamped to its stock.
    ///
    /// Returns the new quantity for the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] if the product has no stock; the cart
    /// is left unchanged.
    pub fn add(&mut self, product_id: ProductId, stock: i32) -> Result<u32, CartError> {
        let limit = stock_limit(stock);
        let Some(max) = Quantity::new(limit) else {
            return Err(CartError::OutOfStock(product_id));
        };

        let current = self.quantity(product_id).unwrap_or(0);
        let next = Quantity::new(current.saturating_add(1).min(limit)).unwrap_or(max);
        self.lines.insert(product_id, next);
        Ok(next.get())
    }

    /// Replace the whole cart with a single unit of one product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] if the product has no stock; the cart
    /// is left unchanged.
    pub fn buy_now(&mut self, product_id: ProductId, stock: i32) -> Result<(), CartError> {
        let one = Quantity::new(1).filter(|_| stock_limit(stock) >= 1);
        let Some(one) = one else {
            return Err(CartError::OutOfStock(product_id));
        };

        self.lines.clear();
        self.lines.insert(product_id, one);
        Ok(())
    }

    /// Increase or decrease an existing line, clamped to stock.
    ///
    /// Products not in the cart are ignored. A line that reaches zero is
    /// removed. Returns the line's new quantity, or `None` if the product is
    /// no longer in the cart.
    pub fn update(&mut self, product_id: ProductId, action: CartUpdate, stock: i32) -> Option<u32> {
        let current = self.quantity(product_id)?;
        let wanted = match action {
            CartUpdate::Increase => current.saturating_add(1),
            CartUpdate::Decrease => current - 1,
        };

        match Quantity::new(wanted.min(stock_limit(stock))) {
            Some(next) => {
                self.lines.insert(product_id, next);
                Some(next.get())
            }
            None => {
                self.lines.remove(&product_id);
                None
            }
        }
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.lines.remove(&product_id).is_some()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(id: i32) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_accumulates_up_to_stock() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(pid(7), 2), Ok(1));
        assert_eq!(cart.add(pid(7), 2), Ok(2));
        assert_eq!(cart.add(pid(7), 2), Ok(2));
        assert_eq!(cart.quantity(pid(7)), Some(2));
    }

    #[test]
    fn test_add_clamps_down_when_stock_shrank() {
        let mut cart = Cart::new();
        for _ in 0..4 {
            cart.add(pid(1), 10).unwrap();
        }
        assert_eq!(cart.add(pid(1), 2), Ok(2));
    }

    #[test]
    fn test_add_out_of_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add(pid(1), 3).unwrap();
        assert_eq!(cart.add(pid(2), 0), Err(CartError::OutOfStock(pid(2))));
        assert_eq!(cart.add(pid(3), -4), Err(CartError::OutOfStock(pid(3))));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_buy_now_replaces_cart() {
        let mut cart = Cart::new();
        cart.add(pid(1), 5).unwrap();
        cart.add(pid(2), 5).unwrap();
        cart.add(pid(2), 5).unwrap();

        cart.buy_now(pid(9), 3).unwrap();
        assert_eq!(cart.lines().collect::<Vec<_>>(), vec![(pid(9), 1)]);
    }

    #[test]
    fn test_buy_now_out_of_stock() {
        let mut cart = Cart::new();
        cart.add(pid(1), 5).unwrap();
        assert!(cart.buy_now(pid(9), 0).is_err());
        assert_eq!(cart.quantity(pid(1)), Some(1));
    }

    #[test]
    fn test_update_increase_clamped() {
        let mut cart = Cart::new();
        cart.add(pid(1), 2).unwrap();
        assert_eq!(cart.update(pid(1), CartUpdate::Increase, 2), Some(2));
        assert_eq!(cart.update(pid(1), CartUpdate::Increase, 2), Some(2));
    }

    #[test]
    fn test_update_decrease_removes_at_zero() {
        let mut cart = Cart::new();
        cart.add(pid(1), 5).unwrap();
        cart.add(pid(1), 5).unwrap();
        assert_eq!(cart.update(pid(1), CartUpdate::Decrease, 5), Some(1));
        assert_eq!(cart.update(pid(1), CartUpdate::Decrease, 5), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_ignores_missing_line() {
        let mut cart = Cart::new();
        assert_eq!(cart.update(pid(4), CartUpdate::Increase, 10), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_removes_line_when_stock_gone() {
        let mut cart = Cart::new();
        cart.add(pid(1), 5).unwrap();
        assert_eq!(cart.update(pid(1), CartUpdate::Increase, 0), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add(pid(1), 5).unwrap();
        assert!(cart.remove(pid(1)));
        assert!(!cart.remove(pid(1)));
    }

    #[test]
    fn test_from_raw_drops_invalid_entries() {
        let raw: BTreeMap<String, i64> = [
            ("7".to_string(), 2),
            ("abc".to_string(), 1),
            ("-1".to_string(), 1),
            ("8".to_string(), 0),
            ("9".to_string(), -5),
            ("10".to_string(), 1_000_000),
        ]
        .into_iter()
        .collect();

        let cart = Cart::from_raw(&raw);
        assert_eq!(
            cart.lines().collect::<Vec<_>>(),
            vec![(pid(7), 2), (pid(10), Quantity::MAX)]
        );
    }

    #[test]
    fn test_raw_roundtrip_preserves_lines() {
        let mut cart = Cart::new();
        cart.add(pid(3), 5).unwrap();
        cart.add(pid(3), 5).unwrap();
        cart.add(pid(11), 1).unwrap();

        let raw = cart.to_raw();
        assert_eq!(raw.get("3"), Some(&2));
        assert_eq!(Cart::from_raw(&raw), cart);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_cart_update_parse() {
        assert_eq!("increase".parse::<CartUpdate>(), Ok(CartUpdate::Increase));
        assert_eq!("decrease".parse::<CartUpdate>(), Ok(CartUpdate::Decrease));
        assert!("double".parse::<CartUpdate>().is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(Quantity::new(0).is_none());
        assert_eq!(Quantity::new(1).map(Quantity::get), Some(1));
        assert!(Quantity::new(Quantity::MAX + 1).is_none());
    }
}
