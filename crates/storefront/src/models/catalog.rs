//! Catalog domain types.

use smart_shop_core::{CategoryId, Money, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product with its current price and stock level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i32,
    /// Image path relative to the static directory.
    pub image: Option<String>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Stock at or below this level is reported as low.
    pub const LOW_STOCK_THRESHOLD: i32 = 5;
}
