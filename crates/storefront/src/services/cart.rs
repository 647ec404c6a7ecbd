//! Session-backed cart.
//!
//! The cart is stored in the `tower-sessions` session as a raw
//! `{"<product id>": quantity}` map and parsed into a typed [`Cart`] on load.
//! Every mutation must be followed by [`SessionCart::save`].

use std::collections::BTreeMap;

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use smart_shop_core::{Cart, CartError, CartUpdate, Money, ProductId};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{Product, session_keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// The product does not exist (or no longer exists).
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The product has no stock left.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The cart of the current browser session.
pub struct SessionCart {
    session: Session,
    cart: Cart,
}

impl SessionCart {
    /// Load the cart from the session. A missing or malformed cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `session::Error` if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let raw = match session
            .get::<BTreeMap<String, i64>>(session_keys::CART)
            .await
        {
            Ok(raw) => raw.unwrap_or_default(),
            Err(tower_sessions::session::Error::SerdeJson(e)) => {
                tracing::warn!(error = %e, "Discarding malformed session cart");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            session: session.clone(),
            cart: Cart::from_raw(&raw),
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Write the cart back into the session.
    ///
    /// # Errors
    ///
    /// Returns `session::Error` if the session store fails.
    pub async fn save(&self) -> Result<(), tower_sessions::session::Error> {
        self.session
            .insert(session_keys::CART, self.cart.to_raw())
            .await
    }

    /// Empty the cart and persist it.
    ///
    /// # Errors
    ///
    /// Returns `session::Error` if the session store fails.
    pub async fn clear(&mut self) -> Result<(), tower_sessions::session::Error> {
        self.cart.clear();
        self.save().await
    }
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub subtotal: Money,
}

/// The cart page: resolved lines and the grand total.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Money,
}

impl CartView {
    /// Resolve `cart` against `products`.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ProductNotFound` for the first cart line
    /// whose product is not in `products`.
    pub fn build(cart: &Cart, products: &[Product]) -> Result<Self, CartServiceError> {
        let lines = cart
            .lines()
            .map(|(product_id, quantity)| {
                let product = products
                    .iter()
                    .find(|p| p.id == product_id)
                    .ok_or(CartServiceError::ProductNotFound(product_id))?;
                Ok(CartLine {
                    product: product.clone(),
                    quantity,
                    subtotal: product.price.times(quantity),
                })
            })
            .collect::<Result<Vec<_>, CartServiceError>>()?;

        let total = lines.iter().map(|line| line.subtotal).sum();
        Ok(Self { lines, total })
    }
}

/// Cart operations that need the catalog.
pub struct CartService<'a> {
    catalog: CatalogRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            catalog: CatalogRepository::new(pool),
        }
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, CartServiceError> {
        self.catalog
            .get_product(product_id)
            .await?
            .ok_or(CartServiceError::ProductNotFound(product_id))
    }

    /// Add one unit of a product, capped at its stock.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or `Cart(OutOfStock)`.
    pub async fn add(&self, cart: &mut Cart, product_id: ProductId) -> Result<u32, CartServiceError> {
        let product = self.product(product_id).await?;
        Ok(cart.add(product.id, product.stock)?)
    }

    /// Replace the cart with a single unit of a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or `Cart(OutOfStock)`.
    pub async fn buy_now(&self, cart: &mut Cart, product_id: ProductId) -> Result<(), CartServiceError> {
        let product = self.product(product_id).await?;
        Ok(cart.buy_now(product.id, product.stock)?)
    }

    /// Increase or decrease a line. Lines not in the cart are left alone.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if the product no longer exists.
    pub async fn update(
        &self,
        cart: &mut Cart,
        product_id: ProductId,
        action: CartUpdate,
    ) -> Result<Option<u32>, CartServiceError> {
        if cart.quantity(product_id).is_none() {
            return Ok(None);
        }
        let product = self.product(product_id).await?;
        Ok(cart.update(product.id, action, product.stock))
    }

    /// Resolve the cart for display.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if a product in the cart no longer exists.
    pub async fn view(&self, cart: &Cart) -> Result<CartView, CartServiceError> {
        if cart.is_empty() {
            return Ok(CartView::default());
        }
        let products = self.catalog.get_products(&cart.product_ids()).await?;
        CartView::build(cart, &products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use smart_shop_core::CategoryId;
    use tower_sessions::MemoryStore;

    use super::*;

    pub fn product(id: i32, price: i64, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Product {id}"),
            description: String::new(),
            price: Money::new(Decimal::new(price, 0)),
            stock,
            image: None,
        }
    }

    #[test]
    fn test_view_computes_subtotals_and_total() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(7), 5).unwrap();
        cart.add(ProductId::new(7), 5).unwrap();
        cart.add(ProductId::new(3), 1).unwrap();

        let view = CartView::build(&cart, &[product(7, 100, 5), product(3, 25, 1)]).unwrap();

        assert_eq!(view.lines.len(), 2);
        let seven = view.lines.iter().find(|l| l.product.id == ProductId::new(7)).unwrap();
        assert_eq!(seven.quantity, 2);
        assert_eq!(seven.subtotal.to_string(), "200.00");
        assert_eq!(view.total.to_string(), "225.00");
    }

    #[test]
    fn test_view_fails_when_product_vanished() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(9), 3).unwrap();

        let err = CartView::build(&cart, &[product(7, 100, 5)]).unwrap_err();
        assert!(matches!(err, CartServiceError::ProductNotFound(id) if id == ProductId::new(9)));
    }

    fn memory_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_load_treats_malformed_cart_as_empty() {
        let session = memory_session();
        session.insert(session_keys::CART, "not a cart").await.unwrap();

        let cart = SessionCart::load(&session).await.unwrap();
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_lines() {
        let session = memory_session();
        let mut cart = SessionCart::load(&session).await.unwrap();
        cart.cart_mut().add(ProductId::new(7), 5).unwrap();
        cart.cart_mut().add(ProductId::new(7), 5).unwrap();
        cart.save().await.unwrap();

        let reloaded = SessionCart::load(&session).await.unwrap();
        assert_eq!(reloaded.cart().quantity(ProductId::new(7)), Some(2));
    }

    #[test]
    fn test_empty_view() {
        let view = CartView::build(&Cart::new(), &[]).unwrap();
        assert!(view.lines.is_empty());
        assert_eq!(view.total, Money::zero());
    }
}
