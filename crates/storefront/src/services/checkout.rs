//! Checkout: turn a session cart into an order.
//!
//! Everything from the profile address update to the notification runs in
//! one database transaction. Stock is decremented with a guarded update, so
//! if a concurrent checkout took the last units first the whole order is
//! rolled back with [`CheckoutError::InsufficientStock`].

use sqlx::PgPool;
use thiserror::Error;

use smart_shop_core::{Cart, Money, PaymentMethod, ProductId, UserId};

use crate::db::orders::NewOrder;
use crate::db::{
    CatalogRepository, NotificationRepository, OrderRepository, ProfileRepository, RepositoryError,
};
use crate::models::{Order, Product};
use crate::services::notifications::messages;
use crate::services::payment::PaymentError;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("delivery address is required")]
    MissingAddress,

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("not enough stock for product {0}")]
    InsufficientStock(ProductId),

    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// One priced line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub price: Money,
    pub quantity: u32,
}

/// Priced cart lines and their total, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Money,
}

impl CheckoutPlan {
    /// Price `cart` with the current `products`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart.
    /// Returns `CheckoutError::ProductNotFound` if a cart product is missing.
    pub fn build(cart: &Cart, products: &[Product]) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines = cart
            .lines()
            .map(|(product_id, quantity)| {
                products
                    .iter()
                    .find(|p| p.id == product_id)
                    .map(|p| PlannedLine {
                        product_id,
                        price: p.price,
                        quantity,
                    })
                    .ok_or(CheckoutError::ProductNotFound(product_id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = lines.iter().map(|l| l.price.times(l.quantity)).sum();
        Ok(Self { lines, total })
    }
}

/// Order details supplied by the customer.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'r> {
    pub user_id: UserId,
    pub address: &'r str,
    pub payment_method: PaymentMethod,
    /// Gateway payment order ID for online payments.
    pub payment_reference: Option<&'r str>,
}

/// Checkout workflow.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Price the cart without placing anything (checkout page, online payment amount).
    ///
    /// # Errors
    ///
    /// Same as [`CheckoutPlan::build`].
    pub async fn plan(&self, cart: &Cart) -> Result<CheckoutPlan, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let products = CatalogRepository::new(self.pool)
            .get_products(&cart.product_ids())
            .await?;
        CheckoutPlan::build(cart, &products)
    }

    /// Place an order for `cart`.
    ///
    /// The caller clears the session cart once this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart`, `MissingAddress`, `ProductNotFound` or
    /// `InsufficientStock`; nothing is written in any of those cases.
    #[tracing::instrument(skip(self, cart, request), fields(user_id = %request.user_id, method = %request.payment_method))]
    pub async fn place_order(
        &self,
        cart: &Cart,
        request: CheckoutRequest<'_>,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let address = request.address.trim();
        if address.is_empty() {
            return Err(CheckoutError::MissingAddress);
        }

        let mut tx = self.pool.begin().await?;

        let products = CatalogRepository::get_products_in(&mut tx, &cart.product_ids()).await?;
        let plan = CheckoutPlan::build(cart, &products)?;

        ProfileRepository::save_address(&mut tx, request.user_id, address).await?;

        let order = OrderRepository::insert(
            &mut tx,
            &NewOrder {
                user_id: request.user_id,
                address,
                total_amount: plan.total,
                payment_method: request.payment_method,
                payment_reference: request.payment_reference,
            },
        )
        .await?;

        for line in &plan.lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| CheckoutError::InsufficientStock(line.product_id))?;
            OrderRepository::insert_item(&mut tx, order.id, line.product_id, line.price, quantity)
                .await?;
            if !CatalogRepository::decrement_stock(&mut tx, line.product_id, quantity).await? {
                tracing::warn!(product_id = %line.product_id, "Checkout lost stock race");
                return Err(CheckoutError::InsufficientStock(line.product_id));
            }
        }

        let message = match request.payment_method {
            PaymentMethod::Cod => messages::order_placed(order.id),
            PaymentMethod::Online => messages::online_payment(order.id),
        };
        NotificationRepository::insert(&mut tx, request.user_id, &message).await?;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, total = %order.total_amount, "Order placed");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::cart::tests::product;

    #[test]
    fn test_plan_rejects_empty_cart() {
        assert!(matches!(
            CheckoutPlan::build(&Cart::new(), &[product(7, 100, 5)]),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_plan_totals_price_times_quantity() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(7), 5).unwrap();
        cart.add(ProductId::new(7), 5).unwrap();

        let plan = CheckoutPlan::build(&cart, &[product(7, 100, 5)]).unwrap();

        assert_eq!(
            plan.lines,
            vec![PlannedLine {
                product_id: ProductId::new(7),
                price: product(7, 100, 5).price,
                quantity: 2,
            }]
        );
        assert_eq!(plan.total.to_string(), "200.00");
    }

    #[test]
    fn test_plan_one_line_per_cart_entry() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 10).unwrap();
        cart.add(ProductId::new(2), 10).unwrap();
        cart.add(ProductId::new(2), 10).unwrap();
        cart.add(ProductId::new(3), 10).unwrap();

        let products = [product(1, 10, 10), product(2, 20, 10), product(3, 5, 10)];
        let plan = CheckoutPlan::build(&cart, &products).unwrap();

        assert_eq!(plan.lines.len(), cart.len());
        assert_eq!(plan.total.to_string(), "55.00");
    }

    #[test]
    fn test_plan_missing_product() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(4), 1).unwrap();

        assert!(matches!(
            CheckoutPlan::build(&cart, &[]),
            Err(CheckoutError::ProductNotFound(id)) if id == ProductId::new(4)
        ));
    }
}
