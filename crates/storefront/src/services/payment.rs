//! Online payment gateway client.
//!
//! The gateway is treated as a black box: the storefront creates a payment
//! order for the cart total and keeps the returned ID as the order's payment
//! reference. Payment confirmation callbacks are not verified.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use smart_shop_core::Money;

use crate::config::PaymentConfig;

/// Currency all amounts are charged in.
pub const CURRENCY: &str = "INR";

/// Errors talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Network or decoding failure.
    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The amount cannot be expressed in minor units.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(Money),
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
}

/// A payment order created at the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
}

/// Client for the payment gateway REST API.
#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl PaymentGateway {
    #[must_use]
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a payment order for `amount`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the request fails or the gateway rejects it.
    #[tracing::instrument(skip(self), fields(amount = %amount))]
    pub async fn create_order(
        &self,
        amount: Money,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let minor = amount
            .to_minor()
            .ok_or(PaymentError::AmountOutOfRange(amount))?;

        let response = self
            .client
            .post(format!("{}/orders", self.config.api_url))
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&CreateOrderRequest {
                amount: minor,
                currency: CURRENCY,
                receipt,
                payment_capture: 1,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Payment gateway rejected order");
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order = response.json::<GatewayOrder>().await?;
        tracing::info!(gateway_order_id = %order.id, "Payment order created");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_request_body() {
        let body = serde_json::to_value(CreateOrderRequest {
            amount: Money::from_minor(20_000).to_minor().unwrap(),
            currency: CURRENCY,
            receipt: "cart-7",
            payment_capture: 1,
        })
        .unwrap();

        assert_eq!(body["amount"], 20_000);
        assert_eq!(body["currency"], "INR");
        assert_eq!(body["receipt"], "cart-7");
    }

    #[test]
    fn test_gateway_order_ignores_extra_fields() {
        let order: GatewayOrder = serde_json::from_str(
            r#"{"id":"order_9A33XWu170gUtm","status":"created","amount":20000}"#,
        )
        .unwrap();
        assert_eq!(order.id, "order_9A33XWu170gUtm");
    }
}
