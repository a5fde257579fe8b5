//! Storefront Facade
//!
//! What a checkout view needs: turn a basket into a PayPal redirect, then
//! read back and confirm the session when the buyer returns.

use paypal_core::{Result, Transaction};
use rust_decimal::Decimal;

use crate::checkout::ExpressCheckout;

/// A basket ready for payment
pub trait Basket {
    /// Total including tax
    fn total_incl_tax(&self) -> Decimal;

    /// Basket currency; `None` uses the configured default
    fn currency(&self) -> Option<&str> {
        None
    }
}

/// Site-relative callback paths, qualified with the site domain at call time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnPaths {
    /// Where PayPal sends the buyer after approval
    pub success: String,

    /// Where PayPal sends the buyer after cancelling
    pub cancel: String,
}

impl Default for ReturnPaths {
    fn default() -> Self {
        Self {
            success: "/checkout/paypal/success/".into(),
            cancel: "/checkout/paypal/cancel/".into(),
        }
    }
}

/// Checkout-view entry points over an [`ExpressCheckout`] gateway
pub struct Facade {
    gateway: ExpressCheckout,
    paths: ReturnPaths,
}

impl Facade {
    pub fn new(gateway: ExpressCheckout) -> Self {
        Self {
            gateway,
            paths: ReturnPaths::default(),
        }
    }

    #[must_use]
    pub fn with_paths(mut self, paths: ReturnPaths) -> Self {
        self.paths = paths;
        self
    }

    pub const fn gateway(&self) -> &ExpressCheckout {
        &self.gateway
    }

    /// Start Express Checkout for a basket and return the buyer redirect URL
    pub async fn get_paypal_url(&self, basket: &impl Basket) -> Result<String> {
        let currency = basket
            .currency()
            .unwrap_or(&self.gateway.config().currency);

        tracing::debug!(
            total = %basket.total_incl_tax(),
            currency = %currency,
            "Starting PayPal checkout for basket"
        );

        self.gateway
            .set_express_checkout(
                basket.total_incl_tax(),
                currency,
                &self.paths.success,
                &self.paths.cancel,
            )
            .await
    }

    /// Buyer and shipping details for a returning buyer
    pub async fn fetch_transaction_details(&self, token: &str) -> Result<Transaction> {
        self.gateway.fetch_transaction_details(token).await
    }

    /// Capture the payment once the buyer has approved it
    pub async fn confirm_transaction(
        &self,
        payer_id: &str,
        token: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Transaction> {
        self.gateway
            .confirm_transaction(payer_id, token, amount, currency)
            .await
    }
}
