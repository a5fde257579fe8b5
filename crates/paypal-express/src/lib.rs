//! # paypal-express
//!
//! PayPal Express Checkout over the classic NVP API.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  SetExpressCheckout   ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │──────────────────────▶│  PayPal hosted  │────▶│  Your Site  │
//! │  (basket)   │   redirect(token)     │  approval page  │     │  (return)   │
//! └─────────────┘                       └─────────────────┘     └─────────────┘
//!                                                                     │
//!                       GetExpressCheckoutDetails + DoExpressCheckoutPayment
//! ```
//!
//! Every call leaves a [`Transaction`] record in the configured
//! [`TransactionStore`], with the API password redacted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paypal_express::{ExpressCheckout, Facade, MemoryTransactionStore, PayPalConfig};
//!
//! let config = PayPalConfig::from_env()?;
//! let store = Arc::new(MemoryTransactionStore::new());
//! let facade = Facade::new(ExpressCheckout::from_config(config, store)?);
//!
//! // Redirect the buyer to this URL
//! let url = facade.get_paypal_url(&basket).await?;
//!
//! // On return: ?token=EC-...&PayerID=...
//! let details = facade.fetch_transaction_details(&token).await?;
//! let payment = facade
//!     .confirm_transaction(&payer_id, &token, details.amount().unwrap_or_default(), "GBP")
//!     .await?;
//! ```

mod checkout;
mod config;
mod facade;
mod transport;

pub use checkout::{
    DO_EXPRESS_CHECKOUT_PAYMENT, ExpressCheckout, GET_EXPRESS_CHECKOUT_DETAILS,
    SET_EXPRESS_CHECKOUT,
};
pub use config::{DEFAULT_API_VERSION, DEFAULT_TIMEOUT, PayPalConfig};
pub use facade::{Basket, Facade, ReturnPaths};
pub use transport::ReqwestTransport;

pub use paypal_core::{
    Ack, ApiErrorDetail, HttpResponse, HttpTransport, MemoryTransactionStore, NvpError,
    PayPalError, PaymentError, Result, Transaction, TransactionStore, TransportError,
};
