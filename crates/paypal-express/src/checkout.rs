//! Express Checkout Gateway
//!
//! One method per NVP call used by the checkout flow:
//!
//! 1. `SetExpressCheckout` opens a session and yields the buyer redirect URL
//! 2. `GetExpressCheckoutDetails` reads the buyer and shipping details back
//! 3. `DoExpressCheckoutPayment` captures the payment
//!
//! Each call is a single attempt. Its record is stored before the outcome is
//! reported, so failed calls are audited too.

use std::sync::Arc;
use std::time::Instant;

use paypal_core::{
    HttpTransport, NvpRequest, PayPalError, PaymentError, Result, Transaction, TransactionStore,
    redact,
};
use rust_decimal::Decimal;
use url::Url;

use crate::config::PayPalConfig;
use crate::transport::ReqwestTransport;

pub const SET_EXPRESS_CHECKOUT: &str = "SetExpressCheckout";
pub const GET_EXPRESS_CHECKOUT_DETAILS: &str = "GetExpressCheckoutDetails";
pub const DO_EXPRESS_CHECKOUT_PAYMENT: &str = "DoExpressCheckoutPayment";

/// Express Checkout client
pub struct ExpressCheckout {
    config: PayPalConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TransactionStore>,
}

impl ExpressCheckout {
    /// Create a gateway over explicit collaborators
    pub fn new(
        config: PayPalConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn TransactionStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            store,
        })
    }

    /// Create a gateway that talks to PayPal over reqwest
    pub fn from_config(config: PayPalConfig, store: Arc<dyn TransactionStore>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::new(config, transport, store)
    }

    pub const fn config(&self) -> &PayPalConfig {
        &self.config
    }

    /// Where transaction records are kept
    pub fn store(&self) -> &dyn TransactionStore {
        self.store.as_ref()
    }

    /// Open an Express Checkout session and return the URL to send the buyer to.
    ///
    /// Relative `return_url`/`cancel_url` values are qualified with the
    /// configured site domain.
    pub async fn set_express_checkout(
        &self,
        amount: Decimal,
        currency: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<String> {
        let request = NvpRequest::method(SET_EXPRESS_CHECKOUT)
            .with("AMT", format_amount(amount)?)
            .with("CURRENCYCODE", normalize_currency(currency)?)
            .with("RETURNURL", self.qualify_url(return_url)?)
            .with("CANCELURL", self.qualify_url(cancel_url)?);

        let txn = self.call(request).await?;
        let token = txn.token().ok_or(PaymentError::MissingField("TOKEN"))?;

        self.redirect_url(token)
    }

    /// Fetch the buyer's details for a session token
    pub async fn fetch_transaction_details(&self, token: &str) -> Result<Transaction> {
        let token = require("token", token)?;
        let request = NvpRequest::method(GET_EXPRESS_CHECKOUT_DETAILS).with("TOKEN", token);

        self.call(request).await
    }

    /// Capture the payment for an approved session
    pub async fn confirm_transaction(
        &self,
        payer_id: &str,
        token: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Transaction> {
        let request = NvpRequest::method(DO_EXPRESS_CHECKOUT_PAYMENT)
            .with("PAYMENTACTION", "Sale")
            .with("PAYERID", require("payer id", payer_id)?)
            .with("TOKEN", require("token", token)?)
            .with("AMT", format_amount(amount)?)
            .with("CURRENCYCODE", normalize_currency(currency)?);

        self.call(request).await
    }

    /// Buyer-facing URL for a session token
    pub fn redirect_url(&self, token: &str) -> Result<String> {
        let mut url = Url::parse(&format!("https://{}/webscr", self.config.web_host()))
            .map_err(|e| PaymentError::Config(format!("invalid PayPal host: {e}")))?;
        url.query_pairs_mut()
            .append_pair("cmd", "_express-checkout")
            .append_pair("token", token);

        Ok(url.into())
    }

    /// Absolute http(s) URLs pass through; paths are joined onto the site root.
    ///
    /// A host without a scheme (`shop.example.com/ok/`) is rejected rather
    /// than read as a path.
    fn qualify_url(&self, url: &str) -> Result<String> {
        if let Ok(parsed) = Url::parse(url) {
            if is_web_url(&parsed) {
                return Ok(url.to_string());
            }
            return Err(PaymentError::InvalidRequest(format!(
                "callback URL must be http(s): {url}"
            )));
        }

        if looks_like_host(url) {
            return Err(PaymentError::InvalidRequest(format!(
                "callback URL needs a scheme or a leading '/': {url}"
            )));
        }

        let base = format!("{}://{}/", self.config.site_scheme, self.config.site_domain);
        let base = Url::parse(&base)
            .map_err(|e| PaymentError::Config(format!("invalid site domain {base:?}: {e}")))?;
        let joined = base
            .join(url)
            .map_err(|e| PaymentError::InvalidRequest(format!("invalid callback URL {url:?}: {e}")))?;

        Ok(joined.into())
    }

    async fn call(&self, mut request: NvpRequest) -> Result<Transaction> {
        let method = request.get("METHOD").unwrap_or_default().to_string();

        request.push("VERSION", &self.config.version);
        request.push("USER", &self.config.username);
        request.push("PWD", &self.config.password);
        request.push("SIGNATURE", &self.config.signature);

        let body = request.encode();
        tracing::debug!(
            method = %method,
            transport = self.transport.name(),
            request = %redact(&body),
            "Calling PayPal"
        );

        let started = Instant::now();
        let response = self
            .transport
            .post_form(self.config.api_endpoint(), body)
            .await?;
        let elapsed = started.elapsed();

        if response.status != 200 {
            tracing::warn!(method = %method, status = response.status, "PayPal returned non-200 status");
            return Err(PaymentError::Api {
                status: response.status,
            });
        }

        let txn = Transaction::record(&request, &response.body, elapsed)?;
        self.store.save(&txn)?;

        if !txn.is_successful() {
            let errors = txn.errors();
            tracing::warn!(
                method = %method,
                ack = %txn.ack(),
                correlation_id = ?txn.correlation_id(),
                error_code = ?errors.first().map(|e| e.code.as_str()),
                "PayPal call failed"
            );
            return Err(PaymentError::PayPal(PayPalError {
                transaction_id: txn.id(),
                correlation_id: txn.correlation_id().map(str::to_string),
                errors,
            }));
        }

        tracing::info!(
            method = %method,
            ack = %txn.ack(),
            token = ?txn.token(),
            correlation_id = ?txn.correlation_id(),
            response_time_ms = txn.response_time(),
            "PayPal call succeeded"
        );

        Ok(txn)
    }
}

fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.has_host()
}

fn looks_like_host(url: &str) -> bool {
    url.split_once('/')
        .is_some_and(|(head, _)| head.contains(['.', ':']))
}

fn require<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PaymentError::InvalidRequest(format!("{what} must not be empty")));
    }
    Ok(value)
}

/// Positive, at most two decimal places, always rendered with two
fn format_amount(amount: Decimal) -> Result<String> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::InvalidRequest(format!(
            "amount must be positive: {amount}"
        )));
    }
    if amount.normalize().scale() > 2 {
        return Err(PaymentError::InvalidRequest(format!(
            "amount has more than two decimal places: {amount}"
        )));
    }
    Ok(format!("{amount:.2}"))
}

/// Three-letter ISO 4217 code, uppercased
fn normalize_currency(currency: &str) -> Result<String> {
    let currency = currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PaymentError::InvalidRequest(format!(
            "invalid currency code: {currency:?}"
        )));
    }
    Ok(currency.to_ascii_uppercase())
}
