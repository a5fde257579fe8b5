//! Gateway Configuration

use std::time::Duration;

use paypal_core::{PaymentError, Result};

/// NVP API version sent with every call
pub const DEFAULT_API_VERSION: &str = "60.0";

/// Default HTTP timeout for calls to PayPal
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// PayPal Express Checkout configuration
#[derive(Clone)]
pub struct PayPalConfig {
    /// API username (`USER`)
    pub username: String,

    /// API password (`PWD`)
    pub password: String,

    /// API signature (`SIGNATURE`)
    pub signature: String,

    /// NVP API version
    pub version: String,

    /// Use the sandbox endpoints
    pub sandbox: bool,

    /// HTTP timeout for one call
    pub timeout: Duration,

    /// Default ISO 4217 currency
    pub currency: String,

    /// Canonical host of this deployment, used to qualify relative URLs
    pub site_domain: String,

    /// Scheme for qualified URLs
    pub site_scheme: String,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            signature: String::new(),
            version: DEFAULT_API_VERSION.into(),
            sandbox: true,
            timeout: DEFAULT_TIMEOUT,
            currency: "GBP".into(),
            site_domain: "localhost:8000".into(),
            site_scheme: "https".into(),
        }
    }
}

impl PayPalConfig {
    /// Sandbox configuration with the given API credentials
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            signature: signature.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| PaymentError::Config(format!("{name} not set")))
        };
        let optional = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let mut config = Self::new(
            required("PAYPAL_API_USERNAME")?,
            required("PAYPAL_API_PASSWORD")?,
            required("PAYPAL_API_SIGNATURE")?,
        );

        if let Some(sandbox) = optional("PAYPAL_SANDBOX_MODE") {
            config.sandbox = parse_bool(&sandbox).ok_or_else(|| {
                PaymentError::Config(format!("PAYPAL_SANDBOX_MODE is not a boolean: {sandbox}"))
            })?;
        }
        if let Some(secs) = optional("PAYPAL_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                PaymentError::Config(format!("PAYPAL_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(version) = optional("PAYPAL_API_VERSION") {
            config.version = version;
        }
        if let Some(currency) = optional("PAYPAL_CURRENCY") {
            config.currency = currency.to_ascii_uppercase();
        }
        if let Some(domain) = optional("PAYPAL_SITE_DOMAIN") {
            config.site_domain = domain;
        }
        if let Some(scheme) = optional("PAYPAL_SITE_SCHEME") {
            config.site_scheme = scheme;
        }

        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_site_domain(mut self, domain: impl Into<String>) -> Self {
        self.site_domain = domain.into();
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_ascii_uppercase();
        self
    }

    /// Reject configurations that cannot produce a valid call
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(PaymentError::Config("timeout must be non-zero".into()));
        }
        if self.site_domain.is_empty() {
            return Err(PaymentError::Config("site domain must be set".into()));
        }
        if !matches!(self.site_scheme.as_str(), "http" | "https") {
            return Err(PaymentError::Config(format!(
                "unsupported site scheme: {}",
                self.site_scheme
            )));
        }
        Ok(())
    }

    /// NVP API endpoint
    pub const fn api_endpoint(&self) -> &'static str {
        if self.sandbox {
            "https://api-3t.sandbox.paypal.com/nvp"
        } else {
            "https://api-3t.paypal.com/nvp"
        }
    }

    /// Host the buyer is redirected to
    pub const fn web_host(&self) -> &'static str {
        if self.sandbox {
            "www.sandbox.paypal.com"
        } else {
            "www.paypal.com"
        }
    }
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("signature", &"***")
            .field("version", &self.version)
            .field("sandbox", &self.sandbox)
            .field("timeout", &self.timeout)
            .field("currency", &self.currency)
            .field("site_domain", &self.site_domain)
            .field("site_scheme", &self.site_scheme)
            .finish()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
