//! Reqwest Transport
//!
//! `HttpTransport` backed by a `reqwest::Client` with an explicit timeout.

use async_trait::async_trait;
use paypal_core::transport::FORM_CONTENT_TYPE;
use paypal_core::{HttpResponse, HttpTransport, PaymentError, Result, TransportError};
use reqwest::header::CONTENT_TYPE;

use crate::config::PayPalConfig;

/// reqwest-backed transport
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client honoring the configured timeout
    pub fn new(config: &PayPalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("paypal-express/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PaymentError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client; its timeout settings are used as-is
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        body: String,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(TransportError::new)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::new)?;

        Ok(HttpResponse { status, body })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn test_builds_from_config() {
        let transport = ReqwestTransport::new(&PayPalConfig::default()).unwrap();
        assert_eq!(transport.name(), "reqwest");
    }

    #[tokio::test]
    async fn test_connection_failure_is_a_transport_error() {
        let config = PayPalConfig::default().with_timeout(Duration::from_secs(2));
        let transport = ReqwestTransport::new(&config).unwrap();

        let err = transport
            .post_form("http://127.0.0.1:9/nvp", "METHOD=X".into())
            .await
            .unwrap_err();
        assert!(err.inner().downcast_ref::<reqwest::Error>().is_some());
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_error() {
        // Accepts the connection and never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/nvp", listener.local_addr().unwrap());
        let held = std::thread::spawn(move || listener.accept().map(|(stream, _)| stream));

        let config = PayPalConfig::default().with_timeout(Duration::from_millis(300));
        let transport = ReqwestTransport::new(&config).unwrap();

        let started = Instant::now();
        let err = transport
            .post_form(&url, "METHOD=X".into())
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(1));

        let source = err.inner().downcast_ref::<reqwest::Error>().unwrap();
        assert!(source.is_timeout());
        drop(held.join());
    }

    #[tokio::test]
    async fn test_wraps_existing_client() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let transport = ReqwestTransport::from_client(client);
        assert_eq!(transport.name(), "reqwest");

        let err = transport
            .post_form("http://127.0.0.1:9/nvp", "METHOD=X".into())
            .await;
        assert!(err.is_err());
    }
}
