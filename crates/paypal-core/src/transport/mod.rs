//! HTTP Transport
//!
//! The gateway never talks to an HTTP client directly; it posts form bodies
//! through this trait. Implement it for whatever client the storefront uses.

mod mock;

pub use mock::{MockTransport, RecordedRequest};

use async_trait::async_trait;

use crate::error::TransportError;

/// Content type of every NVP request body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Raw HTTP reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Body as text
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `200 OK` with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Blocking-style POST seam (Strategy pattern)
///
/// One call, one attempt. Implementations enforce their own timeout and must
/// not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a form-encoded body and return the status and body
    async fn post_form(&self, url: &str, body: String) -> Result<HttpResponse, TransportError>;

    /// Transport name
    fn name(&self) -> &str;
}
