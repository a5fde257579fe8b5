//! Mock Transport
//!
//! For tests and demos. Replies with a canned response and records every
//! request it was asked to send.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{HttpResponse, HttpTransport};
use crate::error::TransportError;
use crate::nvp::{self, NvpMap};

/// A request captured by [`MockTransport`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    /// Decode the recorded body
    pub fn params(&self) -> Result<NvpMap, crate::error::NvpError> {
        nvp::decode(&self.body)
    }
}

/// Canned-response transport
pub struct MockTransport {
    response: Option<HttpResponse>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Reply `200 OK` with `body`
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_response(HttpResponse::ok(body))
    }

    /// Reply with an arbitrary response
    pub fn with_response(response: HttpResponse) -> Self {
        Self {
            response: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with a connection error
    pub fn unreachable() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests sent so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded().clone()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.recorded().last().cloned()
    }

    // A test that panicked mid-push still leaves a usable log
    fn recorded(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_form(&self, url: &str, body: String) -> Result<HttpResponse, TransportError> {
        self.recorded().push(RecordedRequest {
            url: url.to_string(),
            body,
        });

        self.response.clone().ok_or_else(|| {
            TransportError::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock transport is unreachable",
            ))
        })
    }

    fn name(&self) -> &str {
        "MockTransport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_requests() {
        let transport = MockTransport::ok("ACK=Success");
        let response = transport
            .post_form("https://example.test/nvp", "METHOD=X&AMT=1.00".into())
            .await
            .unwrap();

        assert_eq!(response, HttpResponse::ok("ACK=Success"));
        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://example.test/nvp");
        assert_eq!(request.params().unwrap()["AMT"], vec!["1.00"]);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let transport = MockTransport::unreachable();
        let err = transport.post_form("https://example.test/nvp", String::new()).await;
        assert!(err.is_err());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_log_still_records() {
        let transport = std::sync::Arc::new(MockTransport::ok("ACK=Success"));
        transport
            .post_form("https://example.test/nvp", "METHOD=First".into())
            .await
            .unwrap();

        let poisoner = transport.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.requests.lock().unwrap();
            panic!("poison the request log");
        })
        .join();
        assert!(transport.requests.is_poisoned());

        transport
            .post_form("https://example.test/nvp", "METHOD=Second".into())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(transport.last_request().unwrap().body, "METHOD=Second");
    }
}
