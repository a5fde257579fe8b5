//! Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Malformed NVP payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NvpError {
    /// Segment without a `=` separator
    #[error("segment {index} has no '=' separator: {segment:?}")]
    MissingSeparator { index: usize, segment: String },

    /// Segment with an empty key
    #[error("segment {index} has an empty key")]
    EmptyKey { index: usize },

    /// Truncated or non-hex `%` escape
    #[error("invalid percent escape at byte {position} in {input:?}")]
    InvalidEscape { position: usize, input: String },

    /// Decoded bytes are not UTF-8
    #[error("decoded value is not valid UTF-8: {0:?}")]
    InvalidUtf8(String),

    /// Required response field missing
    #[error("response has no {0} field")]
    MissingField(&'static str),

    /// Field present but its value cannot be interpreted
    #[error("field {field} has invalid value {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// One `L_ERRORCODEn` group from a failed response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// `L_ERRORCODEn`
    pub code: String,

    /// `L_SHORTMESSAGEn`
    pub short_message: String,

    /// `L_LONGMESSAGEn`
    pub long_message: String,

    /// `L_SEVERITYCODEn`
    pub severity: String,
}

/// A well-formed response whose ACK reports failure.
///
/// The transaction has already been persisted when this is raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayPalError {
    /// Id of the stored audit record
    pub transaction_id: Uuid,

    /// PayPal correlation id, for support tracing
    pub correlation_id: Option<String>,

    /// Error groups in index order
    pub errors: Vec<ApiErrorDetail>,
}

impl std::fmt::Display for PayPalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.errors.first() {
            Some(first) => write!(f, "{} ({})", first.long_message, first.code)?,
            None => write!(f, "request failed with no error details")?,
        }
        if self.errors.len() > 1 {
            write!(f, " and {} more", self.errors.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for PayPalError {}

/// Error raised by an `HttpTransport`; the underlying client error is kept as the source
#[derive(Error, Debug)]
#[error(transparent)]
pub struct TransportError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    /// Wrap any client error
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    /// Borrow the underlying client error
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// Gateway errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] NvpError),

    /// PayPal acknowledged the call with a failure
    #[error("PayPal error: {0}")]
    PayPal(PayPalError),

    /// Transport failure from the HTTP collaborator
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Non-200 HTTP status
    #[error("PayPal API returned HTTP {status}")]
    Api { status: u16 },

    /// Successful response lacking a field the caller needs
    #[error("Missing field in PayPal response: {0}")]
    MissingField(&'static str),

    /// Caller supplied an unusable argument
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Api { .. } | Self::Storage(_))
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::PayPal(_) => "PayPal could not process the payment.",
            Self::Transport(_) | Self::Api { .. } => {
                "PayPal is currently unavailable. Please try again."
            }
            Self::InvalidRequest(_) => "The payment details are invalid.",
            Self::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your payment.",
        }
    }
}
