//! # paypal-core
//!
//! Provider-side building blocks for PayPal Express Checkout over NVP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   encode    ┌────────────────┐   post_form   ┌────────┐
//! │  NvpRequest  │────────────▶│  HttpTransport │──────────────▶│ PayPal │
//! └──────────────┘             └────────────────┘◀──────────────└────────┘
//!        │                              │ body
//!        │ redact                       ▼ decode
//!        │                     ┌────────────────┐     save     ┌──────────────────┐
//!        └────────────────────▶│  Transaction   │─────────────▶│ TransactionStore │
//!                              └────────────────┘              └──────────────────┘
//! ```
//!
//! `HttpTransport` and `TransactionStore` are the seams to the storefront's
//! HTTP client and database. This crate ships a mock transport and an
//! in-memory store; the reqwest-backed gateway lives in `paypal-express`.

pub mod error;
pub mod nvp;
pub mod redact;
pub mod transaction;
pub mod transport;

pub use error::{ApiErrorDetail, NvpError, PayPalError, PaymentError, Result, TransportError};
pub use nvp::{NvpMap, NvpRequest};
pub use redact::{REDACTION_MARKER, SENSITIVE_FIELDS, redact, redact_fields};
pub use transaction::{Ack, MemoryTransactionStore, Transaction, TransactionStore};
pub use transport::{HttpResponse, HttpTransport, MockTransport};
