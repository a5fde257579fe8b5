//! Transaction Records
//!
//! Every outbound API call leaves one immutable audit record: the redacted
//! request, the response as received, and the well-known response fields.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiErrorDetail, NvpError, PaymentError, Result};
use crate::nvp::{self, NvpMap, NvpRequest};
use crate::redact::redact;

/// PayPal acknowledgement status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ack {
    Success,
    SuccessWithWarning,
    Failure,
    FailureWithWarning,
}

impl Ack {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::SuccessWithWarning => "SuccessWithWarning",
            Self::Failure => "Failure",
            Self::FailureWithWarning => "FailureWithWarning",
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithWarning)
    }
}

impl FromStr for Ack {
    type Err = NvpError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Success" => Ok(Self::Success),
            "SuccessWithWarning" => Ok(Self::SuccessWithWarning),
            "Failure" => Ok(Self::Failure),
            "FailureWithWarning" => Ok(Self::FailureWithWarning),
            other => Err(NvpError::InvalidValue {
                field: "ACK",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit record of one request/response pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: Uuid,
    method: String,
    raw_request: String,
    raw_response: String,
    correlation_id: Option<String>,
    token: Option<String>,
    ack: Ack,
    version: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    response_time: f64,
    context: NvpMap,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build the record for a completed call.
    ///
    /// `AMT` and `CURRENCYCODE` come from the response when present and fall
    /// back to what was requested. Fails if the body is malformed or carries
    /// no recognizable `ACK`.
    pub fn record(
        request: &NvpRequest,
        response_body: &str,
        response_time: Duration,
    ) -> std::result::Result<Self, NvpError> {
        let context = nvp::decode(response_body)?;

        let ack = nvp::first(&context, "ACK")
            .ok_or(NvpError::MissingField("ACK"))?
            .parse::<Ack>()?;

        let amount = nvp::first(&context, "AMT")
            .or_else(|| request.get("AMT"))
            .map(|raw| {
                Decimal::from_str(raw).map_err(|_| NvpError::InvalidValue {
                    field: "AMT",
                    value: raw.to_string(),
                })
            })
            .transpose()?;

        let currency = nvp::first(&context, "CURRENCYCODE")
            .or_else(|| request.get("CURRENCYCODE"))
            .map(str::to_string);

        let field = |key: &str| nvp::first(&context, key).map(str::to_string);

        Ok(Self {
            id: Uuid::new_v4(),
            method: request.get("METHOD").unwrap_or_default().to_string(),
            raw_request: redact(&request.encode()),
            raw_response: response_body.to_string(),
            correlation_id: field("CORRELATIONID"),
            token: field("TOKEN"),
            ack,
            version: field("VERSION"),
            amount,
            currency,
            response_time: response_time.as_secs_f64() * 1000.0,
            context,
            created_at: Utc::now(),
        })
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// NVP method of the call
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Encoded request with credentials redacted
    pub fn raw_request(&self) -> &str {
        &self.raw_request
    }

    /// Response body as received
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub const fn ack(&self) -> Ack {
        self.ack
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub const fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// Milliseconds spent waiting for the response
    pub const fn response_time(&self) -> f64 {
        self.response_time
    }

    /// Every decoded response field
    pub const fn context(&self) -> &NvpMap {
        &self.context
    }

    /// First value of a response field
    pub fn value(&self, key: &str) -> Option<&str> {
        nvp::first(&self.context, key)
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn is_successful(&self) -> bool {
        self.ack.is_success()
    }

    /// Indexed `L_ERRORCODEn` groups, stopping at the first missing index
    pub fn errors(&self) -> Vec<ApiErrorDetail> {
        (0..)
            .map_while(|n| {
                let code = self.value(&format!("L_ERRORCODE{n}"))?;
                let part = |name: &str| {
                    self.value(&format!("L_{name}{n}"))
                        .unwrap_or_default()
                        .to_string()
                };
                Some(ApiErrorDetail {
                    code: code.to_string(),
                    short_message: part("SHORTMESSAGE"),
                    long_message: part("LONGMESSAGE"),
                    severity: part("SEVERITYCODE"),
                })
            })
            .collect()
    }
}

/// Persistence contract for transaction records.
///
/// Records are append-only: there is no update, and saving an id twice is an
/// error. `delete_all` exists for teardown.
pub trait TransactionStore: Send + Sync {
    /// Persist a new record and return its id
    fn save(&self, transaction: &Transaction) -> Result<Uuid>;

    /// Get record by id
    fn get(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Get record by PayPal correlation id
    fn get_by_correlation_id(&self, correlation_id: &str) -> Result<Option<Transaction>>;

    /// All records for an Express Checkout token, oldest first
    fn get_by_token(&self, token: &str) -> Result<Vec<Transaction>>;

    /// All records, oldest first
    fn all(&self) -> Result<Vec<Transaction>>;

    /// Remove every record, returning how many were removed
    fn delete_all(&self) -> Result<usize>;
}

/// In-memory transaction store (for development and tests)
#[derive(Default)]
pub struct MemoryTransactionStore {
    transactions: RwLock<Vec<Transaction>>,
    ids: RwLock<HashSet<Uuid>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Transaction>>> {
        self.transactions.read().map_err(|_| poisoned())
    }

    fn filtered(&self, keep: impl Fn(&Transaction) -> bool) -> Result<Vec<Transaction>> {
        Ok(self.read()?.iter().filter(|t| keep(*t)).cloned().collect())
    }
}

fn poisoned() -> PaymentError {
    PaymentError::Storage("transaction store lock poisoned".into())
}

impl TransactionStore for MemoryTransactionStore {
    fn save(&self, transaction: &Transaction) -> Result<Uuid> {
        let mut transactions = self.transactions.write().map_err(|_| poisoned())?;
        let mut ids = self.ids.write().map_err(|_| poisoned())?;

        if !ids.insert(transaction.id) {
            return Err(PaymentError::Storage(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        transactions.push(transaction.clone());

        tracing::debug!(
            transaction_id = %transaction.id,
            method = %transaction.method,
            ack = %transaction.ack,
            "Stored transaction"
        );

        Ok(transaction.id)
    }

    fn get(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.read()?.iter().find(|t| t.id == id).cloned())
    }

    fn get_by_correlation_id(&self, correlation_id: &str) -> Result<Option<Transaction>> {
        Ok(self
            .read()?
            .iter()
            .find(|t| t.correlation_id() == Some(correlation_id))
            .cloned())
    }

    fn get_by_token(&self, token: &str) -> Result<Vec<Transaction>> {
        self.filtered(|t| t.token() == Some(token))
    }

    fn all(&self) -> Result<Vec<Transaction>> {
        self.filtered(|_| true)
    }

    fn delete_all(&self) -> Result<usize> {
        let mut transactions = self.transactions.write().map_err(|_| poisoned())?;
        let mut ids = self.ids.write().map_err(|_| poisoned())?;

        let removed = transactions.len();
        transactions.clear();
        ids.clear();

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DETAILS_BODY: &str = "TOKEN=EC%2d9LW34435GU332960W&CHECKOUTSTATUS=PaymentActionNotInitiated&TIMESTAMP=2012%2d04%2d13T15%3a19%3a25Z&CORRELATIONID=83bda082c24d4&ACK=Success&VERSION=60%2e0&BUILD=2808426&PAYERID=7ZTRBDFYYA47W&FIRSTNAME=David&LASTNAME=Winterbottom&CURRENCYCODE=GBP&AMT=6%2e99&SHIPPINGAMT=0%2e00";

    const FAILURE_BODY: &str = "TIMESTAMP=2012%2d03%2d26T16%3a33%3a09Z&CORRELATIONID=3bea2076bb9c3&ACK=Failure&VERSION=0%2e000000&BUILD=2649250&L_ERRORCODE0=10002&L_SHORTMESSAGE0=Security%20error&L_LONGMESSAGE0=Security%20header%20is%20not%20valid&L_SEVERITYCODE0=Error";

    fn details_request() -> NvpRequest {
        NvpRequest::method("GetExpressCheckoutDetails")
            .with("VERSION", "60.0")
            .with("USER", "merchant_api1.example.com")
            .with("PWD", "1432777837")
            .with("SIGNATURE", "A22DCxaCv-WeMRC6ke")
            .with("TOKEN", "EC-9LW34435GU332960W")
    }

    #[test]
    fn test_record_extracts_known_fields() {
        let before = Utc::now();
        let txn =
            Transaction::record(&details_request(), DETAILS_BODY, Duration::from_millis(250))
                .unwrap();

        assert_eq!(txn.method(), "GetExpressCheckoutDetails");
        assert_eq!(txn.token(), Some("EC-9LW34435GU332960W"));
        assert_eq!(txn.correlation_id(), Some("83bda082c24d4"));
        assert_eq!(txn.ack(), Ack::Success);
        assert_eq!(txn.version(), Some("60.0"));
        assert_eq!(txn.amount(), Some(dec!(6.99)));
        assert_eq!(txn.currency(), Some("GBP"));
        assert!((txn.response_time() - 250.0).abs() < f64::EPSILON);
        assert!(txn.is_successful());
        assert_eq!(txn.raw_response(), DETAILS_BODY);
        assert!(txn.created_at() >= before && txn.created_at() <= Utc::now());
    }

    #[test]
    fn test_context_lookup() {
        let txn = Transaction::record(&details_request(), DETAILS_BODY, Duration::ZERO).unwrap();
        let ctx = txn.context();
        assert_eq!(ctx["ACK"], vec!["Success"]);
        assert_eq!(ctx["LASTNAME"], vec!["Winterbottom"]);
    }

    #[test]
    fn test_password_is_not_saved() {
        let txn = Transaction::record(&details_request(), DETAILS_BODY, Duration::ZERO).unwrap();
        assert!(!txn.raw_request().contains("1432777837"));
        assert!(txn.raw_request().contains("PWD=XXXXXX"));
        assert!(txn.raw_request().contains("TOKEN=EC-9LW34435GU332960W"));
    }

    #[test]
    fn test_amount_falls_back_to_request() {
        let request = NvpRequest::method("SetExpressCheckout")
            .with("AMT", "10.00")
            .with("CURRENCYCODE", "GBP");
        let body = "TOKEN=EC%2d6469953681606921P&CORRELATIONID=50a8d895e928f&ACK=Success&VERSION=60%2e0";
        let txn = Transaction::record(&request, body, Duration::ZERO).unwrap();

        assert_eq!(txn.amount(), Some(dec!(10.00)));
        assert_eq!(txn.currency(), Some("GBP"));
    }

    #[test]
    fn test_failure_record_and_errors() {
        let txn = Transaction::record(&details_request(), FAILURE_BODY, Duration::ZERO).unwrap();
        assert_eq!(txn.ack(), Ack::Failure);
        assert!(!txn.is_successful());
        assert_eq!(txn.token(), None);
        assert_eq!(
            txn.errors(),
            vec![ApiErrorDetail {
                code: "10002".into(),
                short_message: "Security error".into(),
                long_message: "Security header is not valid".into(),
                severity: "Error".into(),
            }]
        );
    }

    #[test]
    fn test_warning_acks() {
        assert!(Ack::SuccessWithWarning.is_success());
        assert!(!Ack::FailureWithWarning.is_success());
        assert_eq!("FailureWithWarning".parse::<Ack>().unwrap(), Ack::FailureWithWarning);
    }

    #[test]
    fn test_missing_or_unknown_ack_is_a_parse_error() {
        let request = details_request();
        assert_eq!(
            Transaction::record(&request, "TOKEN=EC-1", Duration::ZERO).unwrap_err(),
            NvpError::MissingField("ACK")
        );
        assert!(matches!(
            Transaction::record(&request, "ACK=Maybe", Duration::ZERO),
            Err(NvpError::InvalidValue { field: "ACK", .. })
        ));
    }

    #[test]
    fn test_unparseable_amount_is_a_parse_error() {
        let result = Transaction::record(&details_request(), "ACK=Success&AMT=six", Duration::ZERO);
        assert!(matches!(result, Err(NvpError::InvalidValue { field: "AMT", .. })));
    }

    #[test]
    fn test_ack_serializes_as_paypal_string() {
        assert_eq!(
            serde_json::to_string(&Ack::SuccessWithWarning).unwrap(),
            "\"SuccessWithWarning\""
        );
    }

    #[test]
    fn test_memory_store_lookups() {
        let store = MemoryTransactionStore::new();
        let first = Transaction::record(&details_request(), DETAILS_BODY, Duration::ZERO).unwrap();
        let second = Transaction::record(&details_request(), FAILURE_BODY, Duration::ZERO).unwrap();

        assert_eq!(store.save(&first).unwrap(), first.id());
        store.save(&second).unwrap();

        assert_eq!(store.get(first.id()).unwrap(), Some(first.clone()));
        assert_eq!(
            store.get_by_correlation_id("3bea2076bb9c3").unwrap(),
            Some(second.clone())
        );
        assert_eq!(store.get_by_token("EC-9LW34435GU332960W").unwrap(), vec![first]);
        assert_eq!(store.all().unwrap().len(), 2);
        assert!(store.get_by_correlation_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_rejects_duplicate_save() {
        let store = MemoryTransactionStore::new();
        let txn = Transaction::record(&details_request(), DETAILS_BODY, Duration::ZERO).unwrap();
        store.save(&txn).unwrap();
        assert!(matches!(store.save(&txn), Err(PaymentError::Storage(_))));
    }

    #[test]
    fn test_memory_store_delete_all() {
        let store = MemoryTransactionStore::new();
        let txn = Transaction::record(&details_request(), DETAILS_BODY, Duration::ZERO).unwrap();
        store.save(&txn).unwrap();

        assert_eq!(store.delete_all().unwrap(), 1);
        assert!(store.all().unwrap().is_empty());
        store.save(&txn).unwrap();
    }
}
