//! Request Redaction
//!
//! Stored audit copies of outbound payloads must never carry credentials.
//! Redaction works on the encoded string so that field order and every other
//! byte of the payload survive untouched.

/// Fields whose values are replaced before a request is stored
pub const SENSITIVE_FIELDS: &[&str] = &["PWD"];

/// Replacement value for redacted fields
pub const REDACTION_MARKER: &str = "XXXXXX";

/// Redact [`SENSITIVE_FIELDS`] from an encoded payload.
///
/// Only the values of those fields are replaced. A secret that also appears
/// inside another field (say, a password that is a substring of `USER`) is
/// left as-is.
pub fn redact(payload: &str) -> String {
    redact_fields(payload, SENSITIVE_FIELDS)
}

/// Redact the given fields (ASCII case-insensitive) from an encoded payload.
///
/// Segments without `=` are copied through unchanged.
pub fn redact_fields(payload: &str, fields: &[&str]) -> String {
    payload
        .split('&')
        .map(|segment| match segment.split_once('=') {
            Some((key, _)) if fields.iter().any(|f| f.eq_ignore_ascii_case(key)) => {
                format!("{key}={REDACTION_MARKER}")
            }
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}
