//! NVP Codec
//!
//! PayPal's Name-Value Pair format is plain `application/x-www-form-urlencoded`
//! with uppercase keys. Encoding goes through `url::form_urlencoded`; decoding
//! is strict, because a corrupt acknowledgement must never be half-read.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::error::NvpError;

/// Decoded payload: key to values in order of appearance
pub type NvpMap = BTreeMap<String, Vec<String>>;

/// Ordered request payload
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NvpRequest {
    fields: Vec<(String, String)>,
}

impl NvpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for an API method
    pub fn method(name: &str) -> Self {
        Self::new().with("METHOD", name)
    }

    /// Builder-style `push`
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a field, replacing an existing value for the same key
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_ascii_uppercase();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Form-encode in insertion order
    pub fn encode(&self) -> String {
        encode(self.iter())
    }
}

/// Serialize name/value pairs, uppercasing keys
pub fn encode<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(&key.as_ref().to_ascii_uppercase(), value.as_ref());
    }
    serializer.finish()
}

/// Parse an ampersand-joined, percent-encoded body.
///
/// Every segment must carry a `=`; the first one splits key from value.
/// Repeated keys accumulate values in order.
pub fn decode(body: &str) -> Result<NvpMap, NvpError> {
    let mut map = NvpMap::new();
    let body = body.trim_end_matches(['\r', '\n']);
    if body.is_empty() {
        return Ok(map);
    }

    for (index, segment) in body.split('&').enumerate() {
        let (raw_key, raw_value) =
            segment
                .split_once('=')
                .ok_or_else(|| NvpError::MissingSeparator {
                    index,
                    segment: segment.to_string(),
                })?;

        let key = percent_decode(raw_key)?;
        if key.is_empty() {
            return Err(NvpError::EmptyKey { index });
        }
        let value = percent_decode(raw_value)?;

        map.entry(key).or_default().push(value);
    }

    Ok(map)
}

/// First value for a key
pub fn first<'a>(map: &'a NvpMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(|values| values.first()).map(String::as_str)
}

fn percent_decode(input: &str) -> Result<String, NvpError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|pair| std::str::from_utf8(pair).ok())
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| NvpError::InvalidEscape {
                        position: i,
                        input: input.to_string(),
                    })?;
                out.push(hex);
                i += 2;
            }
            byte => out.push(byte),
        }
        i += 1;
    }

    String::from_utf8(out).map_err(|_| NvpError::InvalidUtf8(input.to_string()))
}
