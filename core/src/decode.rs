//! Response body decoding by content type.

use serde_json::Value;

use crate::error::Error;

/// Decode a raw response body.
///
/// An empty body is `Null` whatever the declared type. A content type
/// mentioning `json` is parsed as JSON; anything else is returned as text.
pub fn decode(content_type: Option<&str>, raw: &[u8]) -> Result<Value, Error> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    if content_type.is_some_and(is_json) {
        return serde_json::from_slice(raw).map_err(Error::Parse);
    }
    Ok(Value::String(String::from_utf8_lossy(raw).into_owned()))
}

fn is_json(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("json")
}
