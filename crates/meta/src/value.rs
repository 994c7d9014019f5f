//! Metadata value codec.
//!
//! Values are strings at the transport layer. Structured values (objects,
//! arrays) and non-string scalars are stored as JSON; plain strings are
//! stored verbatim unless their text would itself parse as JSON, in which
//! case they are stored JSON-quoted so they decode back to a string.

use serde_json::Value;

/// Decode a stored value: JSON if it parses, otherwise the raw string.
pub fn decode(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Encode a value for storage. Inverse of [`decode`].
pub fn encode(value: &Value) -> String {
    match value {
        Value::String(s) if serde_json::from_str::<Value>(s).is_err() => s.clone(),
        other => other.to_string(),
    }
}
