//! JSON payload codec.
//!
//! A response is a JSON array of objects carrying the string keys `ip`,
//! `name` and `description`. Decoding is lenient per element: a missing key,
//! a non-string value or even a non-object element yields empty strings for
//! the affected fields instead of rejecting the response.

use hostview_core::Record;
use serde_json::Value;

use crate::MAX_RESPONSE_SIZE;
use crate::error::{DecodeError, DecodeResult, ProtocolError, ProtocolResult};

/// Decodes a complete response payload.
///
/// Records come back in array order.
///
/// # Example
///
/// ```rust
/// use hostview_protocol::decode;
///
/// let records = decode(br#"[{"ip":"1.2.3.4"}]"#).unwrap();
/// assert_eq!(records[0].ip, "1.2.3.4");
/// assert_eq!(records[0].name, "");
/// ```
pub fn decode(payload: &[u8]) -> DecodeResult<Vec<Record>> {
    let value: Value = serde_json::from_slice(payload)?;
    records_from_value(value)
}

/// Encodes records into a wire payload.
pub fn encode(records: &[Record]) -> ProtocolResult<Vec<u8>> {
    let json = serde_json::to_vec(records)?;
    if json.len() > MAX_RESPONSE_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: json.len(),
            max: MAX_RESPONSE_SIZE,
        });
    }
    Ok(json)
}

fn records_from_value(value: Value) -> DecodeResult<Vec<Record>> {
    match value {
        Value::Array(items) => Ok(items.iter().map(record_from_value).collect()),
        other => Err(DecodeError::NotAnArray {
            found: kind(&other),
        }),
    }
}

fn record_from_value(value: &Value) -> Record {
    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Record {
        ip: field("ip"),
        name: field("name"),
        description: field("description"),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
