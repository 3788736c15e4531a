//! JSON and CBOR conversions.
//!
//! JSON is the structural encoding used across the HTTP boundary; CBOR is
//! used for persisted store snapshots.

use crate::error::{ValueError, ValueResult};
use crate::value::{Fields, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        serde_json::Value::from(&value)
    }
}

/// Integral numbers go out as JSON integers; non-finite ones become `null`.
#[allow(clippy::cast_possible_truncation)]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// Converts a JSON object into a field map.
///
/// # Errors
///
/// Returns [`ValueError::ExpectedObject`] if `json` is not an object.
pub fn fields_from_json(json: serde_json::Value) -> ValueResult<Fields> {
    match Value::from(json) {
        Value::Map(map) => Ok(map),
        other => Err(ValueError::ExpectedObject {
            found: other.kind(),
        }),
    }
}

/// Converts a field map into a JSON object.
pub fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
            .collect(),
    )
}

/// Parses a JSON document into a value.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON.
pub fn from_json_str(text: &str) -> ValueResult<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| ValueError::decoding_failed(e.to_string()))
}

/// Encodes any serializable value as CBOR.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_cbor<T: Serialize>(value: &T) -> ValueResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| ValueError::encoding_failed(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a value previously written by [`to_cbor`].
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR for `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> ValueResult<T> {
    ciborium::from_reader(bytes).map_err(|e| ValueError::decoding_failed(e.to_string()))
}
