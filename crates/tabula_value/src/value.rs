//! Dynamic record field value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A record's field map.
///
/// Keys are kept sorted so that iteration, encoding and comparison are
/// deterministic.
pub type Fields = BTreeMap<String, Value>;

/// A dynamic field value.
///
/// This is the closed set of shapes a record field can take. Numbers are
/// stored as `f64`; integral numbers stringify without a fractional part so
/// that `1` and `"1"` land in the same index bucket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value, also used for missing fields.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested field map.
    Map(Fields),
}

/// Largest magnitude that still prints as an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Value {
    /// Returns a short name for the kind of this value.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a number.
    ///
    /// Text that parses as a finite number is accepted too, which lets
    /// numeric clauses match values loaded from string-typed sources.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get this value as a field map, if it is one.
    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Follows a dot-separated path through nested maps.
    ///
    /// An empty path returns the value itself.
    pub fn path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Returns the canonical string form used for keys and index buckets.
    ///
    /// Integral numbers print without a fractional part, so the number `25`
    /// and the text `"25"` share a key string.
    pub fn key_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::List(_) | Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Canonical form used for index buckets and equality.
    ///
    /// Anything that reads as a finite number prints as that number, so
    /// `25`, `"25"` and `"25.0"` share a bucket. Other values use their key
    /// string.
    pub fn bucket_key(&self) -> String {
        match self.as_number() {
            Some(n) => format_number(n),
            None => self.key_string(),
        }
    }

    /// Total order used by the sort engine.
    ///
    /// Numeric values (including numeric text) sort before everything else
    /// and compare numerically among themselves; the rest compare their key
    /// strings lexicographically.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.key_string().cmp(&other.key_string()),
        }
    }

    /// Equality used by query clauses.
    ///
    /// Two values are equal when their bucket keys are, which keeps a full
    /// scan in agreement with an index lookup.
    pub fn loose_eq(&self, other: &Self) -> bool {
        self.bucket_key() == other.bucket_key()
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        #[allow(clippy::cast_possible_truncation)]
        let integral = n as i64;
        integral.to_string()
    } else {
        n.to_string()
    }
}

/// Builds a field map from key/value pairs.
///
/// ```
/// use tabula_value::{fields, Value};
///
/// let record = fields([("name", Value::from("Ada")), ("age", Value::from(36))]);
/// assert_eq!(record.get("age"), Some(&Value::Number(36.0)));
/// ```
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Fields> for Value {
    fn from(map: Fields) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}
