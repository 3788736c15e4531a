//! Where clauses.

use crate::error::{StoreError, StoreResult};
use crate::index::{push_component, signature_of, SEPARATOR};
use crate::query::expr::Expr;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tabula_value::Value;

/// A caller-supplied test applied to one field value.
///
/// Receives `Null` when the record lacks the field.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    /// Wraps a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// Applies the test.
    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Condition on a single field.
#[derive(Debug, Clone)]
pub enum Clause {
    /// Field equals the value.
    Eq(Value),
    /// Field satisfies the predicate.
    Predicate(Predicate),
}

/// A conjunction of per-field clauses.
///
/// Fields are kept in ascending order, so the signature of a where clause
/// lines up with the canonical signature of a declared index.
///
/// # Example
///
/// ```
/// use tabula_core::Where;
///
/// let query = Where::new()
///     .eq("age", 25)
///     .matches("name", |v| v.as_text().is_some_and(|s| s.starts_with('A')));
///
/// assert_eq!(query.signature(), "age|name");
/// assert!(query.has_predicates());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Where {
    clauses: BTreeMap<String, Clause>,
}

impl Where {
    /// Creates an empty where clause.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.insert(field.into(), Clause::Eq(value.into()));
        self
    }

    /// Requires `field` to satisfy `test`.
    #[must_use]
    pub fn matches<F>(mut self, field: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.clauses
            .insert(field.into(), Clause::Predicate(Predicate::new(test)));
        self
    }

    /// Builds an equality-only where clause from a JSON object.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` if `json` is not an object or is empty.
    pub fn from_json(json: &serde_json::Value) -> StoreResult<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(StoreError::invalid_arguments(
                "where clause must be a JSON object",
            ));
        };
        let query = map
            .iter()
            .fold(Self::new(), |query, (field, value)| {
                query.eq(field.clone(), Value::from(value.clone()))
            });
        query.validate()?;
        Ok(query)
    }

    /// Checks that the clause can be planned.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` for an empty clause or an empty field name.
    pub fn validate(&self) -> StoreResult<()> {
        if self.clauses.is_empty() {
            return Err(StoreError::invalid_arguments("where clause is empty"));
        }
        if self.clauses.keys().any(String::is_empty) {
            return Err(StoreError::invalid_arguments(
                "where clause has an empty field name",
            ));
        }
        Ok(())
    }

    /// Field names joined by `|`.
    pub fn signature(&self) -> String {
        let fields: Vec<&str> = self.clauses.keys().map(String::as_str).collect();
        signature_of(&fields)
    }

    /// Bucket keys of the equality values in signature order, escaped and
    /// joined by `|`. Predicate clauses contribute nothing.
    pub fn bucket_value(&self) -> String {
        let mut bucket = String::new();
        for (i, clause) in self.clauses.values().enumerate() {
            if i > 0 {
                bucket.push(SEPARATOR);
            }
            if let Clause::Eq(value) = clause {
                push_component(&mut bucket, &value.bucket_key());
            }
        }
        bucket
    }

    /// Returns true if any clause is a predicate.
    pub fn has_predicates(&self) -> bool {
        self.clauses
            .values()
            .any(|clause| matches!(clause, Clause::Predicate(_)))
    }

    /// Stable key for caching results, or `None` when predicates make the
    /// clause opaque.
    pub fn cache_key(&self) -> Option<String> {
        if self.has_predicates() {
            return None;
        }
        let object: serde_json::Map<String, serde_json::Value> = self
            .clauses
            .iter()
            .filter_map(|(field, clause)| match clause {
                Clause::Eq(value) => Some((field.clone(), serde_json::Value::from(value))),
                Clause::Predicate(_) => None,
            })
            .collect();
        Some(serde_json::Value::Object(object).to_string())
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true if there are no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterates clauses in field order.
    pub fn clauses(&self) -> impl Iterator<Item = (&str, &Clause)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Compiles into an expression tree.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn compile(&self) -> StoreResult<Expr> {
        self.validate()?;
        let mut leaves: Vec<Expr> = self
            .clauses
            .iter()
            .map(|(field, clause)| match clause {
                Clause::Eq(value) => Expr::Eq(field.clone(), value.clone()),
                Clause::Predicate(test) => Expr::Predicate(field.clone(), test.clone()),
            })
            .collect();
        if leaves.len() == 1 {
            return Ok(leaves.remove(0));
        }
        Ok(Expr::And(leaves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_is_sorted() {
        let query = Where::new().eq("name", "Ada").eq("age", 36);
        assert_eq!(query.signature(), "age|name");
        assert_eq!(query.bucket_value(), "36|Ada");
        assert!(!query.has_predicates());
    }

    #[test]
    fn from_json_object() {
        let query = Where::from_json(&json!({"age": 25})).unwrap();
        assert_eq!(query.signature(), "age");
        assert_eq!(query.bucket_value(), "25");
    }

    #[test]
    fn bucket_value_escapes_separator() {
        let query = Where::new().eq("a", "x").eq("b", "y|z");
        assert_eq!(query.bucket_value(), r"x|y\|z");
        assert_eq!(Where::new().eq("age", "25.0").bucket_value(), "25");
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(matches!(
            Where::from_json(&json!([1, 2])),
            Err(StoreError::InvalidArguments { .. })
        ));
        assert!(matches!(
            Where::from_json(&json!({})),
            Err(StoreError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn cache_key_requires_equality_only() {
        let plain = Where::new().eq("age", 25);
        assert_eq!(plain.cache_key().as_deref(), Some(r#"{"age":25}"#));

        let opaque = plain.matches("name", |_| true);
        assert!(opaque.cache_key().is_none());
    }

    #[test]
    fn compile_single_clause_is_a_leaf() {
        let expr = Where::new().eq("age", 25).compile().unwrap();
        assert!(matches!(expr, Expr::Eq(ref field, _) if field == "age"));

        let expr = Where::new().eq("age", 25).eq("id", 2).compile().unwrap();
        assert!(matches!(expr, Expr::And(ref parts) if parts.len() == 2));
    }

    #[test]
    fn compile_rejects_empty() {
        assert!(Where::new().compile().is_err());
        assert!(Where::new().eq("", 1).compile().is_err());
    }
}
