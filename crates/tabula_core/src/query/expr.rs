//! Compiled query expressions.

use crate::query::clause::Predicate;
use tabula_value::{Fields, Value};

/// A compiled condition over a record's fields.
///
/// Built by [`Where::compile`](crate::Where::compile) and evaluated by
/// [`matches`](Self::matches). Expressions are `Send + Sync` and cheap to
/// clone, so a worker job can own one.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Field equals a value. Numeric values compare numerically against
    /// the field; everything else compares key strings.
    Eq(String, Value),
    /// Field satisfies a predicate.
    Predicate(String, Predicate),
    /// Every child matches.
    And(Vec<Expr>),
}

impl Expr {
    /// Evaluates the expression against `fields`.
    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Self::Eq(field, expected) => {
                expected.loose_eq(fields.get(field).unwrap_or(&Value::Null))
            }
            Self::Predicate(field, predicate) => {
                predicate.test(fields.get(field).unwrap_or(&Value::Null))
            }
            Self::And(children) => children.iter().all(|child| child.matches(fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::fields;

    #[test]
    fn equality_is_numeric_for_numbers() {
        let expr = Expr::Eq("age".into(), Value::from(25));
        assert!(expr.matches(&fields([("age", 25)])));
        assert!(expr.matches(&fields([("age", "25")])));
        assert!(expr.matches(&fields([("age", 25.0)])));
        assert!(!expr.matches(&fields([("age", 26)])));
        assert!(!expr.matches(&Fields::new()));
    }

    #[test]
    fn equality_on_text_uses_key_strings() {
        let expr = Expr::Eq("name".into(), Value::from("Ada"));
        assert!(expr.matches(&fields([("name", "Ada")])));
        assert!(!expr.matches(&fields([("name", "ada")])));
    }

    #[test]
    fn null_matches_missing_field() {
        let expr = Expr::Eq("nickname".into(), Value::Null);
        assert!(expr.matches(&fields([("name", "Ada")])));
    }

    #[test]
    fn predicate_sees_null_for_missing() {
        let expr = Expr::Predicate("age".into(), Predicate::new(Value::is_null));
        assert!(expr.matches(&Fields::new()));
        assert!(!expr.matches(&fields([("age", 1)])));
    }

    #[test]
    fn and_requires_all() {
        let expr = Expr::And(vec![
            Expr::Eq("age".into(), Value::from(25)),
            Expr::Predicate(
                "id".into(),
                Predicate::new(|v| v.as_number().is_some_and(|n| n > 2.0)),
            ),
        ]);
        assert!(expr.matches(&fields([("age", 25), ("id", 3)])));
        assert!(!expr.matches(&fields([("age", 25), ("id", 2)])));
    }
}
