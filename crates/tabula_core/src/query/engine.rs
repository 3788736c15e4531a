//! Query planning and evaluation.

use crate::index::IndexManager;
use crate::query::clause::Where;
use crate::query::expr::Expr;
use crate::types::RecordSnapshot;

/// How a where clause will be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// Read one bucket of a declared index.
    IndexLookup {
        /// Index signature.
        signature: String,
        /// Bucket value.
        bucket: String,
    },
    /// Test every record.
    FullScan,
}

impl QueryPlan {
    /// Chooses a plan.
    ///
    /// The index fast path applies when the clause has no predicates and
    /// its sorted field list equals a declared signature.
    pub fn choose(query: &Where, indexes: &IndexManager) -> Self {
        if query.has_predicates() {
            return Self::FullScan;
        }
        let signature = query.signature();
        if !indexes.has_index(&signature) {
            return Self::FullScan;
        }
        Self::IndexLookup {
            signature,
            bucket: query.bucket_value(),
        }
    }

    /// Returns true for the index fast path.
    pub fn is_index_lookup(&self) -> bool {
        matches!(self, Self::IndexLookup { .. })
    }
}

/// Copies the records matching `expr`, in position order.
///
/// Pure function of its inputs so it can run on a worker.
pub fn scan(records: &[RecordSnapshot], expr: &Expr) -> Vec<RecordSnapshot> {
    records
        .iter()
        .filter(|record| expr.matches(&record.fields))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::fields;

    fn snapshots() -> Vec<RecordSnapshot> {
        [(1, 30), (2, 25), (3, 25)]
            .into_iter()
            .enumerate()
            .map(|(position, (id, age))| RecordSnapshot {
                key: id.to_string(),
                position,
                fields: fields([("id", id), ("age", age)]),
            })
            .collect()
    }

    #[test]
    fn plan_uses_declared_index() {
        let mut indexes = IndexManager::new();
        indexes.declare_index(&["age"]).unwrap();

        let plan = QueryPlan::choose(&Where::new().eq("age", 25), &indexes);
        assert_eq!(
            plan,
            QueryPlan::IndexLookup {
                signature: "age".into(),
                bucket: "25".into()
            }
        );
    }

    #[test]
    fn plan_scans_without_matching_index() {
        let mut indexes = IndexManager::new();
        indexes.declare_index(&["age"]).unwrap();

        let plan = QueryPlan::choose(&Where::new().eq("age", 25).eq("id", 2), &indexes);
        assert_eq!(plan, QueryPlan::FullScan);
    }

    #[test]
    fn plan_scans_with_predicates() {
        let mut indexes = IndexManager::new();
        indexes.declare_index(&["age"]).unwrap();

        let query = Where::new().matches("age", |v| v.as_number() == Some(25.0));
        assert!(!QueryPlan::choose(&query, &indexes).is_index_lookup());
    }

    #[test]
    fn composite_plan_matches_any_declaration_order() {
        let mut indexes = IndexManager::new();
        indexes.declare_index(&["name", "age"]).unwrap();

        let plan = QueryPlan::choose(&Where::new().eq("name", "Ada").eq("age", 36), &indexes);
        assert!(plan.is_index_lookup());
    }

    #[test]
    fn scan_keeps_position_order() {
        let expr = Where::new().eq("age", 25).compile().unwrap();
        let found = scan(&snapshots(), &expr);
        let keys: Vec<&str> = found.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2", "3"]);
    }
}
