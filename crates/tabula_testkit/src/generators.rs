//! Property-based test generators using proptest.
//!
//! Field names and values are drawn from small domains so that generated
//! records collide in index buckets and sort ties.

use proptest::prelude::*;
use tabula_value::{Fields, Value};

/// Field names used by generated records.
pub const FIELDS: [&str; 3] = ["a", "b", "c"];

/// Strategy for scalar values, biased towards small integers.
///
/// Text includes the bucket separator, backslashes and numeric strings.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => (0i64..4).prop_map(Value::from),
        1 => Just(Value::Null),
        1 => any::<bool>().prop_map(Value::from),
        1 => prop::string::string_regex(r"[xy|\\]{1,3}")
            .expect("Invalid regex")
            .prop_map(Value::from),
        1 => prop::sample::select(vec!["1.0", " 2", "3"]).prop_map(Value::from),
    ]
}

/// Strategy for records over [`FIELDS`]; any field may be missing.
pub fn fields_strategy() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map(
        prop::sample::select(FIELDS.to_vec()).prop_map(str::to_string),
        scalar_strategy(),
        0..=FIELDS.len(),
    )
}

/// A store mutation for random operation sequences.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Set `fields` under key `key`, merging unless `overwrite`.
    Set {
        /// Record key.
        key: u8,
        /// New fields.
        fields: Fields,
        /// Replace instead of merge.
        overwrite: bool,
    },
    /// Delete key `key`, with a full reindex when `reindex`.
    Del {
        /// Record key.
        key: u8,
        /// Reindex instead of compacting.
        reindex: bool,
    },
    /// Delete key `key` in batch mode, leaving a tombstone.
    BatchDel {
        /// Record key.
        key: u8,
    },
    /// Full reindex.
    Reindex,
}

/// Strategy for a single store operation over keys `0..8`.
pub fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        6 => (0u8..8, fields_strategy(), any::<bool>())
            .prop_map(|(key, fields, overwrite)| StoreOp::Set { key, fields, overwrite }),
        2 => (0u8..8, any::<bool>()).prop_map(|(key, reindex)| StoreOp::Del { key, reindex }),
        1 => (0u8..8).prop_map(|key| StoreOp::BatchDel { key }),
        1 => Just(StoreOp::Reindex),
    ]
}

/// Strategy for sequences of store operations.
pub fn store_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    prop::collection::vec(store_op_strategy(), 0..max_len)
}

/// Strategy for `(a, b)` pairs with many ties, for sort properties.
pub fn pairs_strategy(max_len: usize) -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..3, 0i64..3), 0..max_len)
}
