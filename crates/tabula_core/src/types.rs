//! Record and selector types.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tabula_value::{Fields, Value};

/// A live record owned by the store.
///
/// `position` is the record's offset in the dense collection and is only
/// rewritten by compaction. `key` never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Offset in the collection.
    pub position: usize,
    /// Unique record key.
    pub key: String,
    /// Field data.
    pub fields: Fields,
    /// `(signature, bucket_value)` for every secondary index holding this
    /// record.
    pub memberships: Vec<(String, String)>,
}

impl Record {
    /// Creates a record with no index memberships.
    pub fn new(position: usize, key: impl Into<String>, fields: Fields) -> Self {
        Self {
            position,
            key: key.into(),
            fields,
            memberships: Vec::new(),
        }
    }

    /// Returns the value of `field`, or `Null` when absent.
    pub fn field(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Deep copy handed to callers and workers.
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            key: self.key.clone(),
            position: self.position,
            fields: self.fields.clone(),
        }
    }
}

/// An independently owned copy of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Record key.
    pub key: String,
    /// Position at the time the snapshot was taken.
    pub position: usize,
    /// Field data.
    pub fields: Fields,
}

impl RecordSnapshot {
    /// Returns the value of `field`, or `Null` when absent.
    pub fn field(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }
}

/// Addresses a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// By record key.
    Key(String),
    /// By collection position.
    Position(usize),
    /// Resolved as a key first, then as a position if the token is numeric.
    Token(String),
}

impl Target {
    /// Human-readable form used in errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Key(key) | Self::Token(key) => key.clone(),
            Self::Position(position) => format!("#{position}"),
        }
    }
}

impl From<&str> for Target {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Target {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Target {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

/// Selects records for [`get`](crate::RecordStore::get).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every live record in position order.
    All,
    /// One record by key.
    Key(String),
    /// One record by position.
    Position(usize),
    /// Several records, in the order given.
    List(Vec<Target>),
    /// A page of `count` records starting at `start`, clamped to the
    /// collection.
    Range {
        /// First position.
        start: usize,
        /// Maximum number of records.
        count: usize,
    },
}

impl Selector {
    /// Parses `"all"` or a comma-delimited list of keys and positions.
    ///
    /// Each token is resolved as a key first, then as a position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for an empty selector or an empty token.
    pub fn parse(text: &str) -> StoreResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::invalid_arguments("empty selector"));
        }
        if text.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let mut targets = Vec::new();
        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(StoreError::invalid_arguments(format!(
                    "empty token in selector {text:?}"
                )));
            }
            targets.push(Target::Token(token.to_string()));
        }
        Ok(Self::List(targets))
    }
}

/// Options for [`set`](crate::RecordStore::set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Part of a batch: skip remote reconciliation, revision bump and
    /// events.
    pub batch: bool,
    /// Replace the record's fields instead of merging into them.
    pub overwrite: bool,
}

impl SetOptions {
    /// Default options: merge, not batched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces instead of merging.
    #[must_use]
    pub const fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Marks the call as part of a batch.
    #[must_use]
    pub const fn batch(mut self) -> Self {
        self.batch = true;
        self
    }
}

/// Options for [`del`](crate::RecordStore::del).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelOptions {
    /// Run a full reindex after removal instead of incremental compaction.
    pub reindex: bool,
    /// Part of a batch: leave a tombstone for the batch's single reindex.
    pub batch: bool,
}

impl DelOptions {
    /// Default options: incremental compaction, not batched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a full reindex.
    #[must_use]
    pub const fn reindex(mut self) -> Self {
        self.reindex = true;
        self
    }

    /// Marks the call as part of a batch.
    #[must_use]
    pub const fn batch(mut self) -> Self {
        self.batch = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::fields;

    #[test]
    fn parse_all() {
        assert_eq!(Selector::parse("all").unwrap(), Selector::All);
        assert_eq!(Selector::parse(" ALL ").unwrap(), Selector::All);
    }

    #[test]
    fn parse_list() {
        let selector = Selector::parse("a, b,3").unwrap();
        assert_eq!(
            selector,
            Selector::List(vec![
                Target::Token("a".into()),
                Target::Token("b".into()),
                Target::Token("3".into()),
            ])
        );
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            Selector::parse("  "),
            Err(StoreError::InvalidArguments { .. })
        ));
        assert!(matches!(
            Selector::parse("a,,b"),
            Err(StoreError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn missing_field_reads_as_null() {
        let record = Record::new(0, "k", fields([("age", 25)]));
        assert_eq!(record.field("age"), &Value::from(25));
        assert!(record.field("name").is_null());

        let snap = record.snapshot();
        assert_eq!(snap.key, "k");
        assert_eq!(snap.fields, record.fields);
    }

    #[test]
    fn option_builders() {
        let set = SetOptions::new().overwrite();
        assert!(set.overwrite && !set.batch);

        let del = DelOptions::new().reindex().batch();
        assert!(del.reindex && del.batch);
    }
}
