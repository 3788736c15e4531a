//! Primary and secondary index maintenance.

use crate::error::{StoreError, StoreResult};
use crate::index::secondary::{signature_of, SecondaryIndex, SEPARATOR};
use crate::types::Record;
use std::collections::{BTreeMap, HashMap};

/// Owns the primary index and every declared secondary index.
///
/// The manager never owns records. It refers to them by position, and the
/// store keeps both sides consistent under its write lock:
///
/// - `primary[record.key] == record.position` for every live record
/// - for every declared signature `S`, `record.position` is in
///   `secondary[S][bucket_value(record, S)]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexManager {
    primary: HashMap<String, usize>,
    secondary: BTreeMap<String, SecondaryIndex>,
}

impl IndexManager {
    /// Creates a manager with no secondary indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts and deduplicates a field list.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` for an empty list, an empty field name, or a name
    /// containing the `|` separator.
    pub fn canonical_fields<S: AsRef<str>>(fields: &[S]) -> StoreResult<Vec<String>> {
        if fields.is_empty() {
            return Err(StoreError::invalid_arguments("index needs at least one field"));
        }
        let mut canonical = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            if field.is_empty() {
                return Err(StoreError::invalid_arguments("index field name is empty"));
            }
            if field.contains(SEPARATOR) {
                return Err(StoreError::invalid_arguments(format!(
                    "index field {field:?} contains {SEPARATOR:?}"
                )));
            }
            canonical.push(field.to_string());
        }
        canonical.sort();
        canonical.dedup();
        Ok(canonical)
    }

    /// Declares a secondary index and returns its signature.
    ///
    /// The second element is false when the signature already existed, in
    /// which case nothing changes.
    ///
    /// # Errors
    ///
    /// See [`canonical_fields`](Self::canonical_fields).
    pub fn declare_index<S: AsRef<str>>(&mut self, fields: &[S]) -> StoreResult<(String, bool)> {
        let canonical = Self::canonical_fields(fields)?;
        let signature = signature_of(&canonical);
        if self.secondary.contains_key(&signature) {
            return Ok((signature, false));
        }
        tracing::debug!(signature = %signature, "index declared");
        self.secondary
            .insert(signature.clone(), SecondaryIndex::new(canonical));
        Ok((signature, true))
    }

    /// Adds `record` to every secondary index and records its memberships.
    ///
    /// Idempotent for an unchanged record.
    pub fn index_record(&mut self, record: &mut Record) {
        record.memberships.clear();
        for (signature, index) in &mut self.secondary {
            let bucket = index.bucket_value(&record.fields);
            index.insert(&bucket, record.position);
            tracing::trace!(signature = %signature, bucket = %bucket, position = record.position, "indexed");
            record.memberships.push((signature.clone(), bucket));
        }
    }

    /// Removes `record` from every bucket it belongs to.
    pub fn remove_record(&mut self, record: &mut Record) {
        for (signature, bucket) in record.memberships.drain(..) {
            if let Some(index) = self.secondary.get_mut(&signature) {
                index.remove(&bucket, record.position);
                tracing::trace!(signature = %signature, bucket = %bucket, position = record.position, "unindexed");
            }
        }
    }

    /// Moves `record` to `position`, repairing the primary entry and each
    /// of its bucket entries.
    pub fn reposition(&mut self, record: &mut Record, position: usize) {
        let from = record.position;
        if from == position {
            return;
        }
        for (signature, bucket) in &record.memberships {
            if let Some(index) = self.secondary.get_mut(signature) {
                index.reposition(bucket, from, position);
            }
        }
        self.primary.insert(record.key.clone(), position);
        record.position = position;
    }

    /// Positions in a bucket of the index with `signature`.
    pub fn lookup(&self, signature: &str, bucket: &str) -> Vec<usize> {
        self.secondary
            .get(signature)
            .map(|index| index.lookup(bucket).to_vec())
            .unwrap_or_default()
    }

    /// Maps `key` to `position`.
    pub fn insert_primary(&mut self, key: impl Into<String>, position: usize) {
        self.primary.insert(key.into(), position);
    }

    /// Removes `key` from the primary index.
    pub fn remove_primary(&mut self, key: &str) -> Option<usize> {
        self.primary.remove(key)
    }

    /// Position of the record with `key`.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.primary.get(key).copied()
    }

    /// Number of keys in the primary index.
    pub fn primary_len(&self) -> usize {
        self.primary.len()
    }

    /// Returns true if a secondary index has this signature.
    pub fn has_index(&self, signature: &str) -> bool {
        self.secondary.contains_key(signature)
    }

    /// Declared signatures in ascending order.
    pub fn signatures(&self) -> Vec<String> {
        self.secondary.keys().cloned().collect()
    }

    /// The index with `signature`.
    pub fn index(&self, signature: &str) -> Option<&SecondaryIndex> {
        self.secondary.get(signature)
    }

    /// Drops every entry but keeps declarations.
    pub fn clear(&mut self) {
        self.primary.clear();
        for index in self.secondary.values_mut() {
            index.clear();
        }
    }

    /// Builds a fresh manager with the same declarations from a dense
    /// collection, refreshing each record's memberships.
    ///
    /// `self` is left untouched so the caller can swap the result in only
    /// on success.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` if two records share a key or a record's position
    /// disagrees with its offset.
    pub fn rebuild(&self, records: &mut [Record]) -> StoreResult<Self> {
        let mut fresh = Self {
            primary: HashMap::with_capacity(records.len()),
            secondary: self
                .secondary
                .iter()
                .map(|(signature, index)| (signature.clone(), index.empty_like()))
                .collect(),
        };

        for (offset, record) in records.iter_mut().enumerate() {
            if record.position != offset {
                return Err(StoreError::invalid_arguments(format!(
                    "record {:?} at offset {offset} claims position {}",
                    record.key, record.position
                )));
            }
            if fresh.primary.insert(record.key.clone(), offset).is_some() {
                return Err(StoreError::invalid_arguments(format!(
                    "duplicate record key {:?}",
                    record.key
                )));
            }
            fresh.index_record(record);
        }
        Ok(fresh)
    }

    /// Lists every violation of the index invariants against `records`.
    ///
    /// An empty result means the indexes are consistent.
    pub fn check_consistency(&self, records: &[Option<Record>]) -> Vec<String> {
        let mut problems = Vec::new();
        let mut live = 0;
        let mut memberships = 0;

        for (offset, slot) in records.iter().enumerate() {
            let Some(record) = slot else {
                continue;
            };
            live += 1;
            if record.position != offset {
                problems.push(format!(
                    "record {:?} at offset {offset} has position {}",
                    record.key, record.position
                ));
            }
            if self.position_of(&record.key) != Some(record.position) {
                problems.push(format!(
                    "primary index maps {:?} to {:?}, expected {}",
                    record.key,
                    self.position_of(&record.key),
                    record.position
                ));
            }
            for (signature, index) in &self.secondary {
                let bucket = index.bucket_value(&record.fields);
                if !index.contains(&bucket, record.position) {
                    problems.push(format!(
                        "index {signature:?} bucket {bucket:?} is missing position {}",
                        record.position
                    ));
                }
                memberships += 1;
            }
        }

        if self.primary.len() != live {
            problems.push(format!(
                "primary index holds {} keys for {live} records",
                self.primary.len()
            ));
        }
        let entries: usize = self.secondary.values().map(SecondaryIndex::len).sum();
        if entries != memberships {
            problems.push(format!(
                "secondary indexes hold {entries} positions, expected {memberships}"
            ));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::fields;

    fn people() -> Vec<Record> {
        vec![
            Record::new(0, "1", fields([("id", 1), ("age", 30)])),
            Record::new(1, "2", fields([("id", 2), ("age", 25)])),
            Record::new(2, "3", fields([("id", 3), ("age", 25)])),
        ]
    }

    fn indexed(records: &mut [Record]) -> IndexManager {
        let mut manager = IndexManager::new();
        manager.declare_index(&["age"]).unwrap();
        for record in records.iter_mut() {
            manager.insert_primary(record.key.clone(), record.position);
            manager.index_record(record);
        }
        manager
    }

    #[test]
    fn declare_canonicalises() {
        let mut manager = IndexManager::new();
        let (signature, created) = manager.declare_index(&["name", "age", "name"]).unwrap();
        assert_eq!(signature, "age|name");
        assert!(created);

        let (again, created) = manager.declare_index(&["age", "name"]).unwrap();
        assert_eq!(again, signature);
        assert!(!created);
        assert_eq!(manager.signatures(), vec!["age|name".to_string()]);
    }

    #[test]
    fn declare_rejects_bad_fields() {
        let mut manager = IndexManager::new();
        let empty: [&str; 0] = [];
        assert!(manager.declare_index(&empty).is_err());
        assert!(manager.declare_index(&[""]).is_err());
        assert!(manager.declare_index(&["a|b"]).is_err());
    }

    #[test]
    fn index_and_lookup() {
        let mut records = people();
        let manager = indexed(&mut records);

        assert_eq!(manager.lookup("age", "25"), vec![1, 2]);
        assert_eq!(manager.lookup("age", "30"), vec![0]);
        assert!(manager.lookup("age", "99").is_empty());
        assert!(manager.lookup("missing", "25").is_empty());
        assert_eq!(records[1].memberships, vec![("age".to_string(), "25".to_string())]);
    }

    #[test]
    fn index_record_is_idempotent() {
        let mut records = people();
        let mut manager = indexed(&mut records);
        manager.index_record(&mut records[1]);
        assert_eq!(manager.lookup("age", "25"), vec![1, 2]);
        assert_eq!(records[1].memberships.len(), 1);
    }

    #[test]
    fn remove_record_clears_memberships() {
        let mut records = people();
        let mut manager = indexed(&mut records);
        manager.remove_record(&mut records[0]);

        assert!(records[0].memberships.is_empty());
        assert!(manager.lookup("age", "30").is_empty());
        assert_eq!(manager.index("age").unwrap().bucket_count(), 1);
    }

    #[test]
    fn rebuild_matches_incremental() {
        let mut records = people();
        let manager = indexed(&mut records);

        let mut copy = people();
        let rebuilt = manager.rebuild(&mut copy).unwrap();
        assert_eq!(rebuilt, manager);
        assert_eq!(copy, records);
    }

    #[test]
    fn rebuild_rejects_duplicate_keys() {
        let mut records = vec![
            Record::new(0, "a", fields([("age", 1)])),
            Record::new(1, "a", fields([("age", 2)])),
        ];
        let manager = IndexManager::new();
        assert!(manager.rebuild(&mut records).is_err());
    }

    #[test]
    fn consistency_check() {
        let mut records = people();
        let mut manager = indexed(&mut records);
        let slots: Vec<Option<Record>> = records.iter().cloned().map(Some).collect();
        assert!(manager.check_consistency(&slots).is_empty());

        manager.remove_primary("2");
        assert!(!manager.check_consistency(&slots).is_empty());
    }

    #[test]
    fn reposition_moves_entries() {
        let mut records = people();
        let mut manager = indexed(&mut records);

        let mut removed = records.remove(0);
        manager.remove_record(&mut removed);
        manager.remove_primary(&removed.key);
        for (offset, record) in records.iter_mut().enumerate() {
            manager.reposition(record, offset);
        }

        let slots: Vec<Option<Record>> = records.iter().cloned().map(Some).collect();
        assert!(manager.check_consistency(&slots).is_empty());
        assert_eq!(manager.lookup("age", "25"), vec![0, 1]);
        assert_eq!(manager.position_of("3"), Some(1));
    }
}
