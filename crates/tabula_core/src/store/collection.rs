//! The state guarded by a store's lock.

use crate::error::StoreResult;
use crate::events::EventKind;
use crate::index::IndexManager;
use crate::types::{Record, RecordSnapshot, Target};
use crate::versions::VersionHistory;
use tabula_value::Fields;

/// Records, indexes and version history of one store.
///
/// Every method assumes the caller holds the store's lock, so a mutation
/// and its index maintenance happen as one critical section.
#[derive(Debug)]
pub(crate) struct Collection {
    /// Dense outside a batch; batch deletes leave `None` until reindex.
    pub(crate) records: Vec<Option<Record>>,
    pub(crate) indexes: IndexManager,
    pub(crate) versions: VersionHistory,
    pub(crate) revision: u64,
    tombstones: usize,
}

impl Collection {
    pub(crate) fn new(version_limit: usize) -> Self {
        Self {
            records: Vec::new(),
            indexes: IndexManager::new(),
            versions: VersionHistory::new(version_limit),
            revision: 0,
            tombstones: 0,
        }
    }

    /// Advances the revision and returns it.
    pub(crate) fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Number of live records.
    pub(crate) fn len(&self) -> usize {
        self.records.len() - self.tombstones
    }

    pub(crate) fn live(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().flatten()
    }

    pub(crate) fn record_at(&self, position: usize) -> Option<&Record> {
        self.records.get(position).and_then(Option::as_ref)
    }

    pub(crate) fn record(&self, key: &str) -> Option<&Record> {
        self.indexes
            .position_of(key)
            .and_then(|position| self.record_at(position))
    }

    /// Resolves a target to a live position.
    pub(crate) fn resolve(&self, target: &Target) -> Option<usize> {
        let live = |position: usize| self.record_at(position).map(|_| position);
        match target {
            Target::Key(key) => self.indexes.position_of(key),
            Target::Position(position) => live(*position),
            Target::Token(token) => self
                .indexes
                .position_of(token)
                .or_else(|| token.parse::<usize>().ok().and_then(live)),
        }
    }

    pub(crate) fn snapshot_live(&self) -> Vec<RecordSnapshot> {
        self.live().map(Record::snapshot).collect()
    }

    pub(crate) fn snapshot_positions(&self, positions: &[usize]) -> Vec<RecordSnapshot> {
        positions
            .iter()
            .filter_map(|&position| self.record_at(position))
            .map(Record::snapshot)
            .collect()
    }

    /// Declares an index and indexes every live record into it.
    pub(crate) fn declare_index<S: AsRef<str>>(&mut self, fields: &[S]) -> StoreResult<String> {
        let (signature, created) = self.indexes.declare_index(fields)?;
        if created {
            for record in self.records.iter_mut().flatten() {
                self.indexes.index_record(record);
            }
        }
        Ok(signature)
    }

    /// Creates or updates the record with `key`.
    ///
    /// Updates snapshot the previous fields first when `versioning` is on,
    /// then merge `data` into them (or replace them when `overwrite`).
    pub(crate) fn upsert(
        &mut self,
        key: &str,
        data: Fields,
        overwrite: bool,
        versioning: bool,
    ) -> (EventKind, RecordSnapshot) {
        let existing = self
            .indexes
            .position_of(key)
            .and_then(|position| self.records.get_mut(position))
            .and_then(Option::as_mut);

        if let Some(record) = existing {
            if versioning {
                self.versions.record(key, record.fields.clone());
            }
            self.indexes.remove_record(record);
            record.fields = merge_fields(std::mem::take(&mut record.fields), data, overwrite);
            self.indexes.index_record(record);
            return (EventKind::Updated, record.snapshot());
        }

        let mut record = Record::new(self.records.len(), key, data);
        self.indexes.insert_primary(key, record.position);
        self.indexes.index_record(&mut record);
        let snapshot = record.snapshot();
        self.records.push(Some(record));
        (EventKind::Created, snapshot)
    }

    /// Removes the record at `position` from the collection and every index.
    ///
    /// With `tombstone` the slot is left empty for a later reindex;
    /// otherwise it is removed and the caller must repair later positions.
    pub(crate) fn remove(&mut self, position: usize, tombstone: bool) -> Option<Record> {
        let mut record = if tombstone {
            let record = self.records.get_mut(position)?.take()?;
            self.tombstones += 1;
            record
        } else {
            self.record_at(position)?;
            self.records.remove(position)?
        };
        self.indexes.remove_record(&mut record);
        self.indexes.remove_primary(&record.key);
        self.versions.remove(&record.key);
        Some(record)
    }

    /// Shifts every record from `position` onwards to its current offset.
    pub(crate) fn compact_from(&mut self, position: usize) {
        for (offset, slot) in self.records.iter_mut().enumerate().skip(position) {
            if let Some(record) = slot {
                self.indexes.reposition(record, offset);
            }
        }
    }

    /// Rebuilds the dense collection and every index, then swaps them in.
    ///
    /// On error nothing has changed.
    pub(crate) fn reindex(&mut self) -> StoreResult<()> {
        let mut dense: Vec<Record> = self.live().cloned().collect();
        for (offset, record) in dense.iter_mut().enumerate() {
            record.position = offset;
            record.memberships.clear();
        }
        let fresh = self.indexes.rebuild(&mut dense)?;
        self.records = dense.into_iter().map(Some).collect();
        self.indexes = fresh;
        self.tombstones = 0;
        Ok(())
    }

    /// Drops every record, index entry and version. Declarations survive.
    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.indexes.clear();
        self.versions.clear();
        self.tombstones = 0;
    }

    pub(crate) fn check_consistency(&self) -> Vec<String> {
        self.indexes.check_consistency(&self.records)
    }
}

/// Merges `data` into `current`, or replaces it when `overwrite`.
pub(crate) fn merge_fields(mut current: Fields, data: Fields, overwrite: bool) -> Fields {
    if overwrite {
        return data;
    }
    current.extend(data);
    current
}
