//! Saving and restoring store contents through a storage backend.

use crate::error::StoreResult;
use crate::events::{EventKind, StoreEvent};
use crate::store::collection::Collection;
use crate::store::record_store::RecordStore;
use crate::types::RecordSnapshot;
use serde::{Deserialize, Serialize};
use tabula_storage::StorageBackend;
use tabula_value::{from_cbor, to_cbor};

/// The persisted form of a store.
///
/// Version history and cached views are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Store name at save time.
    pub name: String,
    /// Primary-key field, if configured.
    pub key: Option<String>,
    /// Declared index field lists.
    pub indexes: Vec<Vec<String>>,
    /// Live records in position order.
    pub records: Vec<RecordSnapshot>,
}

impl RecordStore {
    /// Captures the store's records and index declarations.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.read();
        StoreSnapshot {
            name: self.name().to_string(),
            key: self.inner.config.key.clone(),
            indexes: state
                .indexes
                .signatures()
                .iter()
                .filter_map(|signature| state.indexes.index(signature))
                .map(|index| index.fields().to_vec())
                .collect(),
            records: state.snapshot_live(),
        }
    }

    /// Saves the store under its name.
    ///
    /// # Errors
    ///
    /// Encoding or storage errors.
    pub fn save(&self, backend: &dyn StorageBackend) -> StoreResult<()> {
        self.save_as(backend, self.name())
    }

    /// Saves the store under `target`.
    ///
    /// # Errors
    ///
    /// Encoding or storage errors.
    pub fn save_as(&self, backend: &dyn StorageBackend, target: &str) -> StoreResult<()> {
        let snapshot = self.snapshot();
        let bytes = to_cbor(&snapshot)?;
        backend.put(target, &bytes)?;
        tracing::debug!(
            snapshot = target,
            records = snapshot.records.len(),
            bytes = bytes.len(),
            "store saved"
        );
        Ok(())
    }

    /// Replaces the store's contents with the snapshot saved under its name.
    ///
    /// Returns false, leaving the store untouched, when nothing was saved.
    ///
    /// # Errors
    ///
    /// Decoding, storage or index declaration errors, or `Poisoned`.
    pub fn restore(&self, backend: &dyn StorageBackend) -> StoreResult<bool> {
        let result = self.restore_inner(backend);
        self.track(result)
    }

    fn restore_inner(&self, backend: &dyn StorageBackend) -> StoreResult<bool> {
        self.ensure_usable()?;
        let Some(bytes) = backend.get(self.name())? else {
            return Ok(false);
        };
        let snapshot: StoreSnapshot = from_cbor(&bytes)?;

        let mut restored = Collection::new(self.inner.config.version_limit);
        for fields in self.inner.config.indexes.iter().chain(&snapshot.indexes) {
            restored.declare_index(fields)?;
        }
        let mut records = snapshot.records;
        records.sort_by_key(|record| record.position);
        for record in records {
            restored.upsert(&record.key, record.fields, true, false);
        }

        let revision = {
            let mut state = self.inner.state.write();
            restored.revision = state.revision;
            *state = restored;
            let revision = state.bump();
            self.inner
                .events
                .emit(StoreEvent::store(revision, EventKind::Batch));
            revision
        };
        self.inner.views.lock().clear();
        tracing::debug!(name = %self.name(), revision, records = self.len(), "store restored");
        Ok(true)
    }

    /// Deletes the snapshot saved under the store's name.
    ///
    /// Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub fn purge(&self, backend: &dyn StorageBackend) -> StoreResult<bool> {
        let removed = backend.remove(self.name())?;
        tracing::debug!(name = %self.name(), removed, "saved store purged");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::query::Where;
    use crate::types::SetOptions;
    use tabula_storage::{FileBackend, InMemoryBackend};
    use tabula_value::{fields, Value};

    fn config() -> StoreConfig {
        StoreConfig::new().name("people").key("id").use_workers(false)
    }

    async fn filled() -> RecordStore {
        let store = RecordStore::new(config()).unwrap();
        store.declare_index(&["age"]).unwrap();
        for (id, age) in [(1, 30), (2, 25)] {
            store
                .set(None, fields([("id", id), ("age", age)]), SetOptions::new())
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn save_and_restore_in_memory() {
        let backend = InMemoryBackend::new();
        filled().await.save(&backend).unwrap();

        let store = RecordStore::new(config()).unwrap();
        assert!(store.restore(&backend).unwrap());
        assert_eq!(store.keys(), vec!["1", "2"]);
        assert_eq!(store.indexes(), vec!["age".to_string()]);
        assert!(store.verify().is_empty());

        let found = store.select(&Where::new().eq("age", 25)).await.unwrap();
        assert_eq!(found[0].fields.get("id"), Some(&Value::from(2)));
        assert_eq!(store.stats().index_lookups, 1);
    }

    #[tokio::test]
    async fn restore_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        filled().await.save(&backend).unwrap();

        let store = RecordStore::new(config()).unwrap();
        assert!(store.restore(&backend).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn restore_without_snapshot() {
        let store = RecordStore::new(config()).unwrap();
        assert!(!store.restore(&InMemoryBackend::new()).unwrap());
    }

    #[tokio::test]
    async fn purge_removes_snapshot() {
        let backend = InMemoryBackend::new();
        let store = filled().await;
        store.save(&backend).unwrap();

        assert!(store.purge(&backend).unwrap());
        assert!(!store.purge(&backend).unwrap());
        assert!(!store.restore(&backend).unwrap());
    }
}
