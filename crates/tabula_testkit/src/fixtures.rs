//! Record fixtures and store helpers.
//!
//! The people fixture is the three-record set most store tests start from:
//! ids 1 to 3 with ages 30, 25 and 25.

use tabula_core::{RecordStore, SetOptions, StoreConfig};
use tabula_storage::FileBackend;
use tabula_value::{fields, Fields, Value};
use tempfile::TempDir;

/// `(id, age)` pairs of the people fixture.
pub const PEOPLE: [(i64, i64); 3] = [(1, 30), (2, 25), (3, 25)];

/// The people fixture as field maps.
pub fn people() -> Vec<Fields> {
    PEOPLE
        .iter()
        .map(|&(id, age)| fields([("id", id), ("age", age)]))
        .collect()
}

/// The people fixture as batch items.
pub fn people_items() -> Vec<Value> {
    people().into_iter().map(Value::Map).collect()
}

/// `count` generated records with ids `0..count`, a repeating `age` from
/// 20 to 29 and a `name`.
pub fn numbered(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            Value::Map(fields([
                ("id", Value::from(i)),
                ("age", Value::from(20 + i % 10)),
                ("name", Value::from(format!("user-{i}"))),
            ]))
        })
        .collect()
}

/// Store settings shared by tests: primary key `id`, workers off.
pub fn test_config() -> StoreConfig {
    StoreConfig::new().name("people").key("id").use_workers(false)
}

/// Builds a store from `config` and sets the people fixture one record at a
/// time.
pub async fn people_store(config: StoreConfig) -> RecordStore {
    let store = RecordStore::new(config).expect("Failed to create store");
    for record in people() {
        store
            .set(None, record, SetOptions::new())
            .await
            .expect("Failed to set fixture record");
    }
    store
}

/// A file backend in a temporary directory that is removed on drop.
pub struct TempBackend {
    /// The backend.
    pub backend: FileBackend,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempBackend {
    /// Creates a backend in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let backend = FileBackend::open(temp_dir.path()).expect("Failed to open file backend");
        Self {
            backend,
            _temp_dir: temp_dir,
        }
    }
}

impl Default for TempBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TempBackend {
    type Target = FileBackend;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_records_repeat_ages() {
        let records = numbered(12);
        assert_eq!(records.len(), 12);
        assert_eq!(records[11].get("age"), Some(&Value::from(21)));
    }

    #[tokio::test]
    async fn people_store_holds_fixture() {
        let store = people_store(test_config()).await;
        assert_eq!(store.keys(), vec!["1", "2", "3"]);
    }

    #[test]
    fn temp_backend_starts_empty() {
        use tabula_storage::StorageBackend;
        let backend = TempBackend::new();
        assert!(backend.targets().unwrap().is_empty());
    }
}
