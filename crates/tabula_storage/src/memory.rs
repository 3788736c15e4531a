//! In-memory storage backend for testing.

use crate::backend::{validate_target, StorageBackend};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory storage backend.
///
/// This backend keeps all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that only need save/restore within one process
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use tabula_storage::{StorageBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put("cart", b"{}").unwrap();
/// assert_eq!(backend.targets().unwrap(), vec!["cart".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Removes every blob.
    pub fn clear(&self) {
        self.blobs.write().clear();
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, target: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_target(target)?;
        Ok(self.blobs.read().get(target).cloned())
    }

    fn put(&self, target: &str, data: &[u8]) -> StorageResult<()> {
        validate_target(target)?;
        self.blobs.write().insert(target.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, target: &str) -> StorageResult<bool> {
        validate_target(target)?;
        Ok(self.blobs.write().remove(target).is_some())
    }

    fn targets(&self) -> StorageResult<Vec<String>> {
        Ok(self.blobs.read().keys().cloned().collect())
    }
}
