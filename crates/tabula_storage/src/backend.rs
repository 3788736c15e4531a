//! Storage backend trait definition.

use crate::error::StorageResult;

/// A keyed blob store used to persist record store snapshots.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last written by `put` for that target
/// - `remove` of a missing target is not an error
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the blob stored under `target`.
    ///
    /// Returns `None` if nothing has been stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if the target name is invalid or an I/O error occurs.
    fn get(&self, target: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `data` under `target`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the target name is invalid or an I/O error occurs.
    fn put(&self, target: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the blob stored under `target`.
    ///
    /// Returns `true` if a blob was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the target name is invalid or an I/O error occurs.
    fn remove(&self, target: &str) -> StorageResult<bool>;

    /// Lists the stored target names in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the targets cannot be enumerated.
    fn targets(&self) -> StorageResult<Vec<String>>;
}

/// Validates a target name.
///
/// Target names become file names in [`super::FileBackend`], so they are
/// restricted to a portable character set.
pub(crate) fn validate_target(target: &str) -> StorageResult<()> {
    let valid = !target.is_empty()
        && target.len() <= 128
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !target.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(crate::error::StorageError::InvalidTarget(target.to_string()))
    }
}
