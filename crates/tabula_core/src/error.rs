//! Error types for Tabula core.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed selector, where clause, sort specification or index
    /// declaration.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of what was wrong.
        message: String,
    },

    /// Undo was requested for a record without retained versions.
    #[error("no previous version for record {key:?}")]
    NoPreviousVersion {
        /// The record key.
        key: String,
    },

    /// A remote payload was not a structured object.
    #[error("expected an object: {message}")]
    ExpectedObject {
        /// Description of the payload that was received.
        message: String,
    },

    /// The remote collection answered with an unexpected status.
    #[error("server error {status}: {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Response detail.
        message: String,
    },

    /// The remote collection refused the request (403).
    #[error("forbidden: {uri}")]
    Forbidden {
        /// The URI that was requested.
        uri: String,
    },

    /// The remote collection requires authentication (401).
    #[error("unauthorized: {uri}")]
    Unauthorized {
        /// The URI that was requested.
        uri: String,
    },

    /// The remote collection does not allow the method (405).
    #[error("method {method} not allowed on {uri}")]
    MethodNotAllowed {
        /// The URI that was requested.
        uri: String,
        /// The HTTP method.
        method: String,
    },

    /// The get/del/update target does not exist.
    #[error("record not found: {target}")]
    RecordNotFound {
        /// The key or position that was requested.
        target: String,
    },

    /// The HTTP collaborator failed before producing a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// One or more batch items failed.
    #[error("batch failed: {failed} of {total} items")]
    BatchFailed {
        /// Number of failed items.
        failed: usize,
        /// Number of items in the batch.
        total: usize,
    },

    /// A reindex failed and the store can no longer guarantee its indexes.
    #[error("store is poisoned by a failed reindex")]
    Poisoned,

    /// Persistence backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tabula_storage::StorageError),

    /// Value conversion or encoding error.
    #[error("value error: {0}")]
    Value(#[from] tabula_value::ValueError),
}

impl StoreError {
    /// Creates an invalid arguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates a record not found error.
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::RecordNotFound {
            target: target.into(),
        }
    }

    /// Creates an expected object error.
    pub fn expected_object(message: impl Into<String>) -> Self {
        Self::ExpectedObject {
            message: message.into(),
        }
    }

    /// Returns true for the permission failures surfaced by the remote
    /// collection (401, 403, 405).
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Self::Forbidden { .. } | Self::Unauthorized { .. } | Self::MethodNotAllowed { .. }
        )
    }
}
