//! Error types for the value crate.

use thiserror::Error;

/// Result type for value conversions.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors that can occur while converting or encoding values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Failed to encode a value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR or JSON bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// Numbers must be finite to be stored or compared.
    #[error("non-finite numbers cannot be represented")]
    NonFinite,

    /// A structured object was required.
    #[error("expected an object, found {found}")]
    ExpectedObject {
        /// Kind of value that was found instead.
        found: &'static str,
    },
}

impl ValueError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}
