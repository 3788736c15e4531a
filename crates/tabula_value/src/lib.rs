//! # Tabula Value
//!
//! Record field values for Tabula.
//!
//! Records are loosely shaped field maps. This crate pins that shape down to
//! a small closed sum type ([`Value`]) and provides:
//! - Canonical key strings, so numeric and text bucket components agree
//! - The total order used by multi-key sorting
//! - JSON conversion for the HTTP boundary
//! - CBOR encoding for persisted snapshots
//!
//! ## Usage
//!
//! ```
//! use tabula_value::{fields_from_json, Value};
//!
//! let record = fields_from_json(serde_json::json!({"id": 1, "age": 25})).unwrap();
//! assert_eq!(record["age"].key_string(), "25");
//! assert!(Value::from(25).loose_eq(&Value::from("25")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod convert;
mod error;
mod value;

pub use convert::{fields_from_json, fields_to_json, from_cbor, from_json_str, to_cbor};
pub use error::{ValueError, ValueResult};
pub use value::{fields, Fields, Value};
