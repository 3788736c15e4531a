//! Index maintenance for record lookup.
//!
//! Tabula keeps two kinds of access path:
//! - A primary index from record key to collection position
//! - Secondary indexes from a composite bucket value to positions
//!
//! Indexes are declared with a field list, which is sorted and
//! deduplicated at declaration time. A query whose equality fields, sorted,
//! equal a declared signature is answered from the index instead of a scan.

mod manager;
mod secondary;

pub use manager::IndexManager;
pub use secondary::{bucket_value_of, push_component, signature_of, SecondaryIndex, SEPARATOR};
