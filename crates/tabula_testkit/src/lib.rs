//! # Tabula Testkit
//!
//! Test utilities for Tabula.
//!
//! This crate provides:
//! - Record fixtures and ready-made stores
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabula_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_people() {
//!     let store = people_store(StoreConfig::new()).await;
//!     assert_eq!(store.len(), 3);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use tabula_core::StoreConfig;
}

pub use fixtures::*;
pub use generators::*;
