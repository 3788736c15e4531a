//! # Tabula Core
//!
//! In-memory indexed record store.
//!
//! This crate provides:
//! - A bounded LRU cache used for HTTP responses and version history
//! - Primary and composite secondary index maintenance
//! - Typed where clauses with an index fast path
//! - Multi-key ordering by recursive bucket sort, with revision-stamped views
//! - A shared worker pool for select and sort, with synchronous fallback
//! - Remote collection reconciliation through a caller-supplied HTTP client
//! - Batches, joins, undo, change events and persistence
//!
//! ## Usage
//!
//! ```
//! use tabula_core::{sort::OrderBy, RecordStore, SetOptions, StoreConfig};
//! use tabula_value::fields;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = RecordStore::new(StoreConfig::new().key("id")).unwrap();
//! for (id, age) in [(1, 30), (2, 25), (3, 25)] {
//!     store.set(None, fields([("id", id), ("age", age)]), SetOptions::new()).await.unwrap();
//! }
//!
//! let sorted = store.sort(&OrderBy::parse("age, id desc").unwrap(), false, None).await.unwrap();
//! let keys: Vec<_> = sorted.iter().map(|r| r.key.as_str()).collect();
//! assert_eq!(keys, ["3", "2", "1"]);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod events;
pub mod index;
pub mod query;
pub mod remote;
pub mod sort;
mod stats;
mod store;
mod types;
mod versions;
pub mod worker;

pub use cache::{LruCache, DEFAULT_CAPACITY, DEFAULT_HTTP_CAPACITY, DEFAULT_VERSION_CAPACITY};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use events::{EventFeed, EventKind, StoreEvent};
pub use index::IndexManager;
pub use query::{Predicate, QueryPlan, Where};
pub use sort::OrderBy;
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{BatchOp, BatchOutcome, JoinKind, RecordStore, StoreSnapshot};
pub use types::{DelOptions, Record, RecordSnapshot, Selector, SetOptions, Target};
pub use versions::VersionHistory;
pub use worker::WorkerPool;
