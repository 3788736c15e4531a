//! The record store.
//!
//! [`RecordStore`] owns a dense collection of records together with its
//! primary and secondary indexes, version history, cached sort views and
//! change feed. Operations are spread over submodules:
//!
//! - `record_store`: construction, CRUD, select, sort, undo
//! - `batch`: bulk set and delete with a single reindex
//! - `join`: inner, left and right joins between two stores
//! - `sync`: loading from a remote collection
//! - `persist`: save, restore and purge through a storage backend

mod batch;
mod collection;
mod join;
mod persist;
mod record_store;
mod sync;

pub use batch::{BatchOp, BatchOutcome};
pub use join::JoinKind;
pub use persist::StoreSnapshot;
pub use record_store::RecordStore;
