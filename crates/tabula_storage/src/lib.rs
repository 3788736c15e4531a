//! # Tabula Storage
//!
//! Persistence backends for Tabula.
//!
//! A record store is purely in-memory. Backends give it somewhere to save a
//! snapshot of its state, restore it later, or purge it. Backends are
//! **opaque keyed blob stores** - they do not interpret the bytes they hold.
//!
//! ## Design Principles
//!
//! - One blob per named target
//! - No knowledge of record, index or snapshot formats
//! - Must be `Send + Sync` for use from async tasks
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - One file per target inside a directory
//!
//! ## Example
//!
//! ```rust
//! use tabula_storage::{StorageBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.put("users", b"snapshot").unwrap();
//! assert_eq!(backend.get("users").unwrap().as_deref(), Some(&b"snapshot"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
