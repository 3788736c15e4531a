//! Store change events.
//!
//! Every mutation that bumps the store revision emits one [`StoreEvent`].
//! Dependent views (UI bindings, caches kept by callers, sync layers)
//! subscribe to refresh themselves. A batch emits a single
//! [`EventKind::Batch`] event on completion instead of one per item.
//!
//! # Usage
//!
//! ```rust,ignore
//! let store = RecordStore::new(StoreConfig::new());
//! let receiver = store.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(event) = receiver.recv() {
//!         println!("revision {}: {:?}", event.revision, event.kind);
//!     }
//! });
//! ```

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

/// Kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A record was created.
    Created,
    /// An existing record was updated.
    Updated,
    /// A record was deleted.
    Deleted,
    /// The collection and all indexes were rebuilt.
    Reindexed,
    /// The store was emptied.
    Cleared,
    /// A batch completed.
    Batch,
}

/// A single change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Store revision after the change.
    pub revision: u64,
    /// What happened.
    pub kind: EventKind,
    /// Affected record key, when the change concerns one record.
    pub key: Option<String>,
}

impl StoreEvent {
    /// Creates an event for a single record.
    pub fn record(revision: u64, kind: EventKind, key: impl Into<String>) -> Self {
        Self {
            revision,
            kind,
            key: Some(key.into()),
        }
    }

    /// Creates an event that concerns the whole store.
    pub fn store(revision: u64, kind: EventKind) -> Self {
        Self {
            revision,
            kind,
            key: None,
        }
    }
}

/// Distributes store events to subscribers and keeps a bounded history.
pub struct EventFeed {
    subscribers: RwLock<Vec<Sender<StoreEvent>>>,
    history: RwLock<VecDeque<StoreEvent>>,
    max_history: usize,
}

impl EventFeed {
    /// Creates a feed retaining at most `max_history` events.
    pub fn new(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::new()),
            max_history,
        }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event, dropping subscribers whose receiver is gone.
    pub fn emit(&self, event: StoreEvent) {
        {
            let mut history = self.history.write();
            history.push_back(event.clone());
            while history.len() > self.max_history {
                history.pop_front();
            }
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns retained events with `revision > cursor`, up to `limit`.
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<StoreEvent> {
        self.history
            .read()
            .iter()
            .filter(|e| e.revision > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Revision of the newest retained event, or 0.
    pub fn latest_revision(&self) -> u64 {
        self.history.read().back().map_or(0, |e| e.revision)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("subscribers", &self.subscriber_count())
            .field("history", &self.history.read().len())
            .field("max_history", &self.max_history)
            .finish()
    }
}
