//! Revision-stamped sort views.

use crate::query::Where;
use crate::sort::OrderBy;
use crate::types::RecordSnapshot;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct View {
    revision: u64,
    records: Arc<Vec<RecordSnapshot>>,
}

/// Cache of sorted results.
///
/// Each view is stamped with the store revision it was computed at and is
/// served only while the revision is unchanged.
#[derive(Debug, Default)]
pub struct ViewCache {
    views: HashMap<String, View>,
}

impl ViewCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for sorting by `order` after filtering by `query`.
    ///
    /// `None` when the filter has predicates, which cannot be keyed.
    pub fn key_for(order: &OrderBy, query: Option<&Where>) -> Option<String> {
        match query {
            None => Some(order.signature()),
            Some(query) => query
                .cache_key()
                .map(|filter| format!("{}@{filter}", order.signature())),
        }
    }

    /// The view under `key` if it was computed at `revision`.
    pub fn get(&self, key: &str, revision: u64) -> Option<Arc<Vec<RecordSnapshot>>> {
        self.views
            .get(key)
            .filter(|view| view.revision == revision)
            .map(|view| Arc::clone(&view.records))
    }

    /// Stores a view computed at `revision`.
    pub fn put(&mut self, key: String, revision: u64, records: Arc<Vec<RecordSnapshot>>) {
        self.views.insert(key, View { revision, records });
    }

    /// Drops every view.
    pub fn clear(&mut self) {
        self.views.clear();
    }

    /// Number of views held, stale ones included.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns true if no views are held.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
