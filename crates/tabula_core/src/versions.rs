//! Per-record version history.

use crate::cache::LruCache;
use std::collections::HashMap;
use tabula_value::Fields;

#[derive(Debug)]
struct History {
    versions: LruCache<String, Fields>,
    /// Labels oldest to newest.
    order: Vec<String>,
}

/// Snapshots of record fields taken before each update.
///
/// Every record gets its own LRU of `v<N>` labels. The counter `N` is shared
/// by all records and only ever increases, so labels are never reused.
#[derive(Debug)]
pub struct VersionHistory {
    records: HashMap<String, History>,
    limit: usize,
    nth: u64,
}

impl VersionHistory {
    /// Creates a history retaining `limit` versions per record.
    pub fn new(limit: usize) -> Self {
        Self {
            records: HashMap::new(),
            limit: limit.max(1),
            nth: 0,
        }
    }

    /// Stores `fields` as the newest version of `key` and returns its label.
    ///
    /// The oldest version is evicted once `limit` is exceeded.
    pub fn record(&mut self, key: &str, fields: Fields) -> String {
        let label = format!("v{}", self.nth);
        self.nth += 1;

        let limit = self.limit;
        let history = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| History {
                versions: LruCache::new(limit),
                order: Vec::new(),
            });
        if let Some((evicted, _)) = history.versions.set(label.clone(), fields) {
            history.order.retain(|l| *l != evicted);
        }
        history.order.push(label.clone());
        label
    }

    /// The version of `key` labelled `label`.
    pub fn get(&self, key: &str, label: &str) -> Option<&Fields> {
        self.records
            .get(key)
            .and_then(|history| history.versions.peek(&label.to_string()))
    }

    /// The oldest retained version of `key`, with its label.
    pub fn oldest(&self, key: &str) -> Option<(&str, &Fields)> {
        let history = self.records.get(key)?;
        let label = history.order.first()?;
        let fields = history.versions.peek(label)?;
        Some((label.as_str(), fields))
    }

    /// Retained labels of `key`, oldest first.
    pub fn labels(&self, key: &str) -> Vec<String> {
        self.records
            .get(key)
            .map(|history| history.order.clone())
            .unwrap_or_default()
    }

    /// Returns true if `key` has any retained version.
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Drops the history of `key`.
    pub fn remove(&mut self, key: &str) -> bool {
        self.records.remove(key).is_some()
    }

    /// Drops every history. The label counter keeps counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of records with history.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no record has history.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Versions retained per record.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::fields;

    #[test]
    fn labels_increase() {
        let mut history = VersionHistory::new(10);
        assert_eq!(history.record("a", fields([("x", 1)])), "v0");
        assert_eq!(history.record("b", fields([("x", 1)])), "v1");
        assert_eq!(history.record("a", fields([("x", 2)])), "v2");

        assert_eq!(history.labels("a"), vec!["v0", "v2"]);
        assert_eq!(history.get("a", "v2"), Some(&fields([("x", 2)])));
        assert!(history.get("a", "v1").is_none());
    }

    #[test]
    fn oldest_is_evicted_past_limit() {
        let mut history = VersionHistory::new(2);
        for x in 0..3 {
            history.record("a", fields([("x", x)]));
        }
        assert_eq!(history.labels("a"), vec!["v1", "v2"]);

        let (label, fields_) = history.oldest("a").unwrap();
        assert_eq!(label, "v1");
        assert_eq!(fields_, &fields([("x", 1)]));
    }

    #[test]
    fn remove_and_clear() {
        let mut history = VersionHistory::new(5);
        history.record("a", fields([("x", 1)]));
        history.record("b", fields([("x", 1)]));

        assert!(history.remove("a"));
        assert!(!history.contains("a"));
        assert!(history.oldest("a").is_none());

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.record("c", fields([("x", 1)])), "v2");
    }
}
