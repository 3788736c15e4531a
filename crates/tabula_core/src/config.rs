//! Store configuration.

use crate::cache::{DEFAULT_HTTP_CAPACITY, DEFAULT_VERSION_CAPACITY};
use std::time::Duration;

/// Configuration for a record store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store name, used to prefix fields in joins and as the default
    /// persistence target.
    pub name: String,

    /// Field whose value becomes the record key when `set` is called
    /// without one.
    pub key: Option<String>,

    /// Secondary indexes declared at construction.
    pub indexes: Vec<Vec<String>>,

    /// Whether updates capture a version snapshot first.
    pub versioning: bool,

    /// Versions retained per record.
    pub version_limit: usize,

    /// Capacity of the HTTP response cache.
    pub http_cache_capacity: usize,

    /// How long a cached HTTP response stays fresh.
    pub http_cache_ttl: Duration,

    /// Remote collection endpoint.
    pub uri: Option<String>,

    /// Dot-separated path unwrapped from remote payloads before loading.
    pub source: Option<String>,

    /// Headers sent with every remote request.
    pub headers: Vec<(String, String)>,

    /// Whether select and sort may run on the shared worker pool.
    pub use_workers: bool,

    /// Worker threads for the shared pool (first store to build it wins).
    pub worker_threads: usize,

    /// Minimum record count before a select or sort is offloaded.
    pub offload_threshold: usize,

    /// Change events retained for polling.
    pub event_history: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            key: None,
            indexes: Vec::new(),
            versioning: true,
            version_limit: DEFAULT_VERSION_CAPACITY,
            http_cache_capacity: DEFAULT_HTTP_CAPACITY,
            http_cache_ttl: Duration::from_secs(300),
            uri: None,
            source: None,
            headers: Vec::new(),
            use_workers: true,
            worker_threads: std::thread::available_parallelism().map_or(2, |n| n.get()),
            offload_threshold: 0,
            event_history: 10_000,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the primary-key field.
    #[must_use]
    pub fn key(mut self, field: impl Into<String>) -> Self {
        self.key = Some(field.into());
        self
    }

    /// Declares a secondary index over `fields`.
    #[must_use]
    pub fn index<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Enables or disables version snapshots.
    #[must_use]
    pub const fn versioning(mut self, value: bool) -> Self {
        self.versioning = value;
        self
    }

    /// Sets how many versions are retained per record.
    #[must_use]
    pub const fn version_limit(mut self, limit: usize) -> Self {
        self.version_limit = limit;
        self
    }

    /// Sets the HTTP cache capacity.
    #[must_use]
    pub const fn http_cache_capacity(mut self, capacity: usize) -> Self {
        self.http_cache_capacity = capacity;
        self
    }

    /// Sets the HTTP cache time-to-live.
    #[must_use]
    pub const fn http_cache_ttl(mut self, ttl: Duration) -> Self {
        self.http_cache_ttl = ttl;
        self
    }

    /// Sets the remote collection URI.
    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the path unwrapped from remote payloads.
    #[must_use]
    pub fn source(mut self, path: impl Into<String>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Adds a header sent with every remote request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Enables or disables worker offload.
    #[must_use]
    pub const fn use_workers(mut self, value: bool) -> Self {
        self.use_workers = value;
        self
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub const fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Sets the minimum record count before offloading.
    #[must_use]
    pub const fn offload_threshold(mut self, records: usize) -> Self {
        self.offload_threshold = records;
        self
    }

    /// Sets how many change events are retained.
    #[must_use]
    pub const fn event_history(mut self, events: usize) -> Self {
        self.event_history = events;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "store");
        assert!(config.key.is_none());
        assert!(config.versioning);
        assert_eq!(config.version_limit, 100);
        assert_eq!(config.http_cache_capacity, 500);
        assert!(config.use_workers);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .name("people")
            .key("id")
            .index(["age"])
            .index(["last", "first"])
            .versioning(false)
            .uri("https://example.test/people")
            .source("data.items")
            .header("Accept", "application/json")
            .use_workers(false);

        assert_eq!(config.name, "people");
        assert_eq!(config.key.as_deref(), Some("id"));
        assert_eq!(config.indexes, vec![vec!["age".to_string()], vec!["last".into(), "first".into()]]);
        assert!(!config.versioning);
        assert_eq!(config.source.as_deref(), Some("data.items"));
        assert_eq!(config.headers.len(), 1);
        assert!(!config.use_workers);
    }
}
