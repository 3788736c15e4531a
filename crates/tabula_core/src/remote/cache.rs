//! HTTP response and permission cache.

use crate::cache::LruCache;
use crate::remote::http::{Method, Permissions};
use std::time::{Duration, Instant};

/// A cached response for one URI.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    /// Response body, if one was cached. Entries that only record
    /// permissions have none.
    pub body: Option<serde_json::Value>,
    /// Methods the URI is known to accept.
    pub permissions: Permissions,
    /// When the entry stops being served.
    pub expires_at: Instant,
}

/// LRU cache of responses and permissions keyed by URI.
///
/// Expired entries are treated as absent and removed when touched.
#[derive(Debug)]
pub struct HttpCache {
    entries: LruCache<String, CachedResponse>,
    ttl: Duration,
}

impl HttpCache {
    /// Creates a cache with `capacity` entries that live for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// The fresh entry for `uri`, promoting it.
    pub fn get(&mut self, uri: &str) -> Option<CachedResponse> {
        self.get_at(uri, Instant::now())
    }

    fn get_at(&mut self, uri: &str, now: Instant) -> Option<CachedResponse> {
        let key = uri.to_string();
        let expired = self.entries.peek(&key)?.expires_at <= now;
        if expired {
            self.entries.remove(&key);
            return None;
        }
        self.entries.get(&key).cloned()
    }

    /// Caches a response body with the permissions it advertised.
    pub fn put(&mut self, uri: &str, body: serde_json::Value, permissions: Permissions) {
        let entry = CachedResponse {
            body: Some(body),
            permissions,
            expires_at: Instant::now() + self.ttl,
        };
        if let Some((evicted, _)) = self.entries.set(uri.to_string(), entry) {
            tracing::trace!(uri = %evicted, "http cache entry evicted");
        }
    }

    /// Known permissions for `uri`. Unknown URIs allow everything.
    pub fn permissions(&mut self, uri: &str) -> Permissions {
        self.get(uri)
            .map_or(Permissions::ALL, |entry| entry.permissions)
    }

    /// Records that `uri` refused `method`.
    pub fn deny(&mut self, uri: &str, method: Method) {
        let expires_at = Instant::now() + self.ttl;
        let entry = match self.get(uri) {
            Some(mut entry) => {
                entry.permissions = entry.permissions.without(method);
                entry.expires_at = expires_at;
                entry
            }
            None => CachedResponse {
                body: None,
                permissions: Permissions::ALL.without(method),
                expires_at,
            },
        };
        self.entries.set(uri.to_string(), entry);
    }

    /// Drops the cached body for `uri`, keeping its permissions.
    pub fn invalidate(&mut self, uri: &str) {
        if let Some(mut entry) = self.get(uri) {
            entry.body = None;
            self.entries.set(uri.to_string(), entry);
        }
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
