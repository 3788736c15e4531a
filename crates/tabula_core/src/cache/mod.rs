//! Bounded least-recently-used cache.
//!
//! Backs both the HTTP response cache and per-record version history.
//! Capacity is fixed at construction; inserting past it evicts the least
//! recently touched entry and hands it back to the caller.

use std::hash::Hash;
use std::num::NonZeroUsize;

/// Default capacity for general-purpose caches.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default capacity for the HTTP response cache.
pub const DEFAULT_HTTP_CAPACITY: usize = 500;

/// Default number of versions retained per record.
pub const DEFAULT_VERSION_CAPACITY: usize = 100;

/// A bounded map with most/least recently used tracking.
///
/// # Example
///
/// ```
/// use tabula_core::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// let evicted = cache.set("c", 3);
///
/// assert_eq!(evicted, Some(("a", 1)));
/// assert!(cache.get(&"a").is_none());
/// ```
#[derive(Debug)]
pub struct LruCache<K: Hash + Eq, V> {
    inner: lru::LruCache<K, V>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Creates a cache holding at most `max` entries. Zero is clamped to one.
    pub fn new(max: usize) -> Self {
        let cap = NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: lru::LruCache::new(cap),
        }
    }

    /// Creates a cache with [`DEFAULT_CAPACITY`].
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Returns the value for `key`, promoting it to most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.inner.peek(key)
    }

    /// Returns true if `key` is cached. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Inserts or replaces `key` as the most recently used entry.
    ///
    /// Returns the entry evicted to stay within capacity, if any. Replacing
    /// an existing key never evicts.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            return None;
        }
        self.inner.push(key, value)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    /// Removes and returns the least recently used entry.
    pub fn evict(&mut self) -> Option<(K, V)> {
        self.inner.pop_lru()
    }

    /// The most recently used key.
    pub fn first(&self) -> Option<&K> {
        self.inner.peek_mru().map(|(k, _)| k)
    }

    /// The least recently used key.
    pub fn last(&self) -> Option<&K> {
        self.inner.peek_lru().map(|(k, _)| k)
    }

    /// The least recently used entry, without touching recency.
    pub fn peek_last(&self) -> Option<(&K, &V)> {
        self.inner.peek_lru()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.iter().map(|(k, _)| k)
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
