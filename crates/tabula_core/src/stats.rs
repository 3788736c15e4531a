//! Store statistics and telemetry.
//!
//! Counters show which access paths queries actually take. A high
//! `scans` count next to a low `index_lookups` count usually means an index
//! is missing or declared with different fields than the queries use.
//!
//! # Usage
//!
//! ```rust,ignore
//! let store = RecordStore::new(StoreConfig::new().index(["age"]));
//! store.select(Where::new().eq("age", 25)).await?;
//!
//! let stats = store.stats();
//! println!("Index lookups: {}", stats.index_lookups);
//! println!("Scans: {}", stats.scans);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Record store statistics.
///
/// All counters are atomic and can be read while operations are in progress.
#[derive(Debug, Default)]
pub struct StoreStats {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    /// Full collection scans.
    scans: AtomicU64,
    /// Queries answered from a secondary index.
    index_lookups: AtomicU64,
    sorts: AtomicU64,
    /// Sorts answered from a cached view.
    view_hits: AtomicU64,
    worker_dispatches: AtomicU64,
    worker_fallbacks: AtomicU64,
    reindexes: AtomicU64,
    errors: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sort(&self) {
        self.sorts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_view_hit(&self) {
        self.view_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_worker_dispatch(&self) {
        self.worker_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_worker_fallback(&self) {
        self.worker_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reindex(&self) {
        self.reindexes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            sorts: self.sorts.load(Ordering::Relaxed),
            view_hits: self.view_hits.load(Ordering::Relaxed),
            worker_dispatches: self.worker_dispatches.load(Ordering::Relaxed),
            worker_fallbacks: self.worker_fallbacks.load(Ordering::Relaxed),
            reindexes: self.reindexes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Get operations.
    pub reads: u64,
    /// Set operations.
    pub writes: u64,
    /// Delete operations.
    pub deletes: u64,
    /// Full collection scans.
    pub scans: u64,
    /// Queries answered from a secondary index.
    pub index_lookups: u64,
    /// Sorts computed.
    pub sorts: u64,
    /// Sorts answered from a cached view.
    pub view_hits: u64,
    /// Jobs sent to the worker pool.
    pub worker_dispatches: u64,
    /// Jobs that fell back to synchronous evaluation after a dispatch
    /// failure.
    pub worker_fallbacks: u64,
    /// Full reindex passes.
    pub reindexes: u64,
    /// Failed operations.
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = StoreStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = StoreStats::new();
        stats.record_read();
        stats.record_write();
        stats.record_write();
        stats.record_scan();
        stats.record_index_lookup();
        stats.record_view_hit();

        let snap = stats.snapshot();
        assert_eq!(snap.reads, 1);
        assert_eq!(snap.writes, 2);
        assert_eq!(snap.scans, 1);
        assert_eq!(snap.index_lookups, 1);
        assert_eq!(snap.view_hits, 1);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(StoreStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_read();
                    s.record_scan();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.reads, 1000);
        assert_eq!(snap.scans, 1000);
    }
}
