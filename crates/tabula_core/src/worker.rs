//! Parallel offload for select and sort.
//!
//! Expensive scans and sorts run on a process-wide rayon pool. Jobs own a
//! snapshot of everything they read and hand their result back by value
//! over a oneshot channel, so nothing mutable is shared with the store.
//!
//! The pool is built lazily by the first store that wants it and shared
//! through a weak registry slot; it is torn down when the last store holding
//! it is dropped.
//!
//! The first dispatch failure (pool build error, panicking job, lost result)
//! disables offloading for the rest of the process. Every later call runs
//! synchronously on the calling task with identical results.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;

/// Registry slot for the shared pool.
static SHARED_POOL: Lazy<Mutex<Weak<WorkerPool>>> = Lazy::new(|| Mutex::new(Weak::new()));

/// Set once on the first dispatch failure. Never cleared.
static DISABLED: AtomicBool = AtomicBool::new(false);

/// Returns true once offloading has been permanently disabled.
pub fn is_disabled() -> bool {
    DISABLED.load(Ordering::Acquire)
}

fn disable(reason: &str) {
    if !DISABLED.swap(true, Ordering::AcqRel) {
        tracing::warn!(reason, "worker offload disabled, falling back to synchronous evaluation");
    }
}

/// Where an offloaded job actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    /// On the worker pool.
    Worker,
    /// Synchronously after a dispatch failure.
    Fallback,
    /// Synchronously because no pool was available.
    Inline,
}

/// A rayon thread pool that returns job results through oneshot channels.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Builds a private pool with `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns rayon's build error if the threads cannot be spawned.
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tabula-worker-{i}"))
            .panic_handler(|_| tracing::error!("worker job panicked"))
            .build()?;
        Ok(Self { pool, threads })
    }

    /// Returns the process-wide pool, building it on first use.
    ///
    /// `None` once offloading is disabled or when the pool cannot be built
    /// (which disables offloading). `threads` only matters for the call
    /// that builds the pool.
    pub fn shared(threads: usize) -> Option<Arc<Self>> {
        if is_disabled() {
            return None;
        }
        let mut slot = SHARED_POOL.lock();
        if let Some(pool) = slot.upgrade() {
            return Some(pool);
        }
        match Self::new(threads) {
            Ok(pool) => {
                let pool = Arc::new(pool);
                *slot = Arc::downgrade(&pool);
                tracing::debug!(threads = pool.threads, "worker pool started");
                Some(pool)
            }
            Err(e) => {
                disable(&e.to_string());
                None
            }
        }
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `job` on the pool.
    ///
    /// The receiver yields an error if the job panicked.
    pub fn dispatch<T, F>(&self, job: F) -> oneshot::Receiver<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let _ = tx.send(job());
        });
        rx
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}

/// Runs a job on `pool` when possible, synchronously otherwise.
///
/// `make_job` builds a fresh self-contained job each time it is called. It
/// is called a second time only when dispatch fails, and the replacement
/// runs on the calling task.
pub async fn offload<T, F, M>(pool: Option<&Arc<WorkerPool>>, mut make_job: M) -> (T, ExecutionPath)
where
    M: FnMut() -> F,
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let Some(pool) = pool.filter(|_| !is_disabled()) else {
        return (make_job()(), ExecutionPath::Inline);
    };

    match pool.dispatch(make_job()).await {
        Ok(value) => (value, ExecutionPath::Worker),
        Err(_) => {
            disable("worker dropped its result");
            (make_job()(), ExecutionPath::Fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn private_pool_returns_results() {
        let pool = WorkerPool::new(2).unwrap();
        let rx = pool.dispatch(|| (1..=10).sum::<i32>());
        assert_eq!(rx.await.unwrap(), 55);
        assert_eq!(pool.threads(), 2);
    }

    #[tokio::test]
    async fn offload_without_pool_runs_inline() {
        let data = vec![3, 1, 2];
        let (sorted, path) = offload(None, || {
            let mut data = data.clone();
            move || {
                data.sort_unstable();
                data
            }
        })
        .await;
        assert_eq!(sorted, vec![1, 2, 3]);
        assert_eq!(path, ExecutionPath::Inline);
    }

    #[tokio::test]
    async fn offload_result_is_path_independent() {
        let pool = WorkerPool::shared(2);
        let (value, _) = offload(pool.as_ref(), || || "done".to_string()).await;
        assert_eq!(value, "done");
    }

    #[test]
    fn shared_pool_is_reused_while_alive() {
        let (Some(a), Some(b)) = (WorkerPool::shared(2), WorkerPool::shared(4)) else {
            return;
        };
        assert!(Arc::ptr_eq(&a, &b));
    }
}
