//! The record store handle.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::events::{EventFeed, EventKind, StoreEvent};
use crate::query::{scan, QueryPlan, Where};
use crate::remote::{HttpCache, HttpClient, RemoteCollection};
use crate::sort::{bucket_sort, OrderBy, ViewCache};
use crate::stats::{StatsSnapshot, StoreStats};
use crate::store::collection::{merge_fields, Collection};
use crate::types::{DelOptions, RecordSnapshot, Selector, SetOptions, Target};
use crate::worker::{self, ExecutionPath, WorkerPool};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tabula_value::{Fields, Value};

pub(crate) struct StoreInner {
    pub(crate) config: StoreConfig,
    pub(crate) state: RwLock<Collection>,
    pub(crate) views: Mutex<ViewCache>,
    pub(crate) events: EventFeed,
    pub(crate) stats: StoreStats,
    pub(crate) workers: Option<Arc<WorkerPool>>,
    pub(crate) remote: Option<RemoteCollection>,
    poisoned: AtomicBool,
}

/// An in-memory indexed record store.
///
/// Cloning is cheap and every clone refers to the same store. Reads take a
/// shared lock and return deep copies. Mutations take the exclusive lock
/// for the record change and its index maintenance together. No lock is
/// held across an `.await`.
///
/// # Example
///
/// ```
/// use tabula_core::{RecordStore, SetOptions, StoreConfig, Where};
/// use tabula_value::fields;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = RecordStore::new(StoreConfig::new().key("id").index(["age"])).unwrap();
/// store.set(None, fields([("id", 1), ("age", 30)]), SetOptions::new()).await.unwrap();
/// store.set(None, fields([("id", 2), ("age", 25)]), SetOptions::new()).await.unwrap();
///
/// let young = store.select(&Where::new().eq("age", 25)).await.unwrap();
/// assert_eq!(young[0].key, "2");
/// # });
/// ```
#[derive(Clone)]
pub struct RecordStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl RecordStore {
    /// Creates a store and declares the configured indexes.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` if a configured index is malformed.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        Self::build(config, None)
    }

    /// Creates a store that reconciles with a remote collection.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` if the configuration has no URI or a configured
    /// index is malformed.
    pub fn with_remote(config: StoreConfig, client: Arc<dyn HttpClient>) -> StoreResult<Self> {
        let uri = config
            .uri
            .clone()
            .ok_or_else(|| StoreError::invalid_arguments("a remote store needs a uri"))?;
        let cache = HttpCache::new(config.http_cache_capacity, config.http_cache_ttl);
        let remote = RemoteCollection::new(client, uri, config.headers.clone(), cache);
        Self::build(config, Some(remote))
    }

    fn build(config: StoreConfig, remote: Option<RemoteCollection>) -> StoreResult<Self> {
        let mut collection = Collection::new(config.version_limit);
        for fields in &config.indexes {
            collection.declare_index(fields)?;
        }
        let workers = if config.use_workers {
            WorkerPool::shared(config.worker_threads)
        } else {
            None
        };
        tracing::debug!(
            name = %config.name,
            indexes = config.indexes.len(),
            workers = workers.is_some(),
            remote = remote.is_some(),
            "store created"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                events: EventFeed::new(config.event_history),
                config,
                state: RwLock::new(collection),
                views: Mutex::new(ViewCache::new()),
                stats: StoreStats::new(),
                workers,
                remote,
                poisoned: AtomicBool::new(false),
            }),
        })
    }

    /// Store name.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// The configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Declares a secondary index and indexes existing records into it.
    ///
    /// Field order does not matter. Returns the index signature.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` for an empty field list or field name.
    pub fn declare_index<S: AsRef<str>>(&self, fields: &[S]) -> StoreResult<String> {
        self.ensure_usable()?;
        let result = self.inner.state.write().declare_index(fields);
        self.track(result)
    }

    /// Signatures of the declared secondary indexes.
    pub fn indexes(&self) -> Vec<String> {
        self.inner.state.read().indexes.signatures()
    }

    /// Returns deep copies of the selected records.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if a selected key or position does not exist.
    pub fn get(&self, selector: &Selector) -> StoreResult<Vec<RecordSnapshot>> {
        self.ensure_usable()?;
        self.inner.stats.record_read();
        let state = self.inner.state.read();
        let resolve = |target: &Target| {
            state
                .resolve(target)
                .and_then(|position| state.record_at(position))
                .map(|record| record.snapshot())
                .ok_or_else(|| StoreError::not_found(target.describe()))
        };

        let result = match selector {
            Selector::All => Ok(state.snapshot_live()),
            Selector::Key(key) => resolve(&Target::Key(key.clone())).map(|r| vec![r]),
            Selector::Position(position) => resolve(&Target::Position(*position)).map(|r| vec![r]),
            Selector::List(targets) => targets.iter().map(resolve).collect(),
            Selector::Range { start, count } => Ok(state
                .live()
                .skip(*start)
                .take(*count)
                .map(|record| record.snapshot())
                .collect()),
        };
        drop(state);
        self.track(result)
    }

    /// Returns a deep copy of the record with `key`.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if there is no such record.
    pub fn record(&self, key: &str) -> StoreResult<RecordSnapshot> {
        let mut found = self.get(&Selector::Key(key.to_string()))?;
        found.pop().ok_or_else(|| StoreError::not_found(key))
    }

    /// Creates or updates a record.
    ///
    /// The key is `key` if given, else the configured primary-key field of
    /// `data`, else a fresh UUID. Updates merge into the existing fields
    /// unless `options.overwrite` is set, and snapshot the previous fields
    /// first when versioning is on.
    ///
    /// Outside batch mode a configured remote is reconciled first (POST for
    /// a new key, PUT for an existing one), then cached views are dropped
    /// and an event is emitted.
    ///
    /// # Errors
    ///
    /// Remote errors, or `Poisoned`.
    pub async fn set(
        &self,
        key: Option<&str>,
        data: Fields,
        options: SetOptions,
    ) -> StoreResult<RecordSnapshot> {
        let result = self.set_inner(key, data, options).await;
        self.track(result)
    }

    async fn set_inner(
        &self,
        key: Option<&str>,
        data: Fields,
        options: SetOptions,
    ) -> StoreResult<RecordSnapshot> {
        self.ensure_usable()?;
        let key = match key {
            Some(key) => key.to_string(),
            None => self.derive_key(&data),
        };

        if !options.batch {
            if let Some(remote) = &self.inner.remote {
                let current = self
                    .inner
                    .state
                    .read()
                    .record(&key)
                    .map(|record| record.fields.clone());
                match current {
                    Some(current) => {
                        let next = merge_fields(current, data.clone(), options.overwrite);
                        remote.update(&key, &next).await?;
                    }
                    None => remote.create(&data).await?,
                }
            }
        }

        let (kind, snapshot, revision) = {
            let mut state = self.inner.state.write();
            let (kind, snapshot) =
                state.upsert(&key, data, options.overwrite, self.inner.config.versioning);
            let revision = state.bump();
            // Emitted under the write lock so events arrive in revision order.
            if !options.batch {
                self.inner
                    .events
                    .emit(StoreEvent::record(revision, kind, key.clone()));
            }
            (kind, snapshot, revision)
        };
        self.inner.stats.record_write();
        tracing::debug!(key = %key, ?kind, revision, batch = options.batch, "record stored");

        if !options.batch {
            self.inner.views.lock().clear();
        }
        Ok(snapshot)
    }

    /// Derives a key from the configured primary-key field, or generates
    /// one.
    pub(crate) fn derive_key(&self, data: &Fields) -> String {
        self.inner
            .config
            .key
            .as_ref()
            .and_then(|field| data.get(field))
            .filter(|value| !value.is_null())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), Value::key_string)
    }

    /// Deletes a record and its version history.
    ///
    /// In batch mode the slot becomes a tombstone. Otherwise a configured
    /// remote is reconciled first (DELETE), and later records are either
    /// shifted down in place or, with `options.reindex`, rebuilt by a full
    /// reindex.
    ///
    /// # Errors
    ///
    /// `RecordNotFound`, remote errors, or `Poisoned`.
    pub async fn del(
        &self,
        target: impl Into<Target>,
        options: DelOptions,
    ) -> StoreResult<RecordSnapshot> {
        let result = self.del_inner(target.into(), options).await;
        self.track(result)
    }

    async fn del_inner(&self, target: Target, options: DelOptions) -> StoreResult<RecordSnapshot> {
        self.ensure_usable()?;
        let key = {
            let state = self.inner.state.read();
            state
                .resolve(&target)
                .and_then(|position| state.record_at(position))
                .map(|record| record.key.clone())
        }
        .ok_or_else(|| StoreError::not_found(target.describe()))?;

        if !options.batch {
            if let Some(remote) = &self.inner.remote {
                remote.delete(&key).await?;
            }
        }

        let (removed, revision) = {
            let mut state = self.inner.state.write();
            let removed = state
                .indexes
                .position_of(&key)
                .and_then(|position| {
                    let removed = state.remove(position, options.batch)?;
                    if !options.batch && !options.reindex {
                        state.compact_from(position);
                    }
                    Some(removed)
                })
                .ok_or_else(|| StoreError::not_found(&key))?;
            if !options.batch && options.reindex {
                state.reindex().map_err(|e| self.poison(&e))?;
                self.inner.stats.record_reindex();
            }
            let revision = state.bump();
            if !options.batch {
                self.inner.events.emit(StoreEvent::record(
                    revision,
                    EventKind::Deleted,
                    key.clone(),
                ));
            }
            (removed, revision)
        };
        self.inner.stats.record_delete();
        tracing::debug!(key = %key, revision, batch = options.batch, reindex = options.reindex, "record deleted");

        if !options.batch {
            self.inner.views.lock().clear();
        }
        Ok(removed.snapshot())
    }

    /// Rebuilds the dense collection and every index from scratch.
    ///
    /// Idempotent. A failure poisons the store.
    ///
    /// # Errors
    ///
    /// `Poisoned`.
    pub fn reindex(&self) -> StoreResult<()> {
        self.ensure_usable()?;
        let revision = {
            let mut state = self.inner.state.write();
            state.reindex().map_err(|e| self.poison(&e))?;
            let revision = state.bump();
            self.inner
                .events
                .emit(StoreEvent::store(revision, EventKind::Reindexed));
            revision
        };
        self.inner.stats.record_reindex();
        self.inner.views.lock().clear();
        tracing::debug!(revision, "reindexed");
        Ok(())
    }

    /// Returns the records matching `query`, in position order.
    ///
    /// Uses the index fast path when the query has no predicates and its
    /// fields match a declared index; otherwise scans a snapshot, possibly
    /// on the worker pool.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` for an empty query, or `Poisoned`.
    pub async fn select(&self, query: &Where) -> StoreResult<Vec<RecordSnapshot>> {
        let result = self.select_inner(query).await;
        self.track(result)
    }

    async fn select_inner(&self, query: &Where) -> StoreResult<Vec<RecordSnapshot>> {
        self.ensure_usable()?;
        let expr = query.compile()?;

        let records = {
            let state = self.inner.state.read();
            match QueryPlan::choose(query, &state.indexes) {
                QueryPlan::IndexLookup { signature, bucket } => {
                    tracing::debug!(signature = %signature, bucket = %bucket, "select via index");
                    self.inner.stats.record_index_lookup();
                    let positions = state.indexes.lookup(&signature, &bucket);
                    return Ok(state.snapshot_positions(&positions));
                }
                QueryPlan::FullScan => Arc::new(state.snapshot_live()),
            }
        };
        tracing::debug!(signature = %query.signature(), records = records.len(), "select via scan");
        self.inner.stats.record_scan();

        let found = self
            .offload(records.len(), || {
                let records = Arc::clone(&records);
                let expr = expr.clone();
                move || scan(&records, &expr)
            })
            .await;
        Ok(found)
    }

    /// Returns records ordered by `order`, optionally filtered first.
    ///
    /// A cached view is returned while the store revision is unchanged,
    /// unless `force_recreate` is set. Filters with predicates are never
    /// cached.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` for a malformed filter, or `Poisoned`.
    pub async fn sort(
        &self,
        order: &OrderBy,
        force_recreate: bool,
        query: Option<&Where>,
    ) -> StoreResult<Vec<RecordSnapshot>> {
        let result = self.sort_inner(order, force_recreate, query).await;
        self.track(result)
    }

    async fn sort_inner(
        &self,
        order: &OrderBy,
        force_recreate: bool,
        query: Option<&Where>,
    ) -> StoreResult<Vec<RecordSnapshot>> {
        self.ensure_usable()?;
        let view_key = ViewCache::key_for(order, query);
        let revision = self.revision();

        if force_recreate {
            self.inner.views.lock().clear();
        } else if let Some(key) = &view_key {
            let cached = self.inner.views.lock().get(key, revision);
            if let Some(view) = cached {
                tracing::debug!(view = %key, revision, "sort served from view");
                self.inner.stats.record_view_hit();
                return Ok(Arc::unwrap_or_clone(view));
            }
        }

        let records = match query {
            Some(query) => self.select_inner(query).await?,
            None => self.inner.state.read().snapshot_live(),
        };
        self.inner.stats.record_sort();
        if records.is_empty() {
            return Ok(records);
        }

        let records = Arc::new(records);
        let sorted = self
            .offload(records.len(), || {
                let records = Arc::clone(&records);
                let order = order.clone();
                move || bucket_sort(Arc::unwrap_or_clone(records), &order)
            })
            .await;

        if let Some(key) = view_key {
            let state = self.inner.state.read();
            if state.revision == revision {
                self.inner
                    .views
                    .lock()
                    .put(key, revision, Arc::new(sorted.clone()));
            }
        }
        Ok(sorted)
    }

    async fn offload<T, F, M>(&self, records: usize, make_job: M) -> T
    where
        M: FnMut() -> F,
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let pool = self
            .inner
            .workers
            .as_ref()
            .filter(|_| records >= self.inner.config.offload_threshold);
        let (value, path) = worker::offload(pool, make_job).await;
        match path {
            ExecutionPath::Worker => self.inner.stats.record_worker_dispatch(),
            ExecutionPath::Fallback => {
                self.inner.stats.record_worker_dispatch();
                self.inner.stats.record_worker_fallback();
            }
            ExecutionPath::Inline => {}
        }
        value
    }

    /// Restores a retained version of `key` by overwriting the record.
    ///
    /// Without a label the oldest retained version is used. The restore is
    /// itself an update, so it records a new version.
    ///
    /// # Errors
    ///
    /// `NoPreviousVersion` when nothing matching is retained.
    pub async fn undo(&self, key: &str, label: Option<&str>) -> StoreResult<RecordSnapshot> {
        let fields = {
            let state = self.inner.state.read();
            match label {
                Some(label) => state.versions.get(key, label).cloned(),
                None => state.versions.oldest(key).map(|(_, fields)| fields.clone()),
            }
        };
        let Some(fields) = fields else {
            return self.track(Err(StoreError::NoPreviousVersion {
                key: key.to_string(),
            }));
        };
        tracing::debug!(key, label, "undo");
        self.set(Some(key), fields, SetOptions::new().overwrite())
            .await
    }

    /// Version labels retained for `key`, oldest first.
    pub fn versions(&self, key: &str) -> Vec<String> {
        self.inner.state.read().versions.labels(key)
    }

    /// Distinct values of `field`, in first-seen order.
    pub fn unique(&self, field: &str) -> Vec<Value> {
        let state = self.inner.state.read();
        let mut seen = HashSet::new();
        state
            .live()
            .map(|record| record.field(field))
            .filter(|value| seen.insert(value.key_string()))
            .cloned()
            .collect()
    }

    /// The value of `field` for every record, in position order.
    pub fn only(&self, field: &str) -> Vec<Value> {
        self.inner
            .state
            .read()
            .live()
            .map(|record| record.field(field).clone())
            .collect()
    }

    /// Removes every record and version. Index declarations are kept.
    pub fn clear(&self) {
        let revision = {
            let mut state = self.inner.state.write();
            state.clear();
            let revision = state.bump();
            self.inner
                .events
                .emit(StoreEvent::store(revision, EventKind::Cleared));
            revision
        };
        self.inner.views.lock().clear();
        tracing::debug!(revision, "store cleared");
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.inner.state.read().len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current revision. Every mutation advances it.
    pub fn revision(&self) -> u64 {
        self.inner.state.read().revision
    }

    /// Live keys in position order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .state
            .read()
            .live()
            .map(|record| record.key.clone())
            .collect()
    }

    /// Lists index invariant violations. Empty when consistent.
    pub fn verify(&self) -> Vec<String> {
        self.inner.state.read().check_consistency()
    }

    /// Operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Receives every future change event.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Retained events after `cursor`, up to `limit`.
    pub fn poll_events(&self, cursor: u64, limit: usize) -> Vec<StoreEvent> {
        self.inner.events.poll(cursor, limit)
    }

    /// Returns true once a failed reindex has made the store unusable.
    pub fn is_poisoned(&self) -> bool {
        self.inner.poisoned.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_usable(&self) -> StoreResult<()> {
        if self.is_poisoned() {
            return Err(StoreError::Poisoned);
        }
        Ok(())
    }

    pub(crate) fn poison(&self, cause: &StoreError) -> StoreError {
        tracing::error!(error = %cause, store = %self.name(), "reindex failed, store poisoned");
        self.inner.poisoned.store(true, Ordering::Release);
        StoreError::Poisoned
    }

    pub(crate) fn track<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if result.is_err() {
            self.inner.stats.record_error();
        }
        result
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("name", &self.name())
            .field("records", &self.len())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}
