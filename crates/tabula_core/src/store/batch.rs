//! Bulk set and delete.

use crate::error::{StoreError, StoreResult};
use crate::events::{EventKind, StoreEvent};
use crate::store::record_store::RecordStore;
use tabula_value::{Fields, Value};
use tokio::task::JoinSet;

/// The operation applied to every batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    /// Create or merge-update each item (an object).
    Set,
    /// Delete each item (a key, or an object carrying the primary key).
    Del,
}

/// Per-item results of a batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Keys of the items that were applied, in input order.
    pub succeeded: Vec<String>,
    /// Input index and error of every item that failed.
    pub failed: Vec<(usize, StoreError)>,
}

impl BatchOutcome {
    /// Number of items in the batch.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Returns true if every item was applied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// The applied keys, or `BatchFailed` if any item failed.
    ///
    /// # Errors
    ///
    /// `BatchFailed` when at least one item failed.
    pub fn into_result(self) -> StoreResult<Vec<String>> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(StoreError::BatchFailed {
                failed: self.failed.len(),
                total: self.total(),
            })
        }
    }
}

#[derive(Debug)]
enum Prepared {
    Set { key: String, fields: Fields },
    Del { key: String },
}

fn prepare(
    op: BatchOp,
    key_field: Option<&str>,
    key: Option<String>,
    item: Value,
) -> StoreResult<Prepared> {
    let from_key_field = |fields: &Fields| {
        key_field
            .and_then(|field| fields.get(field))
            .filter(|value| !value.is_null())
            .map(Value::key_string)
    };

    match (op, item) {
        (BatchOp::Set, Value::Map(fields)) => {
            let key = key
                .or_else(|| from_key_field(&fields))
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            Ok(Prepared::Set { key, fields })
        }
        (BatchOp::Set, other) => Err(StoreError::expected_object(format!(
            "batch set item is {}",
            other.kind()
        ))),
        (BatchOp::Del, Value::Map(fields)) => key
            .or_else(|| from_key_field(&fields))
            .map(|key| Prepared::Del { key })
            .ok_or_else(|| StoreError::invalid_arguments("batch delete item carries no key")),
        (BatchOp::Del, Value::Null) => {
            Err(StoreError::invalid_arguments("batch delete item is null"))
        }
        (BatchOp::Del, other) => Ok(Prepared::Del {
            key: key.unwrap_or_else(|| other.key_string()),
        }),
    }
}

impl RecordStore {
    /// Applies `op` to every item, then reindexes once.
    ///
    /// With `sync` the store is cleared first. Items are prepared
    /// concurrently and applied in input order; a failing item does not stop
    /// the others. Exactly one `Batch` event is emitted.
    ///
    /// # Errors
    ///
    /// `BatchFailed` if any item failed (the rest are still applied), or
    /// `Poisoned`.
    pub async fn batch(
        &self,
        op: BatchOp,
        items: Vec<Value>,
        sync: bool,
    ) -> StoreResult<BatchOutcome> {
        let outcome = self.batch_detailed(op, items, sync).await?;
        if outcome.is_complete() {
            return Ok(outcome);
        }
        self.track(Err(StoreError::BatchFailed {
            failed: outcome.failed.len(),
            total: outcome.total(),
        }))
    }

    /// Like [`batch`](Self::batch), but reports per-item failures in the
    /// outcome instead of as an error.
    ///
    /// # Errors
    ///
    /// `Poisoned`.
    pub async fn batch_detailed(
        &self,
        op: BatchOp,
        items: Vec<Value>,
        sync: bool,
    ) -> StoreResult<BatchOutcome> {
        let keyed = items.into_iter().map(|item| (None, item)).collect();
        self.batch_keyed(op, keyed, sync).await
    }

    /// Runs a batch whose items may carry an explicit key.
    pub(crate) async fn batch_keyed(
        &self,
        op: BatchOp,
        items: Vec<(Option<String>, Value)>,
        sync: bool,
    ) -> StoreResult<BatchOutcome> {
        self.ensure_usable()?;
        let total = items.len();
        let key_field = self.inner.config.key.clone();

        let mut tasks = JoinSet::new();
        for (index, (key, item)) in items.into_iter().enumerate() {
            let key_field = key_field.clone();
            tasks.spawn(async move { (index, prepare(op, key_field.as_deref(), key, item)) });
        }

        let mut prepared: Vec<Option<StoreResult<Prepared>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => prepared[index] = Some(result),
                Err(err) => tracing::error!(error = %err, "batch item task failed"),
            }
        }

        let mut outcome = BatchOutcome::default();
        let revision = {
            let mut state = self.inner.state.write();
            if sync {
                state.clear();
            }
            for (index, slot) in prepared.into_iter().enumerate() {
                let result = slot
                    .unwrap_or_else(|| Err(StoreError::invalid_arguments("batch item task failed")))
                    .and_then(|item| match item {
                        Prepared::Set { key, fields } => {
                            state.upsert(&key, fields, false, self.inner.config.versioning);
                            self.inner.stats.record_write();
                            Ok(key)
                        }
                        Prepared::Del { key } => {
                            state
                                .indexes
                                .position_of(&key)
                                .and_then(|position| state.remove(position, true))
                                .ok_or_else(|| StoreError::not_found(&key))?;
                            self.inner.stats.record_delete();
                            Ok(key)
                        }
                    });
                match result {
                    Ok(key) => outcome.succeeded.push(key),
                    Err(err) => {
                        tracing::debug!(index, error = %err, "batch item failed");
                        self.inner.stats.record_error();
                        outcome.failed.push((index, err));
                    }
                }
            }
            state.reindex().map_err(|e| self.poison(&e))?;
            let revision = state.bump();
            self.inner
                .events
                .emit(StoreEvent::store(revision, EventKind::Batch));
            revision
        };
        self.inner.stats.record_reindex();
        self.inner.views.lock().clear();
        tracing::debug!(
            ?op,
            total,
            failed = outcome.failed.len(),
            sync,
            revision,
            "batch applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::query::Where;
    use tabula_value::fields;

    fn store() -> RecordStore {
        RecordStore::new(StoreConfig::new().key("id").index(["age"]).use_workers(false)).unwrap()
    }

    fn people() -> Vec<Value> {
        [(1, 30), (2, 25), (3, 25)]
            .into_iter()
            .map(|(id, age)| Value::Map(fields([("id", id), ("age", age)])))
            .collect()
    }

    #[tokio::test]
    async fn batch_set_applies_in_order() {
        let store = store();
        let rx = store.subscribe();
        let outcome = store.batch(BatchOp::Set, people(), false).await.unwrap();

        assert_eq!(outcome.succeeded, vec!["1", "2", "3"]);
        assert_eq!(store.keys(), vec!["1", "2", "3"]);
        assert!(store.verify().is_empty());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Batch);
        assert_eq!(store.stats().reindexes, 1);
    }

    #[tokio::test]
    async fn batch_del_compacts_once() {
        let store = store();
        store.batch(BatchOp::Set, people(), false).await.unwrap();
        store
            .batch(BatchOp::Del, vec![Value::from("1"), Value::from(3)], false)
            .await
            .unwrap();

        assert_eq!(store.keys(), vec!["2"]);
        assert_eq!(store.record("2").unwrap().position, 0);
        let found = store.select(&Where::new().eq("age", 25)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(store.verify().is_empty());
    }

    #[tokio::test]
    async fn failures_are_aggregated() {
        let store = store();
        let mut items = people();
        items.insert(1, Value::from("not an object"));

        let err = store.batch(BatchOp::Set, items.clone(), false).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchFailed { failed: 1, total: 4 }));
        assert_eq!(store.len(), 3);

        let outcome = store.batch_detailed(BatchOp::Set, items, false).await.unwrap();
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, 1);
        assert!(matches!(outcome.failed[0].1, StoreError::ExpectedObject { .. }));
    }

    #[tokio::test]
    async fn missing_delete_fails_item() {
        let store = store();
        store.batch(BatchOp::Set, people(), false).await.unwrap();
        let outcome = store
            .batch_detailed(BatchOp::Del, vec![Value::from("9"), Value::from("2")], false)
            .await
            .unwrap();

        assert_eq!(outcome.succeeded, vec!["2"]);
        assert!(matches!(outcome.failed[0].1, StoreError::RecordNotFound { .. }));
        assert!(outcome.into_result().is_err());
    }

    #[tokio::test]
    async fn sync_replaces_contents() {
        let store = store();
        store.batch(BatchOp::Set, people(), false).await.unwrap();
        let replacement = vec![Value::Map(fields([("id", 7), ("age", 40)]))];
        store.batch(BatchOp::Set, replacement, true).await.unwrap();

        assert_eq!(store.keys(), vec!["7"]);
        assert!(store.verify().is_empty());
    }
}
