//! Loading a store from its remote collection or a JSON payload.

use crate::error::{StoreError, StoreResult};
use crate::store::batch::BatchOp;
use crate::store::record_store::RecordStore;
use tabula_value::Value;

/// Follows a dot-separated `path` into `payload`.
fn unwrap_source(payload: Value, path: &str) -> StoreResult<Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(payload, |current, segment| match current {
            Value::Map(mut fields) => fields.remove(segment).ok_or_else(|| {
                StoreError::expected_object(format!("payload has no field {segment:?}"))
            }),
            other => Err(StoreError::expected_object(format!(
                "cannot read {segment:?} from {}",
                other.kind()
            ))),
        })
}

/// Splits a payload into batch items.
///
/// A list must hold objects. An object must map keys to objects, and the
/// keys are used as record keys when no primary-key field is configured.
fn payload_items(payload: Value, use_keys: bool) -> StoreResult<Vec<(Option<String>, Value)>> {
    let not_object = |value: &Value| !matches!(value, Value::Map(_));
    match payload {
        Value::List(items) => {
            if let Some(bad) = items.iter().find(|value| not_object(value)) {
                return Err(StoreError::expected_object(format!(
                    "list item is {}",
                    bad.kind()
                )));
            }
            Ok(items.into_iter().map(|item| (None, item)).collect())
        }
        Value::Map(entries) => {
            if let Some((key, bad)) = entries.iter().find(|(_, value)| not_object(value)) {
                return Err(StoreError::expected_object(format!(
                    "entry {key:?} is {}",
                    bad.kind()
                )));
            }
            Ok(entries
                .into_iter()
                .map(|(key, item)| (use_keys.then_some(key), item))
                .collect())
        }
        other => Err(StoreError::expected_object(format!(
            "payload is {}",
            other.kind()
        ))),
    }
}

impl RecordStore {
    /// Replaces the store's contents with the remote collection.
    ///
    /// Fetches the configured URI (through the HTTP cache), unwraps the
    /// configured source path and loads the records as a syncing batch.
    /// Returns the loaded keys.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` without a remote, `ExpectedObject` for a payload
    /// that is not a collection of objects, remote errors, or
    /// `BatchFailed`.
    pub async fn sync(&self) -> StoreResult<Vec<String>> {
        let result = self.sync_inner().await;
        self.track(result)
    }

    async fn sync_inner(&self) -> StoreResult<Vec<String>> {
        self.ensure_usable()?;
        let remote = self
            .inner
            .remote
            .as_ref()
            .ok_or_else(|| StoreError::invalid_arguments("store has no remote collection"))?;

        let payload = remote.fetch().await?;
        tracing::debug!(uri = %remote.uri(), "syncing from remote");
        self.load_inner(Value::from(payload)).await
    }

    /// Replaces the store's contents with the records of a JSON payload.
    ///
    /// The payload is read like a remote collection: the configured source
    /// path is unwrapped, then it must be a list of objects or an object of
    /// objects. Returns the loaded keys.
    ///
    /// # Errors
    ///
    /// `ExpectedObject` for a payload that is not a collection of objects,
    /// or `BatchFailed`.
    pub async fn load(&self, payload: Value) -> StoreResult<Vec<String>> {
        let result = self.load_inner(payload).await;
        self.track(result)
    }

    async fn load_inner(&self, payload: Value) -> StoreResult<Vec<String>> {
        self.ensure_usable()?;
        let payload = match &self.inner.config.source {
            Some(path) => unwrap_source(payload, path)?,
            None => payload,
        };
        let items = payload_items(payload, self.inner.config.key.is_none())?;
        tracing::debug!(items = items.len(), "loading payload");

        self.batch_keyed(BatchOp::Set, items, true)
            .await?
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::remote::{HttpClient, HttpResponse, Method, MockHttpClient};
    use serde_json::json;
    use std::sync::Arc;

    const URI: &str = "https://api.test/people";

    fn remote_store(
        config: StoreConfig,
        body: serde_json::Value,
    ) -> (RecordStore, Arc<MockHttpClient>) {
        let client = Arc::new(MockHttpClient::new());
        client.on(Method::Get, URI, HttpResponse::new(200, body));
        let store = RecordStore::with_remote(
            config.uri(URI).use_workers(false),
            Arc::clone(&client) as Arc<dyn HttpClient>,
        )
        .unwrap();
        (store, client)
    }

    #[test]
    fn source_path_unwraps_nested_fields() {
        let payload = Value::from(json!({"data": {"items": [{"id": 1}]}}));
        let items = unwrap_source(payload.clone(), "data.items").unwrap();
        assert_eq!(items.as_list().map(<[Value]>::len), Some(1));
        assert!(matches!(
            unwrap_source(payload, "data.missing"),
            Err(StoreError::ExpectedObject { .. })
        ));
    }

    #[tokio::test]
    async fn sync_loads_list_payload() {
        let (store, client) = remote_store(
            StoreConfig::new().key("id").source("data"),
            json!({"data": [{"id": 1, "age": 30}, {"id": 2, "age": 25}]}),
        );
        let keys = store.sync().await.unwrap();

        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(store.len(), 2);
        assert_eq!(client.count(Method::Get, URI), 1);
    }

    #[tokio::test]
    async fn object_payload_keys_become_record_keys() {
        let (store, _) = remote_store(
            StoreConfig::new(),
            json!({"ada": {"age": 36}, "alan": {"age": 41}}),
        );
        store.sync().await.unwrap();
        assert_eq!(store.keys(), vec!["ada", "alan"]);
    }

    #[tokio::test]
    async fn scalar_payload_is_rejected() {
        let (store, _) = remote_store(StoreConfig::new(), json!([{"id": 1}, 5]));
        assert!(matches!(store.sync().await, Err(StoreError::ExpectedObject { .. })));

        let (store, _) = remote_store(StoreConfig::new(), json!("nope"));
        assert!(matches!(store.sync().await, Err(StoreError::ExpectedObject { .. })));
    }

    #[tokio::test]
    async fn load_replaces_contents() {
        let store = RecordStore::new(StoreConfig::new().key("id").use_workers(false)).unwrap();
        store
            .load(Value::from(json!([{"id": 1}, {"id": 2}])))
            .await
            .unwrap();
        let keys = store.load(Value::from(json!([{"id": 3}]))).await.unwrap();

        assert_eq!(keys, vec!["3"]);
        assert_eq!(store.keys(), vec!["3"]);
    }

    #[tokio::test]
    async fn sync_without_remote() {
        let store = RecordStore::new(StoreConfig::new().use_workers(false)).unwrap();
        assert!(matches!(store.sync().await, Err(StoreError::InvalidArguments { .. })));
    }
}
