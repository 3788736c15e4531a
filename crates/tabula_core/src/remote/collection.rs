//! Reconciliation with a remote collection endpoint.

use crate::error::{StoreError, StoreResult};
use crate::remote::cache::HttpCache;
use crate::remote::http::{classify, HttpClient, HttpResponse, Method};
use parking_lot::Mutex;
use std::sync::Arc;
use tabula_value::{fields_to_json, Fields};

/// A remote collection: the collection URI plus one URI per record key.
///
/// Reads are served from the [`HttpCache`] while fresh. Permission failures
/// clear the method's bit in the cache, and later calls for a refused method
/// fail without a request until the entry expires.
pub struct RemoteCollection {
    client: Arc<dyn HttpClient>,
    uri: String,
    headers: Vec<(String, String)>,
    cache: Mutex<HttpCache>,
}

impl RemoteCollection {
    /// Creates a remote collection at `uri`.
    pub fn new(
        client: Arc<dyn HttpClient>,
        uri: impl Into<String>,
        headers: Vec<(String, String)>,
        cache: HttpCache,
    ) -> Self {
        Self {
            client,
            uri: uri.into(),
            headers,
            cache: Mutex::new(cache),
        }
    }

    /// The collection URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI of the record with `key`.
    pub fn record_uri(&self, key: &str) -> String {
        format!("{}/{key}", self.uri.trim_end_matches('/'))
    }

    /// Fetches the collection, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Transport, permission and server errors.
    pub async fn fetch(&self) -> StoreResult<serde_json::Value> {
        let cached = self.cache.lock().get(&self.uri);
        if let Some(body) = cached.and_then(|entry| entry.body) {
            tracing::debug!(uri = %self.uri, "collection served from http cache");
            return Ok(body);
        }

        let response = self.send(&self.uri, Method::Get, None).await?;
        let permissions = response.permissions().unwrap_or_default();
        self.cache
            .lock()
            .put(&self.uri, response.body.clone(), permissions);
        Ok(response.body)
    }

    /// POSTs a new record to the collection.
    ///
    /// # Errors
    ///
    /// Transport, permission and server errors.
    pub async fn create(&self, fields: &Fields) -> StoreResult<()> {
        self.send(&self.uri, Method::Post, Some(fields_to_json(fields)))
            .await?;
        self.cache.lock().invalidate(&self.uri);
        Ok(())
    }

    /// PUTs a record's new fields.
    ///
    /// # Errors
    ///
    /// Transport, permission and server errors.
    pub async fn update(&self, key: &str, fields: &Fields) -> StoreResult<()> {
        let uri = self.record_uri(key);
        self.send(&uri, Method::Put, Some(fields_to_json(fields)))
            .await?;
        self.cache.lock().invalidate(&self.uri);
        Ok(())
    }

    /// DELETEs a record.
    ///
    /// # Errors
    ///
    /// Transport, permission and server errors.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let uri = self.record_uri(key);
        self.send(&uri, Method::Delete, None).await?;
        self.cache.lock().invalidate(&self.uri);
        Ok(())
    }

    async fn send(
        &self,
        uri: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> StoreResult<HttpResponse> {
        if !self.cache.lock().permissions(uri).allows(method) {
            tracing::warn!(uri, %method, "method refused by cached permissions");
            return Err(StoreError::MethodNotAllowed {
                uri: uri.to_string(),
                method: method.to_string(),
            });
        }

        let response = self
            .client
            .request(uri, method, body, &self.headers)
            .await
            .map_err(StoreError::Transport)?;

        if let Err(err) = classify(&response, uri, method) {
            if err.is_permission_error() {
                tracing::warn!(uri, %method, status = response.status, "permission denied");
                self.cache.lock().deny(uri, method);
            }
            return Err(err);
        }
        Ok(response)
    }
}

impl std::fmt::Debug for RemoteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCollection")
            .field("uri", &self.uri)
            .field("headers", &self.headers.len())
            .finish_non_exhaustive()
    }
}
