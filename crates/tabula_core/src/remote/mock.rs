//! Scripted HTTP client for tests.

use crate::remote::http::{HttpClient, HttpResponse, Method};
use parking_lot::Mutex;
use std::collections::HashMap;

/// A request seen by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Requested URI.
    pub uri: String,
    /// Method.
    pub method: Method,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
}

/// An [`HttpClient`] that answers from a script.
///
/// Responses are keyed by `(method, uri)` and reused for every matching
/// request. Unscripted requests get a 404.
///
/// # Example
///
/// ```
/// use tabula_core::remote::{HttpResponse, Method, MockHttpClient};
///
/// let client = MockHttpClient::new();
/// client.on(Method::Get, "/people", HttpResponse::new(200, serde_json::json!([])));
/// ```
#[derive(Debug, Default)]
pub struct MockHttpClient {
    script: Mutex<HashMap<(Method, String), Result<HttpResponse, String>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    /// Creates a client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method uri` with `response`.
    pub fn on(&self, method: Method, uri: impl Into<String>, response: HttpResponse) {
        self.script.lock().insert((method, uri.into()), Ok(response));
    }

    /// Fails `method uri` at the transport level.
    pub fn fail(&self, method: Method, uri: impl Into<String>, message: impl Into<String>) {
        self.script
            .lock()
            .insert((method, uri.into()), Err(message.into()));
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().clone()
    }

    /// Number of requests received for `method uri`.
    pub fn count(&self, method: Method, uri: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.method == method && r.uri == uri)
            .count()
    }
}

#[async_trait::async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        uri: &str,
        method: Method,
        body: Option<serde_json::Value>,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, String> {
        self.log.lock().push(RecordedRequest {
            uri: uri.to_string(),
            method,
            body,
        });
        self.script
            .lock()
            .get(&(method, uri.to_string()))
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, serde_json::Value::Null)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_and_default_responses() {
        let client = MockHttpClient::new();
        client.on(Method::Get, "/a", HttpResponse::new(200, json!([1])));
        client.fail(Method::Get, "/down", "connection refused");

        let ok = client.request("/a", Method::Get, None, &[]).await.unwrap();
        assert_eq!(ok.body, json!([1]));

        let missing = client.request("/b", Method::Get, None, &[]).await.unwrap();
        assert_eq!(missing.status, 404);

        let err = client.request("/down", Method::Get, None, &[]).await.unwrap_err();
        assert_eq!(err, "connection refused");

        assert_eq!(client.requests().len(), 3);
        assert_eq!(client.count(Method::Get, "/a"), 1);
    }
}
