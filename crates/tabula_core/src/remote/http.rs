//! HTTP collaborator interface.

use crate::error::{StoreError, StoreResult};
use std::fmt;

/// HTTP methods used against a remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read the collection or a record.
    Get,
    /// Create a record.
    Post,
    /// Replace a record.
    Put,
    /// Delete a record.
    Delete,
    /// Partially update a record.
    Patch,
}

impl Method {
    /// All methods, in permission bit order.
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Parses a method name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(name.trim()))
    }

    fn bit(self) -> u8 {
        match self {
            Self::Get => 1,
            Self::Post => 1 << 1,
            Self::Put => 1 << 2,
            Self::Delete => 1 << 3,
            Self::Patch => 1 << 4,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Methods a remote resource accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions(u8);

impl Permissions {
    /// Every method allowed.
    pub const ALL: Permissions = Permissions(0b1_1111);

    /// Nothing allowed.
    pub const NONE: Permissions = Permissions(0);

    /// Parses an `Allow` header such as `GET, POST, HEAD`.
    ///
    /// Unknown methods are ignored.
    pub fn from_allow(header: &str) -> Self {
        header
            .split(',')
            .filter_map(Method::parse)
            .fold(Self::NONE, |acc, method| acc.with(method))
    }

    /// Returns true if `method` is allowed.
    pub fn allows(self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }

    /// Adds `method`.
    #[must_use]
    pub fn with(self, method: Method) -> Self {
        Self(self.0 | method.bit())
    }

    /// Removes `method`.
    #[must_use]
    pub fn without(self, method: Method) -> Self {
        Self(self.0 & !method.bit())
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::ALL
    }
}

/// A response from the HTTP collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Decoded JSON body (`Null` when empty).
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// A response with `status` and a JSON body.
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header, ignoring case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Permissions advertised by the `Allow` header, if present.
    pub fn permissions(&self) -> Option<Permissions> {
        self.header_value("allow").map(Permissions::from_allow)
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP requests on behalf of a store.
///
/// Implement this trait to plug in an actual HTTP library. The store only
/// interprets status codes, the `Allow` header and JSON bodies.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request. `Err` means no response was received.
    async fn request(
        &self,
        uri: &str,
        method: Method,
        body: Option<serde_json::Value>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, String>;
}

/// Maps a response status onto the store's error kinds.
///
/// # Errors
///
/// `Unauthorized` for 401, `Forbidden` for 403, `MethodNotAllowed` for 405
/// and `ServerError` for any other non-2xx status.
pub fn classify(response: &HttpResponse, uri: &str, method: Method) -> StoreResult<()> {
    match response.status {
        200..=299 => Ok(()),
        401 => Err(StoreError::Unauthorized {
            uri: uri.to_string(),
        }),
        403 => Err(StoreError::Forbidden {
            uri: uri.to_string(),
        }),
        405 => Err(StoreError::MethodNotAllowed {
            uri: uri.to_string(),
            method: method.to_string(),
        }),
        status => Err(StoreError::ServerError {
            status,
            message: match &response.body {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            },
        }),
    }
}
