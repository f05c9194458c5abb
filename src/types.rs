//! Request and response value types flowing through the pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use url::Url;

use crate::errors::{ExecuteError, ExecuteResult};

/// A single logical HTTP request as it travels down the executor chain.
///
/// Constructed once per call; addons mutate it in place (most commonly the
/// header map). The retry loop snapshots `headers` before the first attempt
/// and restores the snapshot before every attempt, so addon mutations never
/// leak across attempts.
#[derive(Debug, Clone)]
pub struct RequestData {
    /// HTTP method, preserved exactly as given.
    pub method: String,
    /// Target URL.
    pub url: Url,
    /// Query parameters, unique keys.
    pub params: Option<HashMap<String, String>>,
    /// JSON payload.
    pub json: Option<serde_json::Value>,
    /// Raw body, mutually exclusive with `json` by convention.
    pub data: Option<Bytes>,
    /// Header multi-map. Case-insensitive keys, insertion order preserved.
    pub headers: Option<HeaderMap>,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
    /// Per-request override of the backend's eager-body-read behavior.
    pub auto_read_body: Option<bool>,
    /// Open bag of backend-specific options (e.g. `form` for the reqwest
    /// backend, `path_template` consumed by the metrics executor).
    pub options: HashMap<String, serde_json::Value>,
}

impl RequestData {
    /// Create a request with the given method and URL.
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into(),
            url,
            params: None,
            json: None,
            data: None,
            headers: None,
            timeout: None,
            auto_read_body: None,
            options: HashMap::new(),
        }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Create a POST request.
    pub fn post(url: Url) -> Self {
        Self::new("POST", url)
    }

    /// Create a PUT request.
    pub fn put(url: Url) -> Self {
        Self::new("PUT", url)
    }

    /// Create a PATCH request.
    pub fn patch(url: Url) -> Self {
        Self::new("PATCH", url)
    }

    /// Create a DELETE request.
    pub fn delete(url: Url) -> Self {
        Self::new("DELETE", url)
    }

    /// Set the query parameters.
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = Some(params);
        self
    }

    /// Set the JSON payload.
    pub fn with_json(mut self, json: serde_json::Value) -> Self {
        self.json = Some(json);
        self
    }

    /// Set the raw body.
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace the header map wholesale.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Append a single header, creating the map if needed.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers_mut().append(name, value);
        self
    }

    /// Set the per-request timeout override.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-request auto-read-body override.
    pub fn with_auto_read_body(mut self, auto_read_body: bool) -> Self {
        self.auto_read_body = Some(auto_read_body);
        self
    }

    /// Attach a backend-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Mutable access to the header map, creating it on first use.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.headers.get_or_insert_with(HeaderMap::new)
    }
}

/// Handle over the backend-native response object.
///
/// Exposes a cached byte read, a resource-releasing close, and a downcast
/// hook for reaching the native object while it is still held.
#[async_trait]
pub trait BackendResponse: Send + Sync {
    /// Downcast access to the concrete handle.
    fn as_any(&self) -> &dyn Any;

    /// Read the body, caching it so repeated reads are cheap and a later
    /// `close` cannot lose data.
    async fn read(&mut self) -> ExecuteResult<Bytes>;

    /// Release backend resources (connection, stream). Must be safe to call
    /// more than once.
    async fn close(&mut self) -> ExecuteResult<()>;
}

/// Response produced by the terminal backend and unwound back up the chain.
///
/// A response is a scoped resource: whoever ends up owning it calls
/// [`Response::close`], except when an [`ExecuteError::Http`] takes ownership
/// via the error payload.
pub struct Response {
    /// Method of the originating request.
    pub method: String,
    /// URL of the originating request.
    pub url: Url,
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    backend: Box<dyn BackendResponse>,
    body: Option<Bytes>,
    closed: bool,
}

impl Response {
    /// Wrap a backend response handle.
    pub fn new(
        method: impl Into<String>,
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        backend: Box<dyn BackendResponse>,
    ) -> Self {
        Self {
            method: method.into(),
            url,
            status,
            headers,
            backend,
            body: None,
            closed: false,
        }
    }

    /// Pre-populate the cached body (used by backends with eager reads).
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Read the body. The first read delegates to the backend handle and
    /// caches the bytes; subsequent reads return the cache.
    pub async fn read(&mut self) -> ExecuteResult<Bytes> {
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }
        let body = self.backend.read().await?;
        self.body = Some(body.clone());
        Ok(body)
    }

    /// Body bytes if they have already been read.
    pub fn cached_body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Release backend resources. Idempotent: the second and later calls
    /// are no-ops.
    pub async fn close(&mut self) -> ExecuteResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.backend.close().await
    }

    /// Borrow the backend handle, e.g. to downcast to the native wrapper.
    pub fn backend(&self) -> &dyn BackendResponse {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_cached", &self.body.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Helper used where an invalid header value must become a pipeline error.
pub(crate) fn header_value(value: &str) -> ExecuteResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ExecuteError::Addon(format!("invalid header value: {e}")))
}
