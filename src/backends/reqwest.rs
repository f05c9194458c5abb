//! Transport backend over a shared [`reqwest::Client`].

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::errors::{ExecuteError, ExecuteResult};
use crate::executor::Executor;
use crate::types::{BackendResponse, RequestData, Response};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal executor performing the actual network call with reqwest.
///
/// The effective timeout is the request override, else the backend default.
/// With `auto_read_body` (on by default, overridable per request) the body
/// is drained and cached at execution time, so closing the response later
/// cannot lose data.
pub struct ReqwestBackend {
    client: Client,
    default_timeout: Duration,
    auto_read_body: bool,
}

impl ReqwestBackend {
    /// Build a backend with its own client and the given default timeout.
    pub fn new(default_timeout: Duration) -> ExecuteResult<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(20)
            .build()
            .map_err(|e| {
                ExecuteError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self::from_client(client, default_timeout))
    }

    /// Build a backend around an existing client (custom TLS, proxies, ...).
    pub fn from_client(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
            auto_read_body: true,
        }
    }

    /// Set the default eager-body-read behavior.
    pub fn with_auto_read_body(mut self, auto_read_body: bool) -> Self {
        self.auto_read_body = auto_read_body;
        self
    }
}

#[async_trait]
impl Executor for ReqwestBackend {
    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let auto_read_body = request.auto_read_body.unwrap_or(self.auto_read_body);

        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            ExecuteError::Configuration(format!("invalid HTTP method {:?}: {e}", request.method))
        })?;

        let mut builder = self
            .client
            .request(method, request.url.clone())
            .timeout(timeout);
        if let Some(params) = &request.params {
            builder = builder.query(params);
        }
        if let Some(json) = &request.json {
            builder = builder.json(json);
        }
        if let Some(data) = &request.data {
            builder = builder.body(data.clone());
        }
        if let Some(headers) = &request.headers {
            builder = builder.headers(headers.clone());
        }
        if let Some(form) = request.options.get("form") {
            builder = builder.form(form);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();

        let mut handle = ReqwestResponseHandle::new(resp);
        let body = if auto_read_body {
            Some(handle.read_cached().await?)
        } else {
            None
        };

        let mut response = Response::new(
            request.method.clone(),
            request.url.clone(),
            status,
            headers,
            Box::new(handle),
        );
        if let Some(body) = body {
            response = response.with_body(body);
        }
        Ok(response)
    }
}

/// [`BackendResponse`] over a native [`reqwest::Response`].
///
/// Reading the body consumes the native response (reqwest's body read takes
/// ownership); the bytes stay cached in the handle afterwards.
pub struct ReqwestResponseHandle {
    original: Option<reqwest::Response>,
    body: Option<Bytes>,
}

impl ReqwestResponseHandle {
    fn new(original: reqwest::Response) -> Self {
        Self {
            original: Some(original),
            body: None,
        }
    }

    /// The native response, while the body has not been read or closed.
    pub fn original(&self) -> Option<&reqwest::Response> {
        self.original.as_ref()
    }

    async fn read_cached(&mut self) -> ExecuteResult<Bytes> {
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }
        let original = self.original.take().ok_or_else(|| {
            ExecuteError::Transport("response body already consumed".to_string())
        })?;
        let body = original.bytes().await?;
        self.body = Some(body.clone());
        Ok(body)
    }
}

#[async_trait]
impl BackendResponse for ReqwestResponseHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn read(&mut self) -> ExecuteResult<Bytes> {
        self.read_cached().await
    }

    async fn close(&mut self) -> ExecuteResult<()> {
        // Dropping the native response releases the connection stream.
        self.original = None;
        Ok(())
    }
}
