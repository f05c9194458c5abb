//! Hand-rolled mocks shared by the unit tests.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, StatusCode};
use parking_lot::Mutex;
use tokio::time::sleep;
use url::Url;

use crate::addons::{Addon, Retryable};
use crate::errors::{ExecuteError, ExecuteResult};
use crate::executor::Executor;
use crate::types::{BackendResponse, RequestData, Response};

/// A GET request against a fixed https URL.
pub fn request_simple() -> RequestData {
    RequestData::get(Url::parse("https://api.example.com/items").expect("static url"))
}

/// A response with the given status and headers over an empty body.
pub fn response_with_status(status: u16, headers: &[(&str, &str)]) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).expect("test header name"),
            HeaderValue::from_str(value).expect("test header value"),
        );
    }
    Response::new(
        "GET",
        Url::parse("https://api.example.com/items").expect("static url"),
        StatusCode::from_u16(status).expect("test status"),
        map,
        Box::new(StaticBackendResponse::new(Bytes::new())),
    )
}

/// An [`ExecuteError::Http`] carrying a response with the given status.
pub fn http_error(status: u16) -> ExecuteError {
    ExecuteError::Http(Box::new(response_with_status(status, &[])))
}

/// Backend response handle over fixed bytes, counting reads and closes.
pub struct StaticBackendResponse {
    body: Bytes,
    reads: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl StaticBackendResponse {
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            reads: Arc::new(AtomicU32::new(0)),
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Counter of backend-level reads (cache misses).
    pub fn reads_handle(&self) -> Arc<AtomicU32> {
        self.reads.clone()
    }

    /// Counter of backend-level closes.
    pub fn closed_handle(&self) -> Arc<AtomicU32> {
        self.closes.clone()
    }
}

#[async_trait]
impl BackendResponse for StaticBackendResponse {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn read(&mut self) -> ExecuteResult<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }

    async fn close(&mut self) -> ExecuteResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

enum ScriptedOutcome {
    Respond {
        status: StatusCode,
        headers: HeaderMap,
    },
    Fail(ExecuteError),
}

/// Terminal executor driven by a script of outcomes.
///
/// Outcomes are consumed in order; when the script runs dry the fallback
/// status (if any) answers every further call.
pub struct MockBackend {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    fallback: Option<StatusCode>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl MockBackend {
    /// A backend with an empty script and no fallback.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// A backend answering every call with the given status.
    pub fn always(status: u16) -> Self {
        Self {
            fallback: Some(StatusCode::from_u16(status).expect("test status")),
            ..Self::new()
        }
    }

    /// Sleep this long inside every `execute`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a plain response.
    pub fn push_status(&self, status: u16) {
        self.push_response(status, &[]);
    }

    /// Script a response with headers.
    pub fn push_response(&self, status: u16, headers: &[(&str, &str)]) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).expect("test header name"),
                HeaderValue::from_str(value).expect("test header value"),
            );
        }
        self.script.lock().push_back(ScriptedOutcome::Respond {
            status: StatusCode::from_u16(status).expect("test status"),
            headers: map,
        });
    }

    /// Script a failure.
    pub fn push_error(&self, error: ExecuteError) {
        self.script.lock().push_back(ScriptedOutcome::Fail(error));
    }

    /// How many times `execute` ran.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for MockBackend {
    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let scripted = self.script.lock().pop_front();
        let (status, headers) = match scripted {
            Some(ScriptedOutcome::Respond { status, headers }) => (status, headers),
            Some(ScriptedOutcome::Fail(error)) => return Err(error),
            None => match self.fallback {
                Some(status) => (status, HeaderMap::new()),
                None => {
                    return Err(ExecuteError::Configuration(
                        "mock script exhausted".to_string(),
                    ))
                }
            },
        };

        Ok(Response::new(
            request.method.clone(),
            request.url.clone(),
            status,
            headers,
            Box::new(StaticBackendResponse::new(Bytes::new())),
        ))
    }
}

/// Addon recording every hook invocation, optionally appending a header in
/// `before_request` to probe snapshot isolation.
pub struct RecordingAddon {
    events: Arc<Mutex<Vec<String>>>,
    inject: Option<(String, String)>,
}

impl RecordingAddon {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            inject: None,
        }
    }

    /// Append `name: value` to the request headers on every attempt.
    pub fn with_injected_header(mut self, name: &str, value: &str) -> Self {
        self.inject = Some((name.to_string(), value.to_string()));
        self
    }

    /// Shared view of the recorded events.
    pub fn events(&self) -> Arc<Mutex<Vec<String>>> {
        self.events.clone()
    }
}

impl Default for RecordingAddon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Addon for RecordingAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        match &self.inject {
            Some((name, value)) => {
                let existing = request
                    .headers
                    .as_ref()
                    .map(|h| h.get_all(name.as_str()).iter().count())
                    .unwrap_or(0);
                self.events
                    .lock()
                    .push(format!("before_request:existing={existing}"));
                request.headers_mut().append(
                    HeaderName::from_bytes(name.as_bytes()).expect("test header name"),
                    HeaderValue::from_str(value).expect("test header value"),
                );
            }
            None => self.events.lock().push("before_request".to_string()),
        }
        Ok(())
    }

    async fn process_response(
        &self,
        _request: &RequestData,
        response: Response,
    ) -> ExecuteResult<Response> {
        self.events
            .lock()
            .push(format!("process_response:{}", response.status.as_u16()));
        Ok(response)
    }

    async fn process_error(
        &self,
        _request: &RequestData,
        error: &ExecuteError,
    ) -> ExecuteResult<()> {
        self.events
            .lock()
            .push(format!("process_error:{}", error.kind()));
        Ok(())
    }
}

/// Retry-vote addon driven by a script of votes; votes `false` when the
/// script runs dry. Counts how often it is consulted.
pub struct ScriptedRetryable {
    votes: Mutex<VecDeque<(bool, Option<Duration>)>>,
    consulted: Arc<AtomicU32>,
}

impl ScriptedRetryable {
    pub fn new(votes: impl IntoIterator<Item = (bool, Option<Duration>)>) -> Self {
        Self {
            votes: Mutex::new(votes.into_iter().collect()),
            consulted: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Shared consultation counter.
    pub fn consulted(&self) -> Arc<AtomicU32> {
        self.consulted.clone()
    }
}

#[async_trait]
impl Retryable for ScriptedRetryable {
    async fn need_retry(&self, _response: &Response) -> (bool, Option<Duration>) {
        self.consulted.fetch_add(1, Ordering::SeqCst);
        self.votes.lock().pop_front().unwrap_or((false, None))
    }
}
