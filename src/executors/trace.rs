//! Span-per-request tracing.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::HeaderName;

use crate::errors::ExecuteResult;
use crate::executor::Executor;
use crate::observability::Tracer;
use crate::types::{header_value, RequestData, Response};

/// Wraps every delegated call in a span with request attributes, optionally
/// propagating the trace context via a W3C `traceparent` header.
pub struct TraceExecutor {
    inner: Arc<dyn Executor>,
    tracer: Arc<dyn Tracer>,
    span_name: String,
    inject_tracing_headers: bool,
}

impl TraceExecutor {
    /// Trace `inner` through `tracer`.
    pub fn new(inner: Arc<dyn Executor>, tracer: Arc<dyn Tracer>) -> Self {
        Self {
            inner,
            tracer,
            span_name: "http_request".to_string(),
            inject_tracing_headers: true,
        }
    }

    /// Override the span operation name.
    pub fn with_span_name(mut self, span_name: impl Into<String>) -> Self {
        self.span_name = span_name.into();
        self
    }

    /// Enable or disable `traceparent` header injection.
    pub fn with_inject_tracing_headers(mut self, inject: bool) -> Self {
        self.inject_tracing_headers = inject;
        self
    }
}

#[async_trait]
impl Executor for TraceExecutor {
    async fn start(&self) -> ExecuteResult<()> {
        self.inner.start().await
    }

    async fn close(&self) -> ExecuteResult<()> {
        self.inner.close().await
    }

    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        let mut span = self
            .tracer
            .start_span(&self.span_name)
            .with_attribute("http.request.method", &request.method)
            .with_attribute("url.scheme", request.url.scheme())
            .with_attribute("url.path", request.url.path());
        if let Some(host) = request.url.host_str() {
            span = span.with_attribute("server.address", host);
        }
        if let Some(port) = request.url.port_or_known_default() {
            span = span.with_attribute("server.port", port.to_string());
        }

        if self.inject_tracing_headers {
            let traceparent = format!("00-{}-{}-01", span.trace_id, span.span_id);
            let value = header_value(&traceparent)?;
            request
                .headers_mut()
                .insert(HeaderName::from_static("traceparent"), value);
        }

        match self.inner.execute(request).await {
            Ok(response) => {
                let span = span
                    .with_attribute(
                        "http.response.status_code",
                        response.status.as_str().to_string(),
                    )
                    .finish_with_ok();
                self.tracer.end_span(span);
                Ok(response)
            }
            Err(err) => {
                self.tracer.end_span(span.finish_with_error(err.to_string()));
                Err(err)
            }
        }
    }

    fn inner(&self) -> Option<Arc<dyn Executor>> {
        Some(self.inner.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{request_simple, MockBackend};
    use crate::observability::{RequestSpan, SpanStatus};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTracer {
        finished: Mutex<Vec<RequestSpan>>,
    }

    impl Tracer for RecordingTracer {
        fn start_span(&self, operation: &str) -> RequestSpan {
            RequestSpan::new(operation)
        }

        fn end_span(&self, span: RequestSpan) {
            self.finished.lock().push(span);
        }
    }

    #[tokio::test]
    async fn span_carries_request_attributes() {
        let tracer = Arc::new(RecordingTracer::default());
        let executor = TraceExecutor::new(Arc::new(MockBackend::always(200)), tracer.clone());

        let mut request = request_simple();
        executor.execute(&mut request).await.unwrap();

        let spans = tracer.finished.lock();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.operation, "http_request");
        assert_eq!(span.status, SpanStatus::Ok);
        let has = |k: &str, v: &str| span.attributes.iter().any(|(key, val)| key == k && val == v);
        assert!(has("http.request.method", "GET"));
        assert!(has("url.scheme", "https"));
        assert!(has("url.path", "/items"));
        assert!(has("server.address", "api.example.com"));
        assert!(has("server.port", "443"));
        assert!(has("http.response.status_code", "200"));
    }

    #[tokio::test]
    async fn traceparent_header_is_injected() {
        let tracer = Arc::new(RecordingTracer::default());
        let executor = TraceExecutor::new(Arc::new(MockBackend::always(200)), tracer.clone());

        let mut request = request_simple();
        executor.execute(&mut request).await.unwrap();

        let spans = tracer.finished.lock();
        let traceparent = request
            .headers
            .as_ref()
            .and_then(|h| h.get("traceparent"))
            .and_then(|v| v.to_str().ok())
            .expect("header injected");
        assert_eq!(
            traceparent,
            format!("00-{}-{}-01", spans[0].trace_id, spans[0].span_id)
        );
    }

    #[tokio::test]
    async fn injection_can_be_disabled() {
        let tracer = Arc::new(RecordingTracer::default());
        let executor = TraceExecutor::new(Arc::new(MockBackend::always(200)), tracer)
            .with_inject_tracing_headers(false);

        let mut request = request_simple();
        executor.execute(&mut request).await.unwrap();

        assert!(request.headers.is_none());
    }

    #[tokio::test]
    async fn failures_finish_the_span_with_error() {
        let tracer = Arc::new(RecordingTracer::default());
        let backend = MockBackend::new();
        backend.push_error(crate::errors::ExecuteError::Timeout);
        let executor = TraceExecutor::new(Arc::new(backend), tracer.clone());

        let mut request = request_simple();
        executor.execute(&mut request).await.expect_err("scripted");

        let spans = tracer.finished.lock();
        assert!(matches!(spans[0].status, SpanStatus::Error(_)));
    }
}
