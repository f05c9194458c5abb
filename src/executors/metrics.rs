//! Per-request metrics recording.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::errors::ExecuteResult;
use crate::executor::Executor;
use crate::observability::MetricsCollector;
use crate::types::{RequestData, Response};

/// Counter incremented once per finished request.
pub const REQUESTS_TOTAL: &str = "http_pipeline_requests_total";

/// Histogram of request durations in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "http_pipeline_request_duration_seconds";

/// Records a count and a duration observation for every delegated request.
///
/// Labels are `(scheme, host, port, method, path, outcome)` where outcome is
/// the final status code on success or the error kind on failure. The path
/// label comes from the `path_template` request option when present; falling
/// back to the raw path risks exploding label cardinality for requests with
/// identifiers in the path, which is warned about unless disabled.
pub struct MetricsExecutor {
    inner: Arc<dyn Executor>,
    collector: Arc<dyn MetricsCollector>,
    disable_warnings: bool,
}

impl MetricsExecutor {
    /// Record metrics for `inner` into `collector`.
    pub fn new(inner: Arc<dyn Executor>, collector: Arc<dyn MetricsCollector>) -> Self {
        Self {
            inner,
            collector,
            disable_warnings: false,
        }
    }

    /// Suppress the missing-`path_template` cardinality warning.
    pub fn with_disabled_warnings(mut self) -> Self {
        self.disable_warnings = true;
        self
    }

    fn record(&self, labels: &[(&str, &str)], elapsed_secs: f64) {
        self.collector.increment_counter(REQUESTS_TOTAL, 1, labels);
        self.collector
            .record_histogram(REQUEST_DURATION_SECONDS, elapsed_secs, labels);
    }
}

#[async_trait]
impl Executor for MetricsExecutor {
    async fn start(&self) -> ExecuteResult<()> {
        self.inner.start().await
    }

    async fn close(&self) -> ExecuteResult<()> {
        self.inner.close().await
    }

    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        let path_template = match request.options.remove("path_template") {
            Some(serde_json::Value::String(template)) => Some(template),
            _ => None,
        };

        if !self.disable_warnings && path_template.is_none() {
            tracing::warn!(
                url = %request.url,
                "no path_template option set; using the raw path as a metric label \
                 can explode label cardinality when paths carry identifiers \
                 (e.g. pass path_template=\"/items/<item_id>\" for GET /items/123)"
            );
        }

        let scheme = request.url.scheme().to_string();
        let host = request.url.host_str().unwrap_or_default().to_string();
        let port = request
            .url
            .port_or_known_default()
            .map(|p| p.to_string())
            .unwrap_or_default();
        let method = request.method.to_uppercase();
        let path = path_template.unwrap_or_else(|| request.url.path().to_string());

        let started = Instant::now();
        let result = self.inner.execute(request).await;
        let elapsed_secs = started.elapsed().as_secs_f64();

        let outcome = match &result {
            Ok(response) => response.status.as_str().to_string(),
            Err(err) => err.kind().to_string(),
        };
        let labels = [
            ("scheme", scheme.as_str()),
            ("host", host.as_str()),
            ("port", port.as_str()),
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("outcome", outcome.as_str()),
        ];
        self.record(&labels, elapsed_secs);

        result
    }

    fn inner(&self) -> Option<Arc<dyn Executor>> {
        Some(self.inner.clone())
    }
}
