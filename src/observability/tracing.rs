//! Request-lifecycle tracing seam.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Span tracking one traced operation: ids, timing, attributes, status.
#[derive(Debug, Clone)]
pub struct RequestSpan {
    /// Identifier shared by every span of a trace, 32 hex chars.
    pub trace_id: String,
    /// Identifier of this span, 16 hex chars.
    pub span_id: String,
    /// Identifier of the parent span, if any.
    pub parent_span_id: Option<String>,
    /// Name of the traced operation.
    pub operation: String,
    /// When the span started.
    pub start_time: Instant,
    /// When the span ended; `None` while active.
    pub end_time: Option<Instant>,
    /// Key-value attributes in insertion order.
    pub attributes: Vec<(String, String)>,
    /// Final status.
    pub status: SpanStatus,
}

/// Status of a span.
#[derive(Debug, Clone, PartialEq)]
pub enum SpanStatus {
    /// Completed successfully.
    Ok,
    /// Completed with an error.
    Error(String),
    /// Not yet determined.
    Unset,
}

impl RequestSpan {
    /// Create an active span for the given operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            trace_id: generate_trace_id(),
            span_id: generate_span_id(),
            parent_span_id: None,
            operation: operation.into(),
            start_time: Instant::now(),
            end_time: None,
            attributes: Vec::new(),
            status: SpanStatus::Unset,
        }
    }

    /// Link this span under a parent.
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    /// Append an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Mark the span finished, leaving the status as-is.
    pub fn finish(mut self) -> Self {
        self.end_time = Some(Instant::now());
        self
    }

    /// Mark the span finished with `Ok` status.
    pub fn finish_with_ok(mut self) -> Self {
        self.end_time = Some(Instant::now());
        self.status = SpanStatus::Ok;
        self
    }

    /// Mark the span finished with an error status.
    pub fn finish_with_error(mut self, error: impl Into<String>) -> Self {
        self.end_time = Some(Instant::now());
        self.status = SpanStatus::Error(error.into());
        self
    }

    /// Duration of the span, if finished.
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end.duration_since(self.start_time))
    }
}

/// Creates spans and records them on completion.
pub trait Tracer: Send + Sync {
    /// Start a span for the given operation.
    fn start_span(&self, operation: &str) -> RequestSpan;

    /// Record a completed span.
    fn end_span(&self, span: RequestSpan);
}

/// Tracer that emits span boundaries through the `tracing` crate at debug
/// level.
pub struct LoggingTracer {
    service_name: String,
}

impl LoggingTracer {
    /// Create a tracer stamping spans with the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl Tracer for LoggingTracer {
    fn start_span(&self, operation: &str) -> RequestSpan {
        let span = RequestSpan::new(operation).with_attribute("service.name", &self.service_name);
        tracing::debug!(
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            operation = %operation,
            "span started"
        );
        span
    }

    fn end_span(&self, span: RequestSpan) {
        let span = span.finish();
        let duration_ms = span.duration().map(|d| d.as_millis()).unwrap_or(0);
        tracing::debug!(
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            operation = %span.operation,
            duration_ms = duration_ms,
            status = ?span.status,
            "span ended"
        );
    }
}

/// Tracer that records nothing.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn start_span(&self, operation: &str) -> RequestSpan {
        RequestSpan::new(operation)
    }

    fn end_span(&self, _span: RequestSpan) {}
}

// Timestamp high bits keep ids sortable; random low bits keep two spans in
// the same nanosecond distinct.
fn generate_trace_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    format!("{:016x}{:016x}", timestamp, rand::random::<u64>())
}

fn generate_span_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}
