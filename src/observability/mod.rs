//! Observability collaborators: metrics, tracing and logging.
//!
//! The pipeline core depends on these only through the narrow
//! [`MetricsCollector`] and [`Tracer`] seams; swap in real exporters by
//! implementing those traits.

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metrics::{InMemoryMetricsCollector, MetricsCollector, NoopMetricsCollector};
pub use tracing::{LoggingTracer, NoopTracer, RequestSpan, SpanStatus, Tracer};
