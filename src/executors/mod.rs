//! Decorator executors layered over a transport backend.

pub mod limiters;
pub mod metrics;
pub mod retry;
pub mod trace;
pub mod wrapped;


pub use limiters::{ConcurrencyLimitedExecutor, RateLimitedExecutor};
pub use metrics::MetricsExecutor;
pub use retry::{
    default_addons, default_retryables, RetryableExecutor, RetryableExecutorBuilder,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_SLEEP,
};
pub use trace::TraceExecutor;
pub use wrapped::{unwrap_executor, WrappedExecutor};
