//! # http-pipeline
//!
//! Composable HTTP request execution pipeline: a chain of decorator
//! executors wraps a transport-performing backend and adds cross-cutting
//! behavior — authentication, header injection, status validation, rate
//! limiting, concurrency admission control and retry-with-backoff — without
//! the backend knowing about any of it.
//!
//! ## Features
//!
//! - `Executor` trait with decorator composition and cycle-safe unwrapping
//! - Retry orchestration with pluggable addon hooks and retry votes
//! - Sliding-window rate limiting and semaphore-based concurrency limiting
//! - Reqwest transport backend with eager body caching
//! - Observability seams: metrics collector, request tracer, logging addon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http_pipeline::{Executor, PipelineConfig, RequestData};
//! use std::time::Duration;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = PipelineConfig::new()
//!         .with_max_attempts(5)
//!         .with_rate_limit(10, Duration::from_secs(1))
//!         .build()?;
//!
//!     let mut request = RequestData::get(Url::parse("https://api.example.com/items")?);
//!     let mut response = executor.execute(&mut request).await?;
//!     println!("status: {}", response.status);
//!
//!     let body = response.read().await?;
//!     println!("{} bytes", body.len());
//!     response.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `executor` - the `Executor` trait every pipeline stage implements
//! - `executors` - decorators: retry, rate/concurrency limiting, metrics, tracing
//! - `addons` - pluggable hooks: auth, headers, status validation, logging, retry votes
//! - `limiters` - the local admission-gate algorithms
//! - `backends` - terminal transport adapters
//! - `observability` - metrics/tracing seams and logging bootstrap
//! - `config` - default stack assembly
//! - `errors` - error taxonomy
//! - `types` - request/response data model

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod addons;
pub mod backends;
pub mod config;
pub mod errors;
pub mod executor;
pub mod executors;
pub mod limiters;
pub mod observability;
pub mod types;

#[cfg(test)]
pub mod mocks;

pub use addons::{
    AddHeadersAddon, Addon, BearerAuthAddon, LoggingAddon, Retry429Addon, Retry5xxAddon,
    Retryable, StaticBasicAuthAddon, StaticBearerAuthAddon, StatusValidationAddon, TokenProvider,
    VerboseLoggingAddon,
};
pub use backends::ReqwestBackend;
pub use config::PipelineConfig;
pub use errors::{ExecuteError, ExecuteResult};
pub use executor::Executor;
pub use executors::{
    unwrap_executor, ConcurrencyLimitedExecutor, MetricsExecutor, RateLimitedExecutor,
    RetryableExecutor, RetryableExecutorBuilder, TraceExecutor, WrappedExecutor,
};
pub use limiters::{
    ConcurrencyLimiter, ConcurrencyPermit, LocalConcurrencyLimiter, LocalRateLimiter, RateLimiter,
};
pub use observability::{
    InMemoryMetricsCollector, LogFormat, LogLevel, LoggingConfig, LoggingTracer,
    MetricsCollector, NoopMetricsCollector, NoopTracer, RequestSpan, SpanStatus, Tracer,
};
pub use types::{BackendResponse, RequestData, Response};
