//! Admission-gating decorators.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ExecuteResult;
use crate::executor::Executor;
use crate::limiters::{ConcurrencyLimiter, RateLimiter};
use crate::types::{RequestData, Response};

/// Waits for rate-limit admission before delegating.
///
/// The limiter is shared state: several executors (or whole pipelines) may
/// gate on the same instance.
pub struct RateLimitedExecutor {
    inner: Arc<dyn Executor>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl RateLimitedExecutor {
    /// Gate `inner` behind `rate_limiter`.
    pub fn new(inner: Arc<dyn Executor>, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            inner,
            rate_limiter,
        }
    }
}

#[async_trait]
impl Executor for RateLimitedExecutor {
    async fn start(&self) -> ExecuteResult<()> {
        self.inner.start().await
    }

    async fn close(&self) -> ExecuteResult<()> {
        self.inner.close().await
    }

    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        self.rate_limiter.rate_limit().await?;
        self.inner.execute(request).await
    }

    fn inner(&self) -> Option<Arc<dyn Executor>> {
        Some(self.inner.clone())
    }
}

/// Holds a concurrency permit for the duration of the delegated call.
pub struct ConcurrencyLimitedExecutor {
    inner: Arc<dyn Executor>,
    concurrency_limiter: Arc<dyn ConcurrencyLimiter>,
}

impl ConcurrencyLimitedExecutor {
    /// Gate `inner` behind `concurrency_limiter`.
    pub fn new(
        inner: Arc<dyn Executor>,
        concurrency_limiter: Arc<dyn ConcurrencyLimiter>,
    ) -> Self {
        Self {
            inner,
            concurrency_limiter,
        }
    }
}

#[async_trait]
impl Executor for ConcurrencyLimitedExecutor {
    async fn start(&self) -> ExecuteResult<()> {
        self.inner.start().await
    }

    async fn close(&self) -> ExecuteResult<()> {
        self.inner.close().await
    }

    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        let _permit = self.concurrency_limiter.acquire().await?;
        self.inner.execute(request).await
    }

    fn inner(&self) -> Option<Arc<dyn Executor>> {
        Some(self.inner.clone())
    }
}
