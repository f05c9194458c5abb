//! Retry orchestration around an inner executor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::addons::{Addon, LoggingAddon, Retry429Addon, Retry5xxAddon, Retryable};
use crate::errors::{ExecuteError, ExecuteResult};
use crate::executor::Executor;
use crate::types::{RequestData, Response};

/// Default maximum number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default sleep between attempts.
pub const DEFAULT_RETRY_SLEEP: Duration = Duration::from_secs(3);

/// The lifecycle-hook half of the default addon set.
pub fn default_addons() -> Vec<Arc<dyn Addon>> {
    vec![Arc::new(LoggingAddon::new())]
}

/// The retry-vote half of the default addon set: retry 5xx, retry 429
/// honoring `Retry-After`.
pub fn default_retryables() -> Vec<Arc<dyn Retryable>> {
    vec![Arc::new(Retry5xxAddon), Arc::new(Retry429Addon)]
}

/// Builder for [`RetryableExecutor`].
///
/// Addons register into two explicit collections by capability; an instance
/// implementing both registers once via [`with_hybrid`](Self::with_hybrid)
/// and participates in both phases. Registration order is hook order, and
/// the default addon set is appended after caller addons unless opted out.
pub struct RetryableExecutorBuilder {
    inner: Arc<dyn Executor>,
    max_attempts: u32,
    retry_sleep: Duration,
    log_retries: bool,
    addons: Vec<Arc<dyn Addon>>,
    retryables: Vec<Arc<dyn Retryable>>,
    use_default_addons: bool,
}

impl RetryableExecutorBuilder {
    fn new(inner: Arc<dyn Executor>) -> Self {
        Self {
            inner,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_sleep: DEFAULT_RETRY_SLEEP,
            log_retries: true,
            addons: Vec::new(),
            retryables: Vec::new(),
            use_default_addons: true,
        }
    }

    /// Set the attempt cap. Must be at least 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the default sleep between attempts.
    pub fn with_retry_sleep(mut self, retry_sleep: Duration) -> Self {
        self.retry_sleep = retry_sleep;
        self
    }

    /// Enable or disable the per-retry warning log line.
    pub fn with_log_retries(mut self, log_retries: bool) -> Self {
        self.log_retries = log_retries;
        self
    }

    /// Register a lifecycle-hook addon.
    pub fn with_addon(mut self, addon: impl Addon + 'static) -> Self {
        self.addons.push(Arc::new(addon));
        self
    }

    /// Register a retry-vote addon.
    pub fn with_retryable(mut self, retryable: impl Retryable + 'static) -> Self {
        self.retryables.push(Arc::new(retryable));
        self
    }

    /// Register an addon that has both capabilities; it runs in the hook
    /// phases *and* votes on retries.
    pub fn with_hybrid(mut self, addon: impl Addon + Retryable + 'static) -> Self {
        let addon = Arc::new(addon);
        self.addons.push(addon.clone());
        self.retryables.push(addon);
        self
    }

    /// Do not append the default addon set.
    pub fn without_default_addons(mut self) -> Self {
        self.use_default_addons = false;
        self
    }

    /// Finalize the executor.
    pub fn build(mut self) -> RetryableExecutor {
        assert!(self.max_attempts >= 1, "max_attempts must be at least 1");

        if self.use_default_addons {
            self.addons.extend(default_addons());
            self.retryables.extend(default_retryables());
        }

        RetryableExecutor {
            inner: self.inner,
            max_attempts: self.max_attempts,
            retry_sleep: self.retry_sleep,
            log_retries: self.log_retries,
            addons: self.addons,
            retryables: self.retryables,
        }
    }
}

/// Executes a request with retries, running addon hooks around every
/// attempt.
///
/// Outcome classification per attempt:
/// - a response runs through `process_response`, then the retry-vote
///   addons; the first positive vote wins and may override the sleep,
/// - a timeout is retried immediately with no backoff,
/// - [`ExecuteError::Http`] is fatal and bypasses the loop,
/// - any other error is retried with the default sleep.
///
/// When attempts run out, a final-attempt response is returned even if it
/// voted for a retry; a recorded error is wrapped into
/// [`ExecuteError::Exhausted`] with the cause preserved.
pub struct RetryableExecutor {
    inner: Arc<dyn Executor>,
    max_attempts: u32,
    retry_sleep: Duration,
    log_retries: bool,
    addons: Vec<Arc<dyn Addon>>,
    retryables: Vec<Arc<dyn Retryable>>,
}

impl RetryableExecutor {
    /// Start building a retrying wrapper around `inner`.
    pub fn builder(inner: Arc<dyn Executor>) -> RetryableExecutorBuilder {
        RetryableExecutorBuilder::new(inner)
    }

    /// Wrap `inner` with the default attempt cap, sleep and addon set.
    pub fn new(inner: Arc<dyn Executor>) -> Self {
        Self::builder(inner).build()
    }

    async fn run_before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        for addon in &self.addons {
            addon.before_request(request).await?;
        }
        Ok(())
    }

    async fn run_process_response(
        &self,
        request: &RequestData,
        mut response: Response,
    ) -> ExecuteResult<Response> {
        for addon in &self.addons {
            response = addon.process_response(request, response).await?;
        }
        Ok(response)
    }

    async fn run_process_error(
        &self,
        request: &RequestData,
        error: &ExecuteError,
    ) -> ExecuteResult<()> {
        for addon in &self.addons {
            addon.process_error(request, error).await?;
        }
        Ok(())
    }

    /// First positive vote wins; remaining addons are not consulted.
    async fn vote_retry(&self, response: &Response) -> (bool, Option<Duration>) {
        for retryable in &self.retryables {
            let (retry, delay) = retryable.need_retry(response).await;
            if retry {
                return (true, delay);
            }
        }
        (false, None)
    }
}

#[async_trait]
impl Executor for RetryableExecutor {
    async fn start(&self) -> ExecuteResult<()> {
        self.inner.start().await
    }

    async fn close(&self) -> ExecuteResult<()> {
        self.inner.close().await
    }

    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        let original_headers = request.headers.clone();
        let mut last_err: Option<ExecuteError> = None;
        let mut response: Option<Response> = None;

        for attempt in 0..self.max_attempts {
            // Addon mutations from a failed attempt must not leak into the
            // next one.
            request.headers = original_headers.clone();

            self.run_before_request(request).await?;

            let mut sleep_for = self.retry_sleep;
            let mut need_retry = false;

            if self.log_retries && attempt > 0 {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = self.max_attempts,
                    method = %request.method,
                    url = %request.url,
                    "retrying request"
                );
            }

            match self.inner.execute(request).await {
                Ok(resp) => match self.run_process_response(request, resp).await {
                    Ok(resp) => {
                        let (retry, delay) = self.vote_retry(&resp).await;
                        need_retry = retry;
                        if let Some(delay) = delay.filter(|_| retry) {
                            sleep_for = delay;
                        }
                        response = Some(resp);
                    }
                    Err(err @ ExecuteError::Http(_)) => {
                        self.run_process_error(request, &err).await?;
                        return Err(err);
                    }
                    Err(err) => return Err(err),
                },
                Err(ExecuteError::Timeout) => {
                    need_retry = true;
                    last_err = Some(ExecuteError::Timeout);
                    response = None;
                    sleep_for = Duration::ZERO;
                }
                Err(err @ ExecuteError::Http(_)) => {
                    self.run_process_error(request, &err).await?;
                    return Err(err);
                }
                Err(err) => {
                    need_retry = true;
                    last_err = Some(err);
                    response = None;
                }
            }

            if !need_retry {
                break;
            }

            if let Some(err) = &last_err {
                // A broken diagnostic addon must not mask the real failure.
                if let Err(hook_err) = self.run_process_error(request, err).await {
                    tracing::error!(
                        kind = err.kind(),
                        error = %err,
                        hook_error = %hook_err,
                        "error while post-processing request failure"
                    );
                }
            }

            if attempt >= self.max_attempts - 1 {
                break;
            }

            if sleep_for > Duration::ZERO {
                sleep(sleep_for).await;
            }
        }

        if let Some(response) = response {
            return Ok(response);
        }

        if let Some(err) = last_err {
            return Err(ExecuteError::Exhausted {
                attempts: self.max_attempts,
                reason: format!("{}({})", err.kind(), err),
                source: Some(Box::new(err)),
            });
        }

        Err(ExecuteError::Exhausted {
            attempts: self.max_attempts,
            reason: "retries exhausted".to_string(),
            source: None,
        })
    }

    fn inner(&self) -> Option<Arc<dyn Executor>> {
        Some(self.inner.clone())
    }
}
