//! Pipeline configuration and stack assembly.

use std::sync::Arc;
use std::time::Duration;

use crate::backends::reqwest::DEFAULT_TIMEOUT;
use crate::backends::ReqwestBackend;
use crate::errors::ExecuteResult;
use crate::executor::Executor;
use crate::executors::{
    ConcurrencyLimitedExecutor, RateLimitedExecutor, RetryableExecutor, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_SLEEP,
};
use crate::limiters::{LocalConcurrencyLimiter, LocalRateLimiter};

/// Configuration for a default executor stack.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Default per-request timeout (default: 30 seconds).
    pub default_timeout: Duration,
    /// Attempt cap for the retry loop (default: 3).
    pub max_attempts: u32,
    /// Default sleep between attempts (default: 3 seconds).
    pub retry_sleep: Duration,
    /// Emit a warning per retry (default: true).
    pub log_retries: bool,
    /// Admissions per rate-limit window; 0 disables rate limiting.
    pub rate_limit: usize,
    /// Rolling rate-limit window (default: 1 second).
    pub rate_limit_window: Duration,
    /// In-flight execution cap; `None` is unbounded.
    pub max_concurrency: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_sleep: DEFAULT_RETRY_SLEEP,
            log_retries: true,
            rate_limit: 0,
            rate_limit_window: Duration::from_secs(1),
            max_concurrency: None,
        }
    }
}

impl PipelineConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `HTTP_PIPELINE_*` environment variables.
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("HTTP_PIPELINE_TIMEOUT_SECS") {
            config.default_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_parse::<u32>("HTTP_PIPELINE_MAX_ATTEMPTS") {
            config.max_attempts = attempts.max(1);
        }
        if let Some(secs) = env_parse::<f64>("HTTP_PIPELINE_RETRY_SLEEP_SECS") {
            if secs.is_finite() && secs >= 0.0 {
                config.retry_sleep = Duration::from_secs_f64(secs);
            }
        }
        if let Some(limit) = env_parse::<usize>("HTTP_PIPELINE_RATE_LIMIT") {
            config.rate_limit = limit;
        }
        if let Some(secs) = env_parse::<u64>("HTTP_PIPELINE_RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit_window = Duration::from_secs(secs);
        }
        if let Some(max) = env_parse::<usize>("HTTP_PIPELINE_MAX_CONCURRENCY") {
            config.max_concurrency = Some(max);
        }

        config
    }

    /// Set the default per-request timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the attempt cap.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the default inter-attempt sleep.
    pub fn with_retry_sleep(mut self, retry_sleep: Duration) -> Self {
        self.retry_sleep = retry_sleep;
        self
    }

    /// Enable or disable the per-retry warning.
    pub fn with_log_retries(mut self, log_retries: bool) -> Self {
        self.log_retries = log_retries;
        self
    }

    /// Set the rate limit as admissions per window.
    pub fn with_rate_limit(mut self, rate_limit: usize, window: Duration) -> Self {
        self.rate_limit = rate_limit;
        self.rate_limit_window = window;
        self
    }

    /// Cap in-flight executions.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Assemble the default stack:
    /// backend → concurrency limit → rate limit → retry (default addons).
    pub fn build(&self) -> ExecuteResult<Arc<dyn Executor>> {
        let mut executor: Arc<dyn Executor> =
            Arc::new(ReqwestBackend::new(self.default_timeout)?);

        if self.max_concurrency.is_some() {
            executor = Arc::new(ConcurrencyLimitedExecutor::new(
                executor,
                Arc::new(LocalConcurrencyLimiter::new(self.max_concurrency)),
            ));
        }

        if self.rate_limit > 0 {
            executor = Arc::new(RateLimitedExecutor::new(
                executor,
                Arc::new(LocalRateLimiter::new(
                    self.rate_limit,
                    self.rate_limit_window,
                )),
            ));
        }

        let retrying = RetryableExecutor::builder(executor)
            .with_max_attempts(self.max_attempts)
            .with_retry_sleep(self.retry_sleep)
            .with_log_retries(self.log_retries)
            .build();

        Ok(Arc::new(retrying))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
