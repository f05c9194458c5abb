//! Sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use crate::errors::ExecuteResult;

/// Admission gate limiting how often calls may proceed.
///
/// Implementations suspend the caller until the call is admitted. The local
/// implementation below keeps its state in-process; a distributed variant
/// would implement the same trait against shared state.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until this call is admitted under the configured rate.
    async fn rate_limit(&self) -> ExecuteResult<()>;
}

/// In-process sliding-window rate limiter: at most `limit` admissions per
/// rolling `window`.
///
/// Keeps a bounded FIFO of admission timestamps. A delayed call records the
/// instant it is *scheduled* to effectively occur, not the instant it asked,
/// so back-to-back delayed calls queue one window apart instead of all
/// computing the same wait.
///
/// This is not a token bucket: it enforces that no `limit + 1` admissions
/// span less than `window`.
pub struct LocalRateLimiter {
    limit: usize,
    window: Duration,
    // Held only for the check-and-update, never across the sleep.
    stamps: Mutex<VecDeque<Instant>>,
}

impl LocalRateLimiter {
    /// Create a limiter admitting `limit` calls per `window`. A `limit` of
    /// zero disables the limiter entirely.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            stamps: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }
}

#[async_trait]
impl RateLimiter for LocalRateLimiter {
    async fn rate_limit(&self) -> ExecuteResult<()> {
        if self.limit == 0 {
            return Ok(());
        }

        let wait = {
            let mut stamps = self.stamps.lock();
            let now = Instant::now();

            if stamps.len() < self.limit {
                stamps.push_back(now);
                None
            } else if let Some(oldest) = stamps.pop_front() {
                // `oldest` may lie in the future when earlier callers are
                // already queued; their scheduled slot pushes ours out.
                let wait = (oldest + self.window).duration_since(now);
                if wait.is_zero() {
                    stamps.push_back(now);
                    None
                } else {
                    stamps.push_back(now + wait);
                    Some(wait)
                }
            } else {
                stamps.push_back(now);
                None
            }
        };

        if let Some(wait) = wait {
            tracing::debug!(
                wait_secs = wait.as_secs_f64(),
                limit = self.limit,
                window_secs = self.window.as_secs_f64(),
                "sleeping to satisfy rate limit"
            );
            sleep(wait).await;
        }

        Ok(())
    }
}
