//! Bounded-parallelism admission via a counting semaphore.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::{ExecuteError, ExecuteResult};

/// A slot in a concurrency-limited region.
///
/// Dropping the permit releases the slot, so release happens exactly once on
/// every exit path, including cancellation. An unbounded limiter hands out
/// permits that hold nothing.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ConcurrencyPermit {
    /// A permit that gates nothing.
    pub fn unbounded() -> Self {
        Self { _permit: None }
    }
}

/// Admission gate capping the number of in-flight executions.
#[async_trait]
pub trait ConcurrencyLimiter: Send + Sync {
    /// Wait for a free slot and return the permit holding it.
    async fn acquire(&self) -> ExecuteResult<ConcurrencyPermit>;
}

/// In-process concurrency limiter over a [`tokio::sync::Semaphore`].
///
/// Configured with `None`, every acquire succeeds immediately with a no-op
/// permit, so the limiter can be wired in unconditionally.
pub struct LocalConcurrencyLimiter {
    semaphore: Option<Arc<Semaphore>>,
}

impl LocalConcurrencyLimiter {
    /// Create a limiter allowing `max_concurrency` in-flight executions,
    /// or an unbounded one when `None`.
    pub fn new(max_concurrency: Option<usize>) -> Self {
        Self {
            semaphore: max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Free slots right now, or `None` when unbounded.
    pub fn available_permits(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }
}

#[async_trait]
impl ConcurrencyLimiter for LocalConcurrencyLimiter {
    async fn acquire(&self) -> ExecuteResult<ConcurrencyPermit> {
        match &self.semaphore {
            Some(semaphore) => {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| {
                        ExecuteError::Configuration("concurrency semaphore closed".to_string())
                    })?;
                Ok(ConcurrencyPermit {
                    _permit: Some(permit),
                })
            }
            None => Ok(ConcurrencyPermit::unbounded()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn bounded_limiter_caps_inflight_slots() {
        let limiter = LocalConcurrencyLimiter::new(Some(2));

        let first = limiter.acquire().await.unwrap();
        let _second = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available_permits(), Some(0));

        let blocked = timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err(), "third acquire must wait for a free slot");

        drop(first);
        let third = timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(third.is_ok(), "released slot must be reusable");
    }

    #[tokio::test]
    async fn unbounded_limiter_never_blocks() {
        let limiter = LocalConcurrencyLimiter::new(None);
        assert_eq!(limiter.available_permits(), None);

        let mut permits = Vec::new();
        for _ in 0..64 {
            permits.push(limiter.acquire().await.unwrap());
        }
    }

    #[tokio::test]
    async fn cancelled_acquire_does_not_leak_a_slot() {
        let limiter = Arc::new(LocalConcurrencyLimiter::new(Some(1)));

        let held = limiter.acquire().await.unwrap();
        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::task::yield_now().await;
        waiter.abort();
        let _ = waiter.await;

        drop(held);
        assert_eq!(limiter.available_permits(), Some(1));
    }
}
