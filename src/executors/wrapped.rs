//! The decorator base and the innermost-executor traversal.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{ExecuteError, ExecuteResult};
use crate::executor::Executor;
use crate::types::{RequestData, Response};

/// Plain forwarding decorator: holds exactly one inner executor and
/// delegates the whole lifecycle to it. Purpose-built decorators hold their
/// inner executor the same way and override `execute`.
pub struct WrappedExecutor {
    inner: Arc<dyn Executor>,
}

impl WrappedExecutor {
    /// Wrap the given executor.
    pub fn new(inner: Arc<dyn Executor>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Executor for WrappedExecutor {
    async fn start(&self) -> ExecuteResult<()> {
        self.inner.start().await
    }

    async fn close(&self) -> ExecuteResult<()> {
        self.inner.close().await
    }

    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response> {
        self.inner.execute(request).await
    }

    fn inner(&self) -> Option<Arc<dyn Executor>> {
        Some(self.inner.clone())
    }
}

/// Follow the decorator chain to the innermost non-wrapping executor.
///
/// Visited executors are tracked by pointer identity, so a chain that wraps
/// itself (directly or transitively) fails with [`ExecuteError::Cycle`]
/// instead of looping forever.
pub fn unwrap_executor(executor: &Arc<dyn Executor>) -> ExecuteResult<Arc<dyn Executor>> {
    let mut visited: HashSet<*const ()> = HashSet::new();
    let mut current = executor.clone();
    visited.insert(Arc::as_ptr(&current) as *const ());

    while let Some(next) = current.inner() {
        if !visited.insert(Arc::as_ptr(&next) as *const ()) {
            return Err(ExecuteError::Cycle);
        }
        current = next;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockBackend;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn forwards_execution_to_inner() {
        let backend = Arc::new(MockBackend::always(200));
        let wrapped = WrappedExecutor::new(backend.clone());

        let mut request = crate::mocks::request_simple();
        let response = wrapped.execute(&mut request).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn unwraps_deep_chains_to_the_original_backend() {
        let backend: Arc<dyn Executor> = Arc::new(MockBackend::always(200));
        let mut executor = backend.clone();
        for _ in 0..100 {
            executor = Arc::new(WrappedExecutor::new(executor));
        }

        let innermost = unwrap_executor(&executor).unwrap();
        assert!(Arc::ptr_eq(&innermost, &backend));
    }

    #[test]
    fn unwrapping_a_terminal_executor_returns_it() {
        let backend: Arc<dyn Executor> = Arc::new(MockBackend::always(200));
        let innermost = unwrap_executor(&backend).unwrap();
        assert!(Arc::ptr_eq(&innermost, &backend));
    }

    struct SelfReferential {
        inner: Mutex<Option<Arc<dyn Executor>>>,
    }

    #[async_trait]
    impl Executor for SelfReferential {
        async fn execute(&self, _request: &mut RequestData) -> ExecuteResult<Response> {
            Err(ExecuteError::Configuration("not executable".to_string()))
        }

        fn inner(&self) -> Option<Arc<dyn Executor>> {
            self.inner.lock().clone()
        }
    }

    #[test]
    fn cyclic_chain_is_detected() {
        let cyclic = Arc::new(SelfReferential {
            inner: Mutex::new(None),
        });
        *cyclic.inner.lock() = Some(cyclic.clone() as Arc<dyn Executor>);

        let result = unwrap_executor(&(cyclic.clone() as Arc<dyn Executor>));
        assert!(matches!(result, Err(ExecuteError::Cycle)));

        // Break the cycle so the Arc can actually be freed.
        *cyclic.inner.lock() = None;
    }

    #[test]
    fn indirect_cycle_is_detected() {
        let tail = Arc::new(SelfReferential {
            inner: Mutex::new(None),
        });
        let head: Arc<dyn Executor> =
            Arc::new(WrappedExecutor::new(tail.clone() as Arc<dyn Executor>));
        *tail.inner.lock() = Some(head.clone());

        let result = unwrap_executor(&head);
        assert!(matches!(result, Err(ExecuteError::Cycle)));

        *tail.inner.lock() = None;
    }
}
