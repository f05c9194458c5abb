//! The executor abstraction every pipeline stage implements.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ExecuteResult;
use crate::types::{RequestData, Response};

/// A component that performs or forwards a single logical HTTP request.
///
/// Terminal implementations (backends) perform the network call; decorator
/// implementations wrap exactly one inner executor and add cross-cutting
/// behavior around its `execute`.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Acquire resources needed for execution. No-op by default.
    async fn start(&self) -> ExecuteResult<()> {
        Ok(())
    }

    /// Release resources acquired by `start`. No-op by default.
    async fn close(&self) -> ExecuteResult<()> {
        Ok(())
    }

    /// Execute one request, failing with whatever the backend or a
    /// downstream wrapper raises.
    async fn execute(&self, request: &mut RequestData) -> ExecuteResult<Response>;

    /// The wrapped executor, if this is a decorator. Terminal executors
    /// return `None`. Drives [`unwrap_executor`](crate::executors::unwrap_executor).
    fn inner(&self) -> Option<Arc<dyn Executor>> {
        None
    }
}
