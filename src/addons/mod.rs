//! Pluggable cross-cutting hooks attached to the retry loop.
//!
//! An addon is a capability, not an entity: a component may implement
//! [`Addon`] (lifecycle hooks), [`Retryable`] (retry votes), or both. The
//! retry executor classifies each registered instance by capability at
//! construction time.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{ExecuteError, ExecuteResult};
use crate::types::{RequestData, Response};

pub mod auth;
pub mod headers;
pub mod log;
pub mod retry;
pub mod status;

pub use auth::{BearerAuthAddon, StaticBasicAuthAddon, StaticBearerAuthAddon, TokenProvider};
pub use headers::AddHeadersAddon;
pub use log::{LoggingAddon, VerboseLoggingAddon};
pub use retry::{Retry429Addon, Retry5xxAddon};
pub use status::StatusValidationAddon;

/// Request/response lifecycle hooks. All default to pass-through.
#[async_trait]
pub trait Addon: Send + Sync {
    /// Runs before every attempt, free to mutate the request (e.g. inject
    /// or refresh an auth token).
    async fn before_request(&self, _request: &mut RequestData) -> ExecuteResult<()> {
        Ok(())
    }

    /// Runs on every response in registration order, free to transform or
    /// replace it — or to reject it with an error.
    async fn process_response(
        &self,
        _request: &RequestData,
        response: Response,
    ) -> ExecuteResult<Response> {
        Ok(response)
    }

    /// Notified of execution failures. Runs best-effort on the retryable
    /// error path; see the retry executor for the exact policy.
    async fn process_error(
        &self,
        _request: &RequestData,
        _error: &ExecuteError,
    ) -> ExecuteResult<()> {
        Ok(())
    }
}

/// Votes on whether a response should trigger a retry.
#[async_trait]
pub trait Retryable: Send + Sync {
    /// Returns whether to retry, and an optional delay overriding the
    /// executor's default sleep for this cycle.
    async fn need_retry(&self, response: &Response) -> (bool, Option<Duration>);
}
