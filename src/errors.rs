//! Error types for the execution pipeline.

use thiserror::Error;

use crate::types::Response;

/// Convenience result alias used throughout the crate.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Error taxonomy for request execution.
///
/// The retry loop classifies these into three buckets: `Timeout` is always
/// retryable with no backoff, `Http` is always fatal and carries the
/// offending response, everything else is retryable with the configured
/// backoff and gets wrapped into `Exhausted` when attempts run out.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The request did not complete within the effective timeout.
    #[error("request timed out")]
    Timeout,

    /// A response was produced but rejected (e.g. by status validation).
    /// Owns the response so the caller can still inspect status, headers
    /// and any cached body.
    #[error("HTTP error: {} {} -> status={}", .0.method, .0.url, .0.status)]
    Http(Box<Response>),

    /// All attempts were spent without a usable outcome. Wraps the last
    /// error for diagnostics.
    #[error("request failed after {attempts} attempts: {reason}")]
    Exhausted {
        /// Number of attempts that were made.
        attempts: u32,
        /// Kind and text of the last recorded error.
        reason: String,
        /// The last recorded error, if one exists.
        #[source]
        source: Option<Box<ExecuteError>>,
    },

    /// Unwrapping an executor chain revisited an executor.
    #[error("cycle detected in executor chain")]
    Cycle,

    /// Network-level failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid configuration or client construction failure.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure raised by an addon hook.
    #[error("addon error: {0}")]
    Addon(String),
}

impl ExecuteError {
    /// Stable name of the error variant.
    ///
    /// Used as the outcome label by the metrics executor and in the
    /// `Exhausted` message.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecuteError::Timeout => "Timeout",
            ExecuteError::Http(_) => "Http",
            ExecuteError::Exhausted { .. } => "Exhausted",
            ExecuteError::Cycle => "Cycle",
            ExecuteError::Transport(_) => "Transport",
            ExecuteError::Configuration(_) => "Configuration",
            ExecuteError::Serialization(_) => "Serialization",
            ExecuteError::Addon(_) => "Addon",
        }
    }
}

impl From<reqwest::Error> for ExecuteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExecuteError::Timeout
        } else {
            ExecuteError::Transport(err.to_string())
        }
    }
}
