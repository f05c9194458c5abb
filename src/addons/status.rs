//! Response status validation.

use std::collections::HashSet;

use async_trait::async_trait;
use http::StatusCode;

use crate::errors::{ExecuteError, ExecuteResult};
use crate::types::{RequestData, Response};

use super::Addon;

/// Rejects any response whose status is not in the expected set by failing
/// `process_response` with [`ExecuteError::Http`], which carries the
/// response and is fatal to the retry loop.
pub struct StatusValidationAddon {
    expected: HashSet<StatusCode>,
}

impl StatusValidationAddon {
    /// Accept exactly the given statuses.
    pub fn new(expected: impl IntoIterator<Item = StatusCode>) -> Self {
        Self {
            expected: expected.into_iter().collect(),
        }
    }
}

impl Default for StatusValidationAddon {
    fn default() -> Self {
        Self::new([StatusCode::OK, StatusCode::CREATED])
    }
}

#[async_trait]
impl Addon for StatusValidationAddon {
    async fn process_response(
        &self,
        _request: &RequestData,
        response: Response,
    ) -> ExecuteResult<Response> {
        if !self.expected.contains(&response.status) {
            return Err(ExecuteError::Http(Box::new(response)));
        }
        Ok(response)
    }
}
