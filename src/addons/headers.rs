//! Arbitrary header injection.

use async_trait::async_trait;
use http::HeaderMap;

use crate::errors::ExecuteResult;
use crate::types::RequestData;

use super::Addon;

/// Applies a user-supplied mutation to the request's header map before
/// every attempt, creating the map on first use.
pub struct AddHeadersAddon {
    mutator: Box<dyn Fn(&mut HeaderMap) + Send + Sync>,
}

impl AddHeadersAddon {
    /// Wrap the given header mutation.
    pub fn new(mutator: impl Fn(&mut HeaderMap) + Send + Sync + 'static) -> Self {
        Self {
            mutator: Box::new(mutator),
        }
    }
}

#[async_trait]
impl Addon for AddHeadersAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        (self.mutator)(request.headers_mut());
        Ok(())
    }
}
