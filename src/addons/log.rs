//! Observability addons that log the request lifecycle.

use async_trait::async_trait;

use crate::errors::{ExecuteError, ExecuteResult};
use crate::types::{RequestData, Response};

use super::Addon;

/// Logs request execution at debug level and failures at error level.
/// Purely observational; nothing reads state back from it.
#[derive(Debug, Default)]
pub struct LoggingAddon;

impl LoggingAddon {
    /// Create the addon.
    pub fn new() -> Self {
        Self
    }

    fn log_response(&self, request: &RequestData, response: &Response) {
        if response.status.as_u16() >= 500 {
            tracing::error!(
                method = %request.method,
                url = %request.url,
                status = response.status.as_u16(),
                "received response"
            );
        } else {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = response.status.as_u16(),
                "received response"
            );
        }
    }
}

#[async_trait]
impl Addon for LoggingAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        tracing::debug!(method = %request.method, url = %request.url, "executing request");
        Ok(())
    }

    async fn process_response(
        &self,
        request: &RequestData,
        response: Response,
    ) -> ExecuteResult<Response> {
        self.log_response(request, &response);
        Ok(response)
    }

    async fn process_error(
        &self,
        request: &RequestData,
        error: &ExecuteError,
    ) -> ExecuteResult<()> {
        match error {
            ExecuteError::Timeout => {
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    "request timed out"
                );
            }
            ExecuteError::Http(response) => {
                self.log_response(request, response);
            }
            other => {
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    kind = other.kind(),
                    error = %other,
                    "request failed"
                );
            }
        }
        Ok(())
    }
}

/// [`LoggingAddon`] variant that also logs payloads and response bodies,
/// truncated to keep log lines bounded.
pub struct VerboseLoggingAddon {
    base: LoggingAddon,
    truncate_body: Option<usize>,
}

impl VerboseLoggingAddon {
    /// Create the addon with the default 1 KiB body truncation.
    pub fn new() -> Self {
        Self {
            base: LoggingAddon::new(),
            truncate_body: Some(1024),
        }
    }

    /// Set the body truncation limit; `None` logs bodies in full.
    pub fn with_truncate_body(mut self, limit: Option<usize>) -> Self {
        self.truncate_body = limit;
        self
    }

    fn truncated(&self, body: &[u8]) -> String {
        let text = String::from_utf8_lossy(body);
        match self.truncate_body {
            Some(limit) if text.len() > limit => {
                let mut end = limit;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text[..end].to_string()
            }
            _ => text.into_owned(),
        }
    }
}

impl Default for VerboseLoggingAddon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Addon for VerboseLoggingAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            params = ?request.params,
            json = ?request.json,
            data_len = request.data.as_ref().map(|d| d.len()),
            timeout = ?request.timeout,
            "executing request"
        );
        Ok(())
    }

    async fn process_response(
        &self,
        request: &RequestData,
        response: Response,
    ) -> ExecuteResult<Response> {
        let body = response.cached_body().map(|b| self.truncated(b));
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status.as_u16(),
            headers = ?response.headers,
            body = ?body,
            "received response"
        );
        Ok(response)
    }

    async fn process_error(
        &self,
        request: &RequestData,
        error: &ExecuteError,
    ) -> ExecuteResult<()> {
        self.base.process_error(request, error).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{request_simple, response_with_status};

    #[tokio::test]
    async fn hooks_pass_through() {
        let addon = LoggingAddon::new();
        let mut request = request_simple();

        addon.before_request(&mut request).await.unwrap();
        let response = addon
            .process_response(&request, response_with_status(502, &[]))
            .await
            .unwrap();
        assert_eq!(response.status.as_u16(), 502);
        addon
            .process_error(&request, &ExecuteError::Timeout)
            .await
            .unwrap();
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let addon = VerboseLoggingAddon::new().with_truncate_body(Some(4));
        // "héllo" — the accented char straddles the 4-byte cut.
        let out = addon.truncated("h\u{e9}llo".as_bytes());
        assert!(out.len() <= 4);
        assert!("h\u{e9}llo".starts_with(&out));
    }
}
