//! Stock retry-vote addons.

use std::time::Duration;

use async_trait::async_trait;
use http::header::RETRY_AFTER;
use http::StatusCode;

use crate::types::Response;

use super::Retryable;

/// Votes to retry any 5xx response, with no delay override.
#[derive(Debug, Default)]
pub struct Retry5xxAddon;

#[async_trait]
impl Retryable for Retry5xxAddon {
    async fn need_retry(&self, response: &Response) -> (bool, Option<Duration>) {
        if response.status.as_u16() >= 500 {
            (true, None)
        } else {
            (false, None)
        }
    }
}

/// Votes to retry a 429 response, honoring a numeric `Retry-After` header
/// as the delay override. An unparsable value falls back to the executor's
/// default sleep.
#[derive(Debug, Default)]
pub struct Retry429Addon;

#[async_trait]
impl Retryable for Retry429Addon {
    async fn need_retry(&self, response: &Response) -> (bool, Option<Duration>) {
        if response.status != StatusCode::TOO_MANY_REQUESTS {
            return (false, None);
        }

        let retry_after = response
            .headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64);

        (true, retry_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::response_with_status;
    use test_case::test_case;

    #[test_case(500, true; "internal server error")]
    #[test_case(503, true; "service unavailable")]
    #[test_case(599, true; "upper edge of 5xx")]
    #[test_case(499, false; "client error")]
    #[test_case(200, false; "success")]
    #[tokio::test]
    async fn retry_5xx_votes_on_server_errors(status: u16, expected: bool) {
        let response = response_with_status(status, &[]);
        let (retry, delay) = Retry5xxAddon.need_retry(&response).await;
        assert_eq!(retry, expected);
        assert!(delay.is_none());
    }

    #[tokio::test]
    async fn retry_429_reads_retry_after() {
        let response = response_with_status(429, &[("retry-after", "42")]);
        let (retry, delay) = Retry429Addon.need_retry(&response).await;
        assert!(retry);
        assert_eq!(delay, Some(Duration::from_secs(42)));
    }

    #[tokio::test]
    async fn retry_429_without_header_has_no_override() {
        let response = response_with_status(429, &[]);
        let (retry, delay) = Retry429Addon.need_retry(&response).await;
        assert!(retry);
        assert!(delay.is_none());
    }

    #[test_case("soon"; "not a number")]
    #[test_case("-3"; "negative")]
    #[test_case("inf"; "non finite")]
    #[tokio::test]
    async fn retry_429_with_bad_retry_after_falls_back(value: &str) {
        let response = response_with_status(429, &[("retry-after", value)]);
        let (retry, delay) = Retry429Addon.need_retry(&response).await;
        assert!(retry);
        assert!(delay.is_none());
    }

    #[tokio::test]
    async fn retry_429_ignores_other_statuses() {
        let response = response_with_status(500, &[("retry-after", "42")]);
        let (retry, _) = Retry429Addon.need_retry(&response).await;
        assert!(!retry);
    }
}
