//! Authentication addons.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::ExecuteResult;
use crate::types::{header_value, RequestData, Response};

use super::{Addon, Retryable};

/// Supplies bearer tokens to [`BearerAuthAddon`].
///
/// A provider backed by a static value is just a non-suspending
/// implementation; a refreshing provider fetches or renews the token here.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current token, fetched or refreshed as needed.
    async fn token(&self) -> ExecuteResult<SecretString>;
}

/// Bearer authentication with a refreshable token.
///
/// Sets `Authorization: Bearer <token>` before every attempt and votes to
/// retry a 401, so the next attempt picks up a freshly provided token.
pub struct BearerAuthAddon {
    provider: Box<dyn TokenProvider>,
}

impl BearerAuthAddon {
    /// Authenticate with tokens from the given provider.
    pub fn new(provider: impl TokenProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }
}

#[async_trait]
impl Addon for BearerAuthAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        let token = self.provider.token().await?;
        let value = header_value(&format!("Bearer {}", token.expose_secret()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[async_trait]
impl Retryable for BearerAuthAddon {
    async fn need_retry(&self, response: &Response) -> (bool, Option<Duration>) {
        if response.status == StatusCode::UNAUTHORIZED {
            (true, None)
        } else {
            (false, None)
        }
    }
}

/// Bearer authentication with a fixed token. Never votes for a retry: a 401
/// against a static credential will not heal itself.
pub struct StaticBearerAuthAddon {
    header: SecretString,
}

impl StaticBearerAuthAddon {
    /// Authenticate with the given token.
    pub fn new(token: SecretString) -> Self {
        Self {
            header: SecretString::new(format!("Bearer {}", token.expose_secret())),
        }
    }
}

#[async_trait]
impl Addon for StaticBearerAuthAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        let value = header_value(self.header.expose_secret())?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// HTTP basic authentication with fixed credentials. The header value is
/// computed once at construction.
pub struct StaticBasicAuthAddon {
    header: SecretString,
}

impl StaticBasicAuthAddon {
    /// Authenticate as `login` with `password`.
    pub fn new(login: &str, password: &SecretString) -> Self {
        let encoded = BASE64.encode(format!("{login}:{}", password.expose_secret()));
        Self {
            header: SecretString::new(format!("Basic {encoded}")),
        }
    }
}

#[async_trait]
impl Addon for StaticBasicAuthAddon {
    async fn before_request(&self, request: &mut RequestData) -> ExecuteResult<()> {
        let value = header_value(self.header.expose_secret())?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
