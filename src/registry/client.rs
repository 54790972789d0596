//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Optional `Authorization: Bearer` header per request
//! - Status code mapping onto `FetchError`
//!
//! Each call makes exactly one attempt; callers decide what a failure means.

use crate::error::FetchError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("up-npm/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper; cheap to clone, clones share one connection pool
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with a custom per-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_config(timeout, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                FetchError::network_error("", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Perform a single GET request and decode the JSON body
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        auth_token: Option<&str>,
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(url);
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        debug!(package, url, "registry request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(package)
            } else {
                FetchError::network_error(package, e.to_string())
            }
        })?;

        let status = response.status();
        debug!(package, status = status.as_u16(), "registry response");

        match status {
            StatusCode::NOT_FOUND => return Err(FetchError::package_not_found(package)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::unauthorized(package, status.as_u16()))
            }
            s if !s.is_success() => {
                return Err(FetchError::network_error(package, format!("HTTP {}", s)))
            }
            _ => {}
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(package)
            } else {
                FetchError::invalid_response(package, format!("failed to parse JSON: {}", e))
            }
        })
    }
}
