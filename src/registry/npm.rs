//! npm Registry adapter
//!
//! Fetches package metadata from the npm registry.
//! API endpoint: https://registry.npmjs.org/{package}

use crate::error::FetchError;
use crate::registry::{HttpClient, RegistryClient, RegistryMetadata};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// npm registry base URL
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm package document.
///
/// Decoded loosely: every field is optional at this level so that a missing
/// or oddly-typed `homepage`/`repository`/`time` never fails the fetch.
#[derive(Debug, Default, Deserialize)]
struct NpmPackageResponse {
    #[serde(rename = "dist-tags", default)]
    dist_tags: Option<Value>,
    #[serde(default)]
    homepage: Option<Value>,
    /// Either `{ "type": "git", "url": "…" }` or a bare string
    #[serde(default)]
    repository: Option<Value>,
    #[serde(default)]
    time: Option<Value>,
}

impl NpmPackageResponse {
    fn into_metadata(self, package: &str) -> Result<RegistryMetadata, FetchError> {
        let latest = self
            .dist_tags
            .as_ref()
            .and_then(|tags| tags.get("latest"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FetchError::invalid_response(package, "missing dist-tags.latest"))?;

        let homepage = self
            .homepage
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string);

        let repository_url = match &self.repository {
            Some(Value::String(url)) => Some(url.clone()),
            Some(Value::Object(obj)) => obj.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };

        let mut published = HashMap::new();
        if let Some(Value::Object(times)) = &self.time {
            for (version, stamp) in times {
                if let Some(at) = stamp
                    .as_str()
                    .and_then(|s| s.parse::<DateTime<Utc>>().ok())
                {
                    published.insert(version.clone(), at);
                }
            }
        }

        Ok(RegistryMetadata {
            latest_version: latest.to_string(),
            homepage,
            repository_url,
            published,
        })
    }
}

/// npm Registry adapter
pub struct NpmRegistry {
    client: HttpClient,
    base_url: String,
}

impl NpmRegistry {
    /// Create a new npm adapter against the public registry
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_REGISTRY_URL)
    }

    /// Create a new npm adapter against a custom registry
    pub fn with_base_url(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package: &str) -> String {
        if package.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package.replace('/', "%2F")
        } else {
            package.to_string()
        }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}", self.base_url, Self::encode_package_name(package))
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn fetch(
        &self,
        package: &str,
        auth_token: Option<&str>,
    ) -> Result<RegistryMetadata, FetchError> {
        let url = self.build_url(package);
        let response: NpmPackageResponse =
            self.client.get_json(&url, package, auth_token).await?;
        response.into_metadata(package)
    }
}
