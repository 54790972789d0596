//! Registry access for fetching package metadata
//!
//! This module provides:
//! - The `RegistryClient` seam the resolver fetches through
//! - `RegistryMetadata`, the decoded per-package document
//! - HTTP client foundation (timeout, User-Agent, bearer token)
//! - npm registry adapter

mod client;
mod npm;

pub use client::HttpClient;
pub use npm::{NpmRegistry, DEFAULT_REGISTRY_URL};

use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Metadata for one package, fetched once per resolution run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistryMetadata {
    /// `dist-tags.latest`
    pub latest_version: String,
    pub homepage: Option<String>,
    /// Raw `repository.url`, before canonicalization
    pub repository_url: Option<String>,
    /// Publish time per version (`time.<version>`)
    pub published: HashMap<String, DateTime<Utc>>,
}

impl RegistryMetadata {
    /// Creates metadata with only a latest version
    pub fn new(latest_version: impl Into<String>) -> Self {
        Self {
            latest_version: latest_version.into(),
            ..Default::default()
        }
    }

    /// Sets the homepage (builder pattern)
    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Sets the raw repository URL (builder pattern)
    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        self.repository_url = Some(url.into());
        self
    }

    /// Records a publish time (builder pattern)
    pub fn with_published(mut self, version: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.published.insert(version.into(), at);
        self
    }

    /// Publish time of the latest version, if the registry reported one
    pub fn latest_published_at(&self) -> Option<DateTime<Utc>> {
        self.published.get(&self.latest_version).copied()
    }

    /// Hours between the latest publish and `now`, rounded to one decimal
    pub fn hours_since_latest_release(&self, now: DateTime<Utc>) -> Option<f64> {
        let published = self.latest_published_at()?;
        let hours = (now - published).num_seconds() as f64 / 3600.0;
        Some((hours * 10.0).round() / 10.0)
    }
}

/// A package registry that can be asked for one package's metadata.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch metadata for a package, attaching `auth_token` as a bearer token
    async fn fetch(
        &self,
        package: &str,
        auth_token: Option<&str>,
    ) -> Result<RegistryMetadata, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_latest_published_at() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let meta = RegistryMetadata::new("2.0.0")
            .with_published("1.0.0", at - chrono::Duration::days(30))
            .with_published("2.0.0", at);
        assert_eq!(meta.latest_published_at(), Some(at));
    }

    #[test]
    fn test_hours_since_latest_release_rounds() {
        let published = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let now = published + chrono::Duration::minutes(90) + chrono::Duration::seconds(20);
        let meta = RegistryMetadata::new("1.0.0").with_published("1.0.0", published);
        assert_eq!(meta.hours_since_latest_release(now), Some(1.5));
    }

    #[test]
    fn test_hours_since_latest_release_missing() {
        let meta = RegistryMetadata::new("1.0.0");
        assert!(meta.hours_since_latest_release(Utc::now()).is_none());
    }
}
