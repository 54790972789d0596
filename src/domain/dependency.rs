//! Dependency and upgrade candidate structures

use super::version::{CleanVersion, Comparison, UpgradeDirection, UpgradeMagnitude};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dependency as declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Registry package identifier
    pub name: String,
    /// Raw manifest value (e.g., `^1.2.3`, `1.2.3`, `*`)
    pub declared_range: String,
}

impl DependencySpec {
    /// Creates a new dependency spec
    pub fn new(name: impl Into<String>, declared_range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_range: declared_range.into(),
        }
    }

    /// Builds specs from manifest `(name, range)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(name, range)| Self::new(name, range))
            .collect()
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.declared_range)
    }
}

/// An available version change for one dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCandidate {
    pub dependency_name: String,
    /// Current version as a clean `major.minor.patch` string
    pub current_version: String,
    /// Latest version as published (`dist-tags.latest`)
    pub latest_version: String,
    pub magnitude: UpgradeMagnitude,
    pub direction: UpgradeDirection,
    /// Range operator to keep when writing the new version back
    pub version_prefix: String,
    pub is_dev: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Canonical HTTPS repository URL, if one could be derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_since_last_release: Option<f64>,
    /// Set by the selection stage
    pub should_apply: bool,
}

impl UpgradeCandidate {
    /// Creates a candidate from a parsed current version and a comparison
    pub fn new(
        name: impl Into<String>,
        current: &CleanVersion,
        latest_version: impl Into<String>,
        comparison: Comparison,
        is_dev: bool,
    ) -> Self {
        Self {
            dependency_name: name.into(),
            current_version: current.to_string(),
            latest_version: latest_version.into(),
            magnitude: comparison.magnitude,
            direction: comparison.direction,
            version_prefix: current.prefix.clone(),
            is_dev,
            homepage: None,
            repository_url: None,
            hours_since_last_release: None,
            should_apply: false,
        }
    }

    /// Sets the homepage (builder pattern)
    pub fn with_homepage(mut self, homepage: Option<String>) -> Self {
        self.homepage = homepage.filter(|h| !h.is_empty());
        self
    }

    /// Sets the canonical repository URL (builder pattern)
    pub fn with_repository_url(mut self, url: Option<String>) -> Self {
        self.repository_url = url.filter(|u| !u.is_empty());
        self
    }

    /// Sets the age of the latest release (builder pattern)
    pub fn with_hours_since_last_release(mut self, hours: Option<f64>) -> Self {
        self.hours_since_last_release = hours;
        self
    }

    /// The declared range had no operator in front of it
    pub fn is_locked(&self) -> bool {
        self.version_prefix.is_empty()
    }

    /// Latest version published less than a day ago
    pub fn is_recent_release(&self) -> bool {
        matches!(self.hours_since_last_release, Some(h) if h > 0.0 && h < 24.0)
    }

    /// Manifest value to write when this candidate is applied
    pub fn updated_range(&self) -> String {
        format!("{}{}", self.version_prefix, self.latest_version)
    }

    /// Manifest section this dependency lives in
    pub fn section(&self) -> &'static str {
        if self.is_dev {
            "devDependencies"
        } else {
            "dependencies"
        }
    }
}

impl fmt::Display for UpgradeCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dev_marker = if self.is_dev { " (dev)" } else { "" };
        write!(
            f,
            "{}: {} → {} [{}]{}",
            self.dependency_name,
            self.current_version,
            self.latest_version,
            self.magnitude,
            dev_marker
        )
    }
}

/// Reason a dependency produced no candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Declared range has no recognizable version
    UnparseableRange(String),
    /// Registry lookup failed
    FetchFailed(String),
    /// Registry's latest version has no recognizable version
    UnparseableLatest(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnparseableRange(range) => {
                write!(f, "unsupported or invalid version '{}'", range)
            }
            SkipReason::FetchFailed(msg) => write!(f, "fetch failed: {}", msg),
            SkipReason::UnparseableLatest(version) => {
                write!(f, "unrecognized latest version '{}'", version)
            }
        }
    }
}

/// A dependency skipped during resolution, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDependency {
    pub name: String,
    pub is_dev: bool,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl SkippedDependency {
    pub fn new(name: impl Into<String>, is_dev: bool, reason: SkipReason) -> Self {
        Self {
            name: name.into(),
            is_dev,
            reason,
        }
    }

    /// Whether the skip came from a failed registry fetch
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self.reason, SkipReason::FetchFailed(_))
    }
}

impl fmt::Display for SkippedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}
