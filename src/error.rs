//! Application error types using thiserror
//!
//! Error hierarchy:
//! - FetchError: a single dependency's registry lookup failed
//! - ManifestError: Issues reading or rewriting package.json
//! - RepositoryError: Repository URLs that carry no owner/repo pair
//! - ConfigError: Issues with CLI or config file values
//! - PromptError: Interactive selection failures

use std::path::PathBuf;
use thiserror::Error;

/// Failure to fetch metadata for one dependency.
///
/// Always isolated to the dependency it names; the resolver records it as a
/// skip and carries on with the rest of the manifest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Package not found in registry
    #[error("package '{package}' not found in registry")]
    PackageNotFound { package: String },

    /// Transport failure or unexpected HTTP status
    #[error("failed to fetch package '{package}': {message}")]
    NetworkError { package: String, message: String },

    /// Body could not be decoded or lacks `dist-tags.latest`
    #[error("invalid registry response for '{package}': {message}")]
    InvalidResponse { package: String, message: String },

    /// Request or resolution deadline elapsed
    #[error("timeout while fetching '{package}'")]
    Timeout { package: String },

    /// Registry rejected the credentials
    #[error("registry refused access to '{package}' (HTTP {status})")]
    Unauthorized { package: String, status: u16 },
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Neither dependencies nor devDependencies declare anything
    #[error("no dependencies found in {path}")]
    NoDependencies { path: PathBuf },

    /// Writer could not locate the entry to rewrite
    #[error("dependency '{package}' not found in section '{section}'")]
    DependencyNotFound { package: String, section: String },
}

/// Errors related to repository URL handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// URL path has fewer than two segments
    #[error("repository URL '{url}' has no owner/repository path")]
    MissingOwnerRepo { url: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Concurrency limit must be at least one
    #[error("invalid concurrency '{value}': expected a positive integer")]
    InvalidConcurrency { value: String },

    /// Config file exists but could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("failed to parse config file {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },
}

/// Errors raised by the interactive selection stage
#[derive(Error, Debug)]
pub enum PromptError {
    /// Reading from or writing to the terminal failed
    #[error("prompt I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Input closed before an answer was given
    #[error("input closed before an answer was given")]
    Interrupted,
}

impl FetchError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>) -> Self {
        FetchError::PackageNotFound {
            package: package.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(package: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::NetworkError {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(package: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::InvalidResponse {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>) -> Self {
        FetchError::Timeout {
            package: package.into(),
        }
    }

    /// Creates a new Unauthorized error
    pub fn unauthorized(package: impl Into<String>, status: u16) -> Self {
        FetchError::Unauthorized {
            package: package.into(),
            status,
        }
    }

    /// The dependency this failure belongs to
    pub fn package(&self) -> &str {
        match self {
            FetchError::PackageNotFound { package }
            | FetchError::NetworkError { package, .. }
            | FetchError::InvalidResponse { package, .. }
            | FetchError::Timeout { package }
            | FetchError::Unauthorized { package, .. } => package,
        }
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}
