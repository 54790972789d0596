//! Run configuration
//!
//! Values come from three layers, highest priority first:
//! 1. CLI flags
//! 2. `.up-npm.toml` next to the manifest
//! 3. Built-in defaults

use crate::cli::CliArgs;
use crate::error::ConfigError;
use crate::registry::DEFAULT_REGISTRY_URL;
use crate::resolver::DEFAULT_CONCURRENCY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the optional project config file
pub const CONFIG_FILENAME: &str = ".up-npm.toml";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of `.up-npm.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub registry: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub deadline_secs: Option<u64>,
    pub allow_downgrade: Option<bool>,
    pub no_dev: Option<bool>,
}

impl FileConfig {
    /// Parse config file content
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `.up-npm.toml` from `dir`; a missing file yields the empty config
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded config file");
                Self::parse(&path, &content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::ConfigReadError { path, source }),
        }
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub manifest_path: PathBuf,
    pub registry: String,
    pub concurrency: usize,
    pub timeout: Duration,
    pub deadline: Option<Duration>,
    pub filter: Option<String>,
    pub allow_downgrade: bool,
    pub no_dev: bool,
    pub update_patches: bool,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Settings {
    /// Merge CLI arguments over the config file over defaults
    pub fn resolve(args: &CliArgs, file: &FileConfig) -> Result<Self, ConfigError> {
        let concurrency = args
            .concurrency
            .or(file.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: concurrency.to_string(),
            });
        }

        let timeout = args
            .timeout
            .or_else(|| file.timeout_secs.map(Duration::from_secs))
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let deadline = args
            .deadline
            .or_else(|| file.deadline_secs.map(Duration::from_secs));

        let registry = args
            .registry
            .clone()
            .or_else(|| file.registry.clone())
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        Ok(Self {
            manifest_path: args.file.clone(),
            registry,
            concurrency,
            timeout,
            deadline,
            filter: args.filter.clone().filter(|f| !f.is_empty()),
            allow_downgrade: args.allow_downgrade || file.allow_downgrade.unwrap_or(false),
            no_dev: args.no_dev || file.no_dev.unwrap_or(false),
            update_patches: args.update_patches,
            dry_run: args.dry_run,
            json: args.json,
            verbose: args.verbose,
            quiet: args.quiet,
        })
    }

    /// Load the config file next to the manifest, then merge
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let file = FileConfig::load(&manifest_dir(&args.file))?;
        Self::resolve(args, &file)
    }

    /// Directory holding the manifest
    pub fn project_dir(&self) -> PathBuf {
        manifest_dir(&self.manifest_path)
    }

    /// Whether prompts are shown
    pub fn is_interactive(&self) -> bool {
        !self.dry_run && !self.json
    }
}

fn manifest_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
