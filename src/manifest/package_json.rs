//! package.json reader
//!
//! Handles:
//! - dependencies
//! - devDependencies

use crate::domain::DependencySpec;
use crate::error::ManifestError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Dependencies declared in a package.json, plus the raw text for rewriting
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub path: PathBuf,
    pub dependencies: Vec<DependencySpec>,
    pub dev_dependencies: Vec<DependencySpec>,
    /// File content exactly as read
    pub raw: String,
}

impl Manifest {
    /// Parse manifest content read from `path`
    pub fn parse(path: impl Into<PathBuf>, raw: String) -> Result<Self, ManifestError> {
        let path = path.into();
        let json: Value = serde_json::from_str(&raw)
            .map_err(|e| ManifestError::json_parse_error(&path, e.to_string()))?;

        let dependencies = section(&json, "dependencies");
        let dev_dependencies = section(&json, "devDependencies");

        if dependencies.is_empty() && dev_dependencies.is_empty() {
            return Err(ManifestError::NoDependencies { path });
        }

        Ok(Self {
            path,
            dependencies,
            dev_dependencies,
            raw,
        })
    }

    /// Total number of declared dependencies across both sections
    pub fn len(&self) -> usize {
        self.dependencies.len() + self.dev_dependencies.len()
    }

    /// Returns true if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn section(json: &Value, key: &str) -> Vec<DependencySpec> {
    json.get(key)
        .and_then(Value::as_object)
        .map(string_entries)
        .unwrap_or_default()
}

fn string_entries(deps: &Map<String, Value>) -> Vec<DependencySpec> {
    DependencySpec::from_pairs(
        deps.iter()
            .filter_map(|(name, value)| value.as_str().map(|range| (name.as_str(), range))),
    )
}

/// Read and parse a package.json from disk
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ManifestError::not_found(path)
        } else {
            ManifestError::read_error(path, e)
        }
    })?;
    Manifest::parse(path, raw)
}
