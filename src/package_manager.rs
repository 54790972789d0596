//! Package manager detection for the post-update install hint
//!
//! The manager is inferred from the lockfile sitting next to the manifest.
//! Nothing is executed; the user is told which install command to run.

use std::fmt;
use std::path::Path;

/// Node.js package managers recognised by their lockfiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

/// Lockfiles in order of preference
const LOCKFILES: &[(&str, PackageManager)] = &[
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("package-lock.json", PackageManager::Npm),
];

impl PackageManager {
    /// Detect the package manager for a project directory (npm when no lockfile)
    pub fn detect(project_dir: &Path) -> Self {
        LOCKFILES
            .iter()
            .find(|(lockfile, _)| project_dir.join(lockfile).exists())
            .map(|(_, pm)| *pm)
            .unwrap_or(PackageManager::Npm)
    }

    /// Executable name
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    /// Install command line
    pub fn install_command(&self) -> String {
        format!("{} install", self.command())
    }

    /// Message shown after the manifest was written
    pub fn install_hint(&self) -> String {
        format!("Run '{}' to install dependencies", self.install_command())
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}
