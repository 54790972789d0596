//! Core domain models for up-npm
//!
//! This module contains the fundamental types used throughout the application:
//! - Version classification (clean versions, magnitude and direction)
//! - Declared dependencies and the upgrade candidates derived from them
//! - Skip records for dependencies that produced no candidate
//! - Aggregations used by the summary renderer

mod dependency;
mod summary;
pub mod version;

pub use dependency::{DependencySpec, SkipReason, SkippedDependency, UpgradeCandidate};
pub use summary::{count_by_magnitude, sort_candidates, MagnitudeCounts};
pub use version::{
    classify, compare, parse_clean, CleanVersion, Comparison, UpgradeDirection, UpgradeMagnitude,
};
