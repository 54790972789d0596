//! up-npm - Interactive npm dependency updater library
//!
//! This library provides the pieces behind the `up-npm` binary:
//! - Reading dependency declarations from package.json
//! - Resolving latest versions from the npm registry with bounded concurrency
//! - Classifying upgrades as major, minor or patch
//! - Rendering results and prompting for which upgrades to apply
//! - Rewriting package.json in place, optionally with a backup

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod interaction;
pub mod manifest;
pub mod npmrc;
pub mod orchestrator;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod registry;
pub mod repository;
pub mod resolver;
