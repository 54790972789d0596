//! package.json reading and rewriting
//!
//! This module provides functionality to:
//! - Read declared dependencies and devDependencies
//! - Rewrite selected versions in place, keeping the file's formatting
//! - Back up the manifest before writing

mod package_json;
mod writer;

pub use package_json::{read_manifest, Manifest};
pub use writer::{
    apply_candidates, backup_path, create_backup, write_candidates, write_manifest, WriteResult,
};
