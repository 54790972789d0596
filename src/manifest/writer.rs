//! Manifest rewriting and backup
//!
//! Selected candidates are written back as a text-level edit: only the version
//! string of each chosen entry changes, inside the section the candidate came
//! from. Whitespace, key order and every other byte stay as they were.

use crate::domain::UpgradeCandidate;
use crate::error::ManifestError;
use chrono::{DateTime, Local};
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp layout used in backup file names
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Result of writing selected candidates to a manifest file
#[derive(Debug)]
pub struct WriteResult {
    pub path: PathBuf,
    /// Number of entries rewritten
    pub updates_applied: usize,
    /// Backup written before the manifest, if one was requested
    pub backup: Option<PathBuf>,
}

/// Rewrite `raw` (the content read from `path`) with every selected
/// candidate and store it, optionally backing up the original first.
///
/// Nothing touches the disk when no candidate is selected, or when a selected
/// entry cannot be located.
pub fn write_candidates<'a>(
    path: &Path,
    raw: &str,
    candidates: impl IntoIterator<Item = &'a UpgradeCandidate>,
    backup: bool,
) -> Result<WriteResult, ManifestError> {
    let (content, applied) = apply_candidates(raw, candidates)?;
    let mut result = WriteResult {
        path: path.to_path_buf(),
        updates_applied: applied,
        backup: None,
    };

    if applied == 0 {
        return Ok(result);
    }

    if backup {
        result.backup = Some(create_backup(path)?);
    }

    write_manifest(path, &content)?;
    Ok(result)
}

/// Apply every candidate with `should_apply` set to the manifest text.
///
/// Returns the new text and how many entries were rewritten.
pub fn apply_candidates<'a>(
    raw: &str,
    candidates: impl IntoIterator<Item = &'a UpgradeCandidate>,
) -> Result<(String, usize), ManifestError> {
    let mut content = raw.to_string();
    let mut applied = 0;

    for candidate in candidates.into_iter().filter(|c| c.should_apply) {
        content = update_entry(
            &content,
            candidate.section(),
            &candidate.dependency_name,
            &candidate.updated_range(),
        )?;
        debug!(package = %candidate.dependency_name, to = %candidate.updated_range(), "rewrote entry");
        applied += 1;
    }

    Ok((content, applied))
}

/// Replace the value of `package` inside the top-level `section` object
fn update_entry(
    content: &str,
    section: &str,
    package: &str,
    new_value: &str,
) -> Result<String, ManifestError> {
    let not_found = || ManifestError::DependencyNotFound {
        package: package.to_string(),
        section: section.to_string(),
    };

    let span = section_span(content, section).ok_or_else(not_found)?;
    let body = &content[span.clone()];

    let pattern = format!(r#"("{}"\s*:\s*)"([^"]*)""#, regex::escape(package));
    let re = Regex::new(&pattern).map_err(|_| not_found())?;
    let caps = re.captures(body).ok_or_else(not_found)?;
    let value = caps.get(2).ok_or_else(not_found)?;

    let start = span.start + value.start();
    let end = span.start + value.end();

    let mut updated = String::with_capacity(content.len() + new_value.len());
    updated.push_str(&content[..start]);
    updated.push_str(new_value);
    updated.push_str(&content[end..]);
    Ok(updated)
}

/// Byte range of the body of a top-level object-valued key
fn section_span(content: &str, section: &str) -> Option<Range<usize>> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut last_string: Option<Range<usize>> = None;
    let mut key: Option<Range<usize>> = None;
    let mut target: Option<(usize, usize)> = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && bytes[j] != b'"' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                if j >= bytes.len() {
                    return None;
                }
                last_string = Some(start..j);
                i = j;
            }
            b':' if depth == 1 => key = last_string.take(),
            b',' if depth == 1 => key = None,
            b'{' | b'[' => {
                depth += 1;
                let is_target = depth == 2
                    && bytes[i] == b'{'
                    && target.is_none()
                    && key.as_ref().is_some_and(|k| &content[k.clone()] == section);
                if is_target {
                    target = Some((i + 1, depth));
                }
            }
            b'}' | b']' => {
                if let Some((start, target_depth)) = target {
                    if depth == target_depth {
                        return Some(start..i);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Write content to a manifest file
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}

/// Path of the backup for `path` taken at `at`
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package.json".to_string());
    let backup_name = format!("backup.{}.{}", at.format(BACKUP_TIMESTAMP_FORMAT), file_name);
    path.with_file_name(backup_name)
}

/// Copy the manifest next to itself as `backup.<timestamp>.<file name>`
pub fn create_backup(path: &Path) -> Result<PathBuf, ManifestError> {
    let target = backup_path(path, Local::now());
    fs::copy(path, &target).map_err(|e| ManifestError::write_error(&target, e))?;
    debug!(backup = %target.display(), "backed up manifest");
    Ok(target)
}
