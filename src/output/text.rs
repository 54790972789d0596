//! Text output formatter for human-readable display
//!
//! This module provides:
//! - A table of upgrade candidates, patch updates first
//! - Latest versions coloured from the component that changed
//! - Summary line with a per-magnitude breakdown
//! - Skip and locked-dependency notices

use crate::domain::{
    count_by_magnitude, sort_candidates, MagnitudeCounts, SkipReason, UpgradeCandidate,
    UpgradeDirection, UpgradeMagnitude,
};
use crate::output::{OutputFormatter, Report, Verbosity};
use crate::repository::extract_owner_repo;
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Colour a version string from the first component that changed.
///
/// Major updates are entirely red; minor updates are yellow from the minor
/// component on; patch updates are green on the patch component only.
pub fn colorize_version(version: &str, magnitude: UpgradeMagnitude) -> String {
    let split_after = |dots: usize| -> Option<(&str, &str)> {
        let (idx, _) = version.match_indices('.').nth(dots - 1)?;
        Some(version.split_at(idx + 1))
    };

    match magnitude {
        UpgradeMagnitude::Major => version.red().to_string(),
        UpgradeMagnitude::Minor => match split_after(1) {
            Some((head, tail)) => format!("{}{}", head, tail.yellow()),
            None => version.yellow().to_string(),
        },
        UpgradeMagnitude::Patch => match split_after(2) {
            Some((head, tail)) => format!("{}{}", head, tail.green()),
            None => version.green().to_string(),
        },
        UpgradeMagnitude::None => version.to_string(),
    }
}

/// One rendered table row: plain text for width, display text for output
struct Cell {
    plain: String,
    display: String,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        let plain = text.into();
        Self {
            display: plain.clone(),
            plain,
        }
    }

    fn styled(plain: impl Into<String>, display: String) -> Self {
        Self {
            plain: plain.into(),
            display,
        }
    }

    fn width(&self) -> usize {
        self.plain.chars().count()
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a text formatter; `color` is still subject to NO_COLOR
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn header(&self) -> Vec<&'static str> {
        let mut header = vec!["Package", "Current", "Latest", "Type", "Dev", "Repository"];
        if self.verbosity == Verbosity::Verbose {
            header.push("Released");
        }
        header
    }

    fn row(&self, candidate: &UpgradeCandidate) -> Vec<Cell> {
        let latest = if self.color {
            Cell::styled(
                &candidate.latest_version,
                colorize_version(&candidate.latest_version, candidate.magnitude),
            )
        } else {
            Cell::plain(&candidate.latest_version)
        };

        let kind = match candidate.direction {
            UpgradeDirection::Downgrade => format!("{} (downgrade)", candidate.magnitude),
            _ => candidate.magnitude.to_string(),
        };

        let repository = candidate
            .repository_url
            .as_deref()
            .and_then(|url| extract_owner_repo(url).ok())
            .map(|owner_repo| owner_repo.to_string())
            .unwrap_or_default();

        let mut row = vec![
            Cell::plain(&candidate.dependency_name),
            Cell::plain(&candidate.current_version),
            latest,
            Cell::plain(kind),
            Cell::plain(if candidate.is_dev { "dev" } else { "" }),
            Cell::plain(repository),
        ];

        if self.verbosity == Verbosity::Verbose {
            let released = candidate
                .hours_since_last_release
                .map(|h| format!("{}h ago", h))
                .unwrap_or_default();
            row.push(Cell::plain(released));
        }

        row
    }

    fn format_table(
        &self,
        candidates: &[&UpgradeCandidate],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let header = self.header();
        let rows: Vec<Vec<Cell>> = candidates.iter().map(|c| self.row(c)).collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].width())
                    .chain(std::iter::once(header[col].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header_line = header
            .iter()
            .zip(&widths)
            .map(|(title, width)| format!("{:width$}", title, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(writer, "  {}", self.paint(header_line.trim_end(), |s| s.bold()))?;

        for row in &rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    format!("{}{}", cell.display, " ".repeat(width - cell.width()))
                })
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(writer, "  {}", line.trim_end())?;
        }

        Ok(())
    }

    fn format_summary(
        &self,
        counts: &MagnitudeCounts,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let mut parts = Vec::new();
        if counts.patch > 0 {
            parts.push(self.paint(&format!("{} patch", counts.patch), |s| s.green()));
        }
        if counts.minor > 0 {
            parts.push(self.paint(&format!("{} minor", counts.minor), |s| s.yellow()));
        }
        if counts.major > 0 {
            parts.push(self.paint(&format!("{} major", counts.major), |s| s.red()));
        }

        if parts.is_empty() {
            writeln!(writer, "Found {} packages to update", counts.total)
        } else {
            writeln!(
                writer,
                "Found {} packages to update: {}",
                counts.total,
                parts.join(", ")
            )
        }
    }

    fn format_totals(&self, report: &Report<'_>, writer: &mut dyn Write) -> std::io::Result<()> {
        match report.filter {
            Some(filter) => {
                let matched = report.results.len() + report.results.skipped.len();
                writeln!(
                    writer,
                    "Filtered {} dependencies from a total of {} (filter: {})",
                    self.paint(&matched.to_string(), |s| s.blue()),
                    self.paint(&report.total_dependencies.to_string(), |s| s.blue()),
                    filter
                )
            }
            None => writeln!(
                writer,
                "Total dependencies: {}",
                self.paint(&report.total_dependencies.to_string(), |s| s.cyan())
            ),
        }
    }

    fn format_skips(&self, report: &Report<'_>, writer: &mut dyn Write) -> std::io::Result<()> {
        let mut skipped: Vec<_> = report.results.skipped.iter().collect();
        if skipped.is_empty() {
            return Ok(());
        }
        skipped.sort_by(|a, b| a.name.cmp(&b.name));

        for skip in skipped {
            let line = match &skip.reason {
                SkipReason::UnparseableRange(range) => format!(
                    "{} has unsupported/invalid version '{}', skipping...",
                    skip.name, range
                ),
                SkipReason::FetchFailed(message) => format!(
                    "Failed to fetch {} from the registry, skipping... ({})",
                    skip.name, message
                ),
                SkipReason::UnparseableLatest(latest) => format!(
                    "{} has an unrecognized latest version '{}', skipping...",
                    skip.name, latest
                ),
            };
            let line = if skip.is_fetch_failure() {
                self.paint(&line, |s| s.yellow())
            } else {
                self.paint(&line, |s| s.dimmed())
            };
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &Report<'_>, writer: &mut dyn Write) -> std::io::Result<()> {
        let results = report.results;
        let counts = count_by_magnitude(results.candidates.values());

        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(&counts, writer);
        }

        self.format_skips(report, writer)?;

        if results.is_empty() {
            writeln!(writer, "{}", self.paint("No outdated dependencies!", |s| s.green()))?;
            return Ok(());
        }

        let sorted = sort_candidates(results.candidates.values());
        self.format_table(&sorted, writer)?;
        writeln!(writer)?;

        self.format_totals(report, writer)?;
        self.format_summary(&counts, writer)?;

        if results.locked > 0 {
            writeln!(
                writer,
                "{}",
                self.paint(
                    &format!(
                        "{} locked {} (declared without a range operator)",
                        results.locked,
                        if results.locked == 1 {
                            "dependency"
                        } else {
                            "dependencies"
                        }
                    ),
                    |s| s.dimmed()
                )
            )?;
        }

        Ok(())
    }
}
