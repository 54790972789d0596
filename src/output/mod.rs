//! Output formatting for resolution results
//!
//! This module provides:
//! - Text output for human-readable display (table, summary, skips)
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::{colorize_version, TextFormatter};

use crate::resolver::ResultSet;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Summary line only
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Adds release age and links
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI flags
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color: true,
        }
    }
}

/// Everything a formatter needs to describe one run
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub results: &'a ResultSet,
    /// Dependencies declared in the sections that were checked
    pub total_dependencies: usize,
    /// Name filter in effect, if any
    pub filter: Option<&'a str>,
}

impl<'a> Report<'a> {
    pub fn new(results: &'a ResultSet, total_dependencies: usize) -> Self {
        Self {
            results,
            total_dependencies,
            filter: None,
        }
    }

    /// Sets the active filter (builder pattern)
    pub fn with_filter(mut self, filter: Option<&'a str>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write the report
    fn format(&self, report: &Report<'_>, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_config_default() {
        let config = OutputConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(config.color);
    }

    #[test]
    fn test_output_config_from_cli() {
        let config = OutputConfig::from_cli(true, false, false);
        assert_eq!(config.format, OutputFormat::Json);

        let config = OutputConfig::from_cli(false, true, false);
        assert_eq!(config.verbosity, Verbosity::Verbose);

        let config = OutputConfig::from_cli(false, true, true);
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_report_ignores_empty_filter() {
        let results = ResultSet::default();
        let report = Report::new(&results, 3).with_filter(Some(""));
        assert!(report.filter.is_none());

        let report = Report::new(&results, 3).with_filter(Some("react"));
        assert_eq!(report.filter, Some("react"));
    }

    #[test]
    fn test_create_formatter_json() {
        let results = ResultSet::default();
        let formatter = create_formatter(OutputConfig::from_cli(true, false, false));
        let mut out = Vec::new();
        formatter.format(&Report::new(&results, 0), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["locked"], 0);
    }
}
