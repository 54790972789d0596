//! JSON output formatter for machine processing

use crate::domain::{
    count_by_magnitude, sort_candidates, MagnitudeCounts, SkippedDependency, UpgradeCandidate,
};
use crate::output::{OutputFormatter, Report};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// Candidates in display order
    candidates: Vec<&'a UpgradeCandidate>,
    locked: usize,
    skipped: Vec<&'a SkippedDependency>,
    summary: MagnitudeCounts,
    total_dependencies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &Report<'_>, writer: &mut dyn Write) -> std::io::Result<()> {
        let results = report.results;

        let mut skipped: Vec<&SkippedDependency> = results.skipped.iter().collect();
        skipped.sort_by(|a, b| a.name.cmp(&b.name));

        let output = JsonOutput {
            candidates: sort_candidates(results.candidates.values()),
            locked: results.locked,
            skipped,
            summary: count_by_magnitude(results.candidates.values()),
            total_dependencies: report.total_dependencies,
            filter: report.filter,
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{compare, parse_clean, SkipReason};
    use crate::resolver::ResultSet;
    use serde_json::Value;

    fn render(report: &Report<'_>) -> Value {
        let mut out = Vec::new();
        JsonFormatter::new().format(report, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_json_structure() {
        let mut results = ResultSet::default();
        let current = parse_clean("^1.0.0").unwrap();
        let latest = parse_clean("1.0.5").unwrap();
        let c = UpgradeCandidate::new("chalk", &current, "1.0.5", compare(&current, &latest), true)
            .with_homepage(Some("https://github.com/chalk/chalk".into()));
        results.candidates.insert("chalk".into(), c);
        results.locked = 2;
        results.skipped.push(SkippedDependency::new(
            "ghost",
            false,
            SkipReason::FetchFailed("package 'ghost' not found in registry".into()),
        ));

        let json = render(&Report::new(&results, 4).with_filter(Some("h")));

        assert_eq!(json["locked"], 2);
        assert_eq!(json["total_dependencies"], 4);
        assert_eq!(json["filter"], "h");
        assert_eq!(json["summary"]["patch"], 1);
        assert_eq!(json["summary"]["total"], 1);

        let candidate = &json["candidates"][0];
        assert_eq!(candidate["dependency_name"], "chalk");
        assert_eq!(candidate["current_version"], "1.0.0");
        assert_eq!(candidate["latest_version"], "1.0.5");
        assert_eq!(candidate["magnitude"], "patch");
        assert_eq!(candidate["direction"], "upgrade");
        assert_eq!(candidate["version_prefix"], "^");
        assert_eq!(candidate["is_dev"], true);
        assert!(candidate.get("repository_url").is_none());

        let skip = &json["skipped"][0];
        assert_eq!(skip["name"], "ghost");
        assert_eq!(skip["reason"], "fetch_failed");
    }

    #[test]
    fn test_json_empty() {
        let results = ResultSet::default();
        let json = render(&Report::new(&results, 0));
        assert_eq!(json["candidates"], Value::Array(vec![]));
        assert_eq!(json["skipped"], Value::Array(vec![]));
        assert!(json.get("filter").is_none());
    }
}
