//! CLI argument parsing module for up-npm

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Parse a concurrency limit; must be a positive integer
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", s))?;
    if n == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    Ok(n)
}

/// Parse a duration given in whole seconds, with an optional `s` suffix
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let num_str = s.strip_suffix('s').unwrap_or(s);
    let secs: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", s))?;
    if secs == 0 {
        return Err("duration must be at least 1 second".to_string());
    }

    Ok(Duration::from_secs(secs))
}

/// Interactive npm dependency updater
#[derive(Parser, Debug, Clone)]
#[command(
    name = "up-npm",
    version,
    about = "Check npm dependencies for newer versions and update package.json"
)]
pub struct CliArgs {
    /// Manifest to inspect
    #[arg(long, default_value = "package.json")]
    pub file: PathBuf,

    // Resolution policy
    /// Skip devDependencies
    #[arg(long)]
    pub no_dev: bool,

    /// Only check dependencies whose name contains this text (case-sensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Also offer versions older than the one declared
    #[arg(long)]
    pub allow_downgrade: bool,

    /// Select every patch update without asking
    #[arg(long)]
    pub update_patches: bool,

    // Network
    /// Maximum registry requests in flight (default: 10)
    #[arg(short, long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds (default: 30)
    #[arg(long, value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Give up on registry requests still pending after this many seconds
    #[arg(long, value_parser = parse_seconds)]
    pub deadline: Option<Duration>,

    /// Registry base URL (default: https://registry.npmjs.org)
    #[arg(long)]
    pub registry: Option<String>,

    // Output options
    /// Show available updates without prompting or writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output results in JSON format (implies no prompts)
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Whether the run should prompt the user at all
    pub fn is_interactive(&self) -> bool {
        !self.dry_run && !self.json
    }
}
