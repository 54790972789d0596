//! up-npm - Interactive updater for npm dependencies
//!
//! Reads package.json, asks the registry for the latest version of every
//! dependency, and walks through the outdated ones before rewriting the file.

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use up_npm::cli::CliArgs;
use up_npm::config::Settings;
use up_npm::interaction::Prompter;
use up_npm::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; RUST_LOG wins over --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(&args)?;
    if settings.verbose {
        eprintln!("up-npm v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Manifest: {}", settings.manifest_path.display());
        eprintln!("Registry: {}", settings.registry);
        if settings.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let outcome = orchestrator.run(&mut prompter, &mut io::stdout()).await?;

    Ok(outcome.exit_code())
}
