//! Update orchestrator for coordinating the entire update workflow
//!
//! This module provides:
//! - Workflow coordination: read → resolve → render → select → write
//! - One shared resolver (and HTTP client) for both dependency sections
//! - Dry-run and JSON modes that never prompt or write
//! - Exit status derived from how the run went

use crate::config::Settings;
use crate::domain::DependencySpec;
use crate::interaction::{Prompter, WriteChoice};
use crate::manifest::{read_manifest, write_candidates, Manifest, WriteResult};
use crate::npmrc;
use crate::output::{create_formatter, OutputConfig, Report};
use crate::package_manager::PackageManager;
use crate::progress::Progress;
use crate::registry::{HttpClient, NpmRegistry, RegistryClient};
use crate::resolver::{ResolveOptions, ResolvePolicy, ResultSet, Resolver};
use anyhow::Context;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Exit status when some dependencies could not be fetched
const EXIT_PARTIAL: u8 = 2;

/// Orchestrator for coordinating the update workflow
pub struct Orchestrator {
    settings: Settings,
    registry: Arc<dyn RegistryClient>,
}

/// What a run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub results: ResultSet,
    /// Dependencies declared in the checked sections
    pub total_dependencies: usize,
    /// Present when the manifest was written
    pub write: Option<WriteResult>,
}

impl RunOutcome {
    /// Process exit status: 0 when every fetch succeeded, 2 otherwise
    pub fn exit_status(&self) -> u8 {
        if self.results.fetch_failures() > 0 {
            EXIT_PARTIAL
        } else {
            0
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

impl Orchestrator {
    /// Create an orchestrator talking to the configured registry
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client = HttpClient::with_timeout(settings.timeout)
            .context("failed to set up the registry client")?;
        let registry = NpmRegistry::with_base_url(client, &settings.registry);
        Ok(Self::with_registry(settings, Arc::new(registry)))
    }

    /// Create an orchestrator with a custom registry (for testing)
    pub fn with_registry(settings: Settings, registry: Arc<dyn RegistryClient>) -> Self {
        Self { settings, registry }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn policy(&self, auth_token: Option<String>) -> ResolvePolicy {
        ResolvePolicy {
            filter: self.settings.filter.clone(),
            allow_downgrade: self.settings.allow_downgrade,
            auth_token,
        }
    }

    /// Resolve dependencies, then devDependencies unless disabled.
    ///
    /// `--deadline` is one budget for both sections, counted from here.
    pub async fn resolve(&self, manifest: &Manifest, auth_token: Option<String>) -> ResultSet {
        let deadline = self.settings.deadline.map(|d| Instant::now() + d);

        let sections: Vec<(&[DependencySpec], bool)> = if self.settings.no_dev {
            vec![(manifest.dependencies.as_slice(), false)]
        } else {
            vec![
                (manifest.dependencies.as_slice(), false),
                (manifest.dev_dependencies.as_slice(), true),
            ]
        };

        let total: usize = sections.iter().map(|(deps, _)| deps.len()).sum();
        let show_progress = !self.settings.quiet && !self.settings.json;
        let progress = Progress::fetches(total as u64, show_progress);

        let resolver = Resolver::new(Arc::clone(&self.registry))
            .with_options(ResolveOptions {
                concurrency: self.settings.concurrency,
                deadline,
            })
            .with_progress(progress.clone());
        let policy = self.policy(auth_token);

        let mut results = ResultSet::default();
        for (deps, is_dev) in sections {
            results.merge(resolver.resolve(deps, is_dev, &policy).await);
        }

        progress.clear();
        info!(
            candidates = results.len(),
            locked = results.locked,
            skipped = results.skipped.len(),
            "resolution finished"
        );
        results
    }

    /// Run the whole workflow, rendering to `out` and prompting through `prompter`
    pub async fn run<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
        out: &mut dyn Write,
    ) -> anyhow::Result<RunOutcome> {
        let path = &self.settings.manifest_path;
        let manifest = read_manifest(path)?;
        debug!(
            path = %path.display(),
            dependencies = manifest.dependencies.len(),
            dev_dependencies = manifest.dev_dependencies.len(),
            "read manifest"
        );

        let auth_token = npmrc::discover(&self.settings.project_dir(), &self.settings.registry)
            .map(|(token, _)| token);
        let mut results = self.resolve(&manifest, auth_token).await;

        let total_dependencies = if self.settings.no_dev {
            manifest.dependencies.len()
        } else {
            manifest.len()
        };

        let formatter = create_formatter(OutputConfig::from_cli(
            self.settings.json,
            self.settings.verbose,
            self.settings.quiet,
        ));
        let report = Report::new(&results, total_dependencies)
            .with_filter(self.settings.filter.as_deref());
        formatter.format(&report, out)?;
        out.flush()?;

        let mut outcome = RunOutcome {
            results: ResultSet::default(),
            total_dependencies,
            write: None,
        };

        if !self.settings.is_interactive() || results.is_empty() {
            outcome.results = results;
            return Ok(outcome);
        }

        let selected = prompter.select(&mut results, self.settings.update_patches)?;
        if selected == 0 {
            prompter.note("No packages have been selected to update")?;
            outcome.results = results;
            return Ok(outcome);
        }

        let backup = match prompter.confirm_write(selected)? {
            WriteChoice::No => {
                prompter.note("Cancelled update process")?;
                outcome.results = results;
                return Ok(outcome);
            }
            WriteChoice::Yes => false,
            WriteChoice::YesWithBackup => true,
        };

        let written = write_candidates(path, &manifest.raw, results.selected(), backup)?;

        if let Some(backup_path) = &written.backup {
            prompter.note(&format!("Backup written to {}", backup_path.display()))?;
        }
        prompter.note(&format!(
            "\n✅ {} has been updated with {} updated packages\n",
            path.display(),
            written.updates_applied
        ))?;
        prompter.note(&PackageManager::detect(&self.settings.project_dir()).install_hint())?;

        outcome.write = Some(written);
        outcome.results = results;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;
    use crate::config::FileConfig;
    use crate::error::FetchError;
    use crate::registry::RegistryMetadata;
    use async_trait::async_trait;
    use clap::Parser;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;

    struct StubRegistry {
        latest: HashMap<&'static str, &'static str>,
    }

    #[async_trait]
    impl RegistryClient for StubRegistry {
        async fn fetch(
            &self,
            package: &str,
            _auth_token: Option<&str>,
        ) -> Result<RegistryMetadata, FetchError> {
            self.latest
                .get(package)
                .map(|v| RegistryMetadata::new(*v))
                .ok_or_else(|| FetchError::package_not_found(package))
        }
    }

    /// Answers every package with 2.0.0 after a fixed delay
    struct SlowRegistry(std::time::Duration);

    #[async_trait]
    impl RegistryClient for SlowRegistry {
        async fn fetch(
            &self,
            _package: &str,
            _auth_token: Option<&str>,
        ) -> Result<RegistryMetadata, FetchError> {
            tokio::time::sleep(self.0).await;
            Ok(RegistryMetadata::new("2.0.0"))
        }
    }

    fn stub() -> Arc<dyn RegistryClient> {
        Arc::new(StubRegistry {
            latest: HashMap::from([
                ("lodash", "4.17.21"),
                ("react", "18.3.1"),
                ("vitest", "1.6.0"),
            ]),
        })
    }

    const MANIFEST: &str = r#"{
  "name": "demo",
  "dependencies": {
    "lodash": "^4.17.0",
    "react": "^18.2.0",
    "missing": "^1.0.0"
  },
  "devDependencies": {
    "vitest": "~1.2.0"
  }
}
"#;

    fn setup(extra: &[&str]) -> (TempDir, Orchestrator) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let mut argv = vec!["up-npm", "--file", path.to_str().unwrap(), "-q"];
        argv.extend_from_slice(extra);
        let args = CliArgs::parse_from(argv);
        let settings = Settings::resolve(&args, &FileConfig::default()).unwrap();
        (dir, Orchestrator::with_registry(settings, stub()))
    }

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new()).with_color(false)
    }

    fn manifest_text(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("package.json")).unwrap()
    }

    #[tokio::test]
    async fn dry_run_reports_without_writing() {
        let (dir, orchestrator) = setup(&["--dry-run"]);
        let mut out = Vec::new();

        let outcome = orchestrator.run(&mut prompter(""), &mut out).await.unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.total_dependencies, 4);
        assert_eq!(outcome.results.fetch_failures(), 1);
        assert_eq!(outcome.exit_status(), 2);
        assert!(outcome.write.is_none());
        assert_eq!(manifest_text(dir.path()), MANIFEST);
        assert!(String::from_utf8(out).unwrap().contains("Found 3 packages"));
    }

    #[tokio::test]
    async fn no_dev_skips_dev_dependencies() {
        let (_dir, orchestrator) = setup(&["--dry-run", "--no-dev"]);
        let mut out = Vec::new();

        let outcome = orchestrator.run(&mut prompter(""), &mut out).await.unwrap();

        assert_eq!(outcome.total_dependencies, 3);
        assert!(outcome.results.get("vitest").is_none());
    }

    #[tokio::test]
    async fn interactive_run_writes_selected() {
        let (dir, orchestrator) = setup(&[]);
        let mut out = Vec::new();
        // lodash (patch) → update, react (minor) → skip, vitest (minor) → update, then yes
        let mut p = prompter("u\ns\nu\ny\n");

        let outcome = orchestrator.run(&mut p, &mut out).await.unwrap();

        let written = outcome.write.unwrap();
        assert_eq!(written.updates_applied, 2);
        assert!(written.backup.is_none());

        let text = manifest_text(dir.path());
        assert!(text.contains(r#""lodash": "^4.17.21""#));
        assert!(text.contains(r#""react": "^18.2.0""#));
        assert!(text.contains(r#""vitest": "~1.6.0""#));
    }

    #[tokio::test]
    async fn interactive_run_declined_leaves_file() {
        let (dir, orchestrator) = setup(&["--update-patches"]);
        let mut out = Vec::new();
        let mut p = prompter("s\ns\nn\n");

        let outcome = orchestrator.run(&mut p, &mut out).await.unwrap();

        assert!(outcome.write.is_none());
        assert!(outcome.results.get("lodash").unwrap().should_apply);
        assert_eq!(manifest_text(dir.path()), MANIFEST);
    }

    #[tokio::test]
    async fn deadline_covers_dev_section_too() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(
            &path,
            r#"{ "dependencies": { "app": "^1.0.0" }, "devDependencies": { "tool": "^1.0.0" } }"#,
        )
        .unwrap();
        let args = CliArgs::parse_from(["up-npm", "--file", path.to_str().unwrap(), "--json"]);
        let mut settings = Settings::resolve(&args, &FileConfig::default()).unwrap();
        settings.deadline = Some(std::time::Duration::from_millis(400));
        let registry = Arc::new(SlowRegistry(std::time::Duration::from_millis(300)));
        let orchestrator = Orchestrator::with_registry(settings, registry);

        let outcome = orchestrator
            .run(&mut prompter(""), &mut Vec::new())
            .await
            .unwrap();

        // The production fetch uses 300ms of the 400ms budget; the dev one runs out
        assert!(outcome.results.get("app").is_some());
        assert!(outcome.results.get("tool").is_none());
        assert_eq!(outcome.results.fetch_failures(), 1);
        assert_eq!(outcome.exit_status(), 2);
    }

    #[tokio::test]
    async fn missing_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        let args = CliArgs::parse_from(["up-npm", "--file", path.to_str().unwrap()]);
        let settings = Settings::resolve(&args, &FileConfig::default()).unwrap();
        let orchestrator = Orchestrator::with_registry(settings, stub());

        let err = orchestrator
            .run(&mut prompter(""), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("manifest file not found"));
    }
}
