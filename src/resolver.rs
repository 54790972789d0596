//! Concurrent dependency resolution
//!
//! Turns declared dependencies into classified upgrade candidates:
//! filter → parse → bounded parallel registry fetches → classify → collect.
//!
//! - At most `concurrency` fetches are in flight at once (semaphore permits
//!   are taken before a task is spawned)
//! - A failed fetch only removes its own dependency from the result
//! - Every spawned task is joined before `resolve` returns
//! - An optional deadline stops dispatch and turns fetches still pending
//!   into timeouts; one deadline can span several `resolve` calls

use crate::domain::{
    compare, parse_clean, CleanVersion, DependencySpec, SkipReason, SkippedDependency,
    UpgradeCandidate,
};
use crate::progress::Progress;
use crate::registry::{RegistryClient, RegistryMetadata};
use crate::repository;
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default number of registry fetches in flight at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Filter and gating policy for one resolution run
#[derive(Debug, Clone, Default)]
pub struct ResolvePolicy {
    /// Case-sensitive substring a dependency name must contain
    pub filter: Option<String>,
    /// Produce candidates whose latest version is older than the current one
    pub allow_downgrade: bool,
    /// Bearer token attached to every registry request
    pub auth_token: Option<String>,
}

impl ResolvePolicy {
    /// Whether a dependency name passes the filter
    pub fn matches(&self, name: &str) -> bool {
        match self.filter.as_deref() {
            Some(filter) if !filter.is_empty() => name.contains(filter),
            _ => true,
        }
    }
}

/// Scheduling knobs for the resolver
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Maximum fetches in flight; zero is treated as one
    pub concurrency: usize,
    /// Instant after which no fetch starts and pending ones time out
    pub deadline: Option<Instant>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }
}

/// Outcome of a resolution run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Upgrade candidates keyed by dependency name
    pub candidates: HashMap<String, UpgradeCandidate>,
    /// Dependencies declared without a range operator
    pub locked: usize,
    /// Dependencies that produced no candidate because of a problem
    pub skipped: Vec<SkippedDependency>,
}

impl ResultSet {
    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true if there are no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Look up a candidate by dependency name
    pub fn get(&self, name: &str) -> Option<&UpgradeCandidate> {
        self.candidates.get(name)
    }

    /// Number of dependencies dropped because their fetch failed
    pub fn fetch_failures(&self) -> usize {
        self.skipped.iter().filter(|s| s.is_fetch_failure()).count()
    }

    /// Candidates selected for writing
    pub fn selected(&self) -> impl Iterator<Item = &UpgradeCandidate> {
        self.candidates.values().filter(|c| c.should_apply)
    }

    /// Fold another run's results into this one
    pub fn merge(&mut self, other: ResultSet) {
        self.candidates.extend(other.candidates);
        self.locked += other.locked;
        self.skipped.extend(other.skipped);
    }
}

/// Result collection shared between resolver tasks
#[derive(Default)]
struct SharedResults {
    inner: Mutex<ResultSet>,
}

impl SharedResults {
    fn insert(&self, candidate: UpgradeCandidate) {
        let mut results = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        results
            .candidates
            .insert(candidate.dependency_name.clone(), candidate);
    }

    fn skip(&self, skipped: SkippedDependency) {
        let mut results = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        results.skipped.push(skipped);
    }

    fn take(&self) -> ResultSet {
        let mut results = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *results)
    }
}

/// What a fetched dependency turned into
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Passed the direction gate
    Candidate(UpgradeCandidate),
    /// Same version, or a downgrade while downgrades are not allowed
    Excluded,
    /// `dist-tags.latest` has no recognizable version
    UnparseableLatest(String),
}

/// Classify one dependency against its fetched metadata
pub fn evaluate(
    name: &str,
    current: &CleanVersion,
    metadata: &RegistryMetadata,
    is_dev: bool,
    allow_downgrade: bool,
    now: DateTime<Utc>,
) -> Evaluation {
    let latest_raw = metadata.latest_version.as_str();

    if current.to_string() == latest_raw {
        return Evaluation::Excluded;
    }

    let Some(latest) = parse_clean(latest_raw) else {
        return Evaluation::UnparseableLatest(latest_raw.to_string());
    };

    let comparison = compare(current, &latest);
    if !comparison.passes_gate(allow_downgrade) {
        return Evaluation::Excluded;
    }

    let repository_url = metadata
        .repository_url
        .as_deref()
        .map(repository::canonicalize);

    Evaluation::Candidate(
        UpgradeCandidate::new(name, current, latest_raw, comparison, is_dev)
            .with_homepage(metadata.homepage.clone())
            .with_repository_url(repository_url)
            .with_hours_since_last_release(metadata.hours_since_latest_release(now)),
    )
}

/// One dependency that survived filtering and parsing
struct WorkItem {
    name: String,
    current: CleanVersion,
}

/// Outcome of waiting for a fetch slot
enum Slot {
    Permit(OwnedSemaphorePermit),
    /// The deadline passed before a slot freed up
    Expired,
    Closed,
}

/// Wait for a free slot, giving up at `deadline`. An elapsed deadline wins
/// over a free slot.
async fn acquire_slot(semaphore: Arc<Semaphore>, deadline: Option<Instant>) -> Slot {
    let acquire = semaphore.acquire_owned();
    match deadline {
        Some(at) => tokio::select! {
            biased;
            _ = tokio::time::sleep_until(at) => Slot::Expired,
            permit = acquire => permit.map_or(Slot::Closed, Slot::Permit),
        },
        None => acquire.await.map_or(Slot::Closed, Slot::Permit),
    }
}

/// Bounded-concurrency resolver over a registry client
pub struct Resolver {
    registry: Arc<dyn RegistryClient>,
    options: ResolveOptions,
    progress: Progress,
    now: Option<DateTime<Utc>>,
}

impl Resolver {
    /// Create a resolver with default options
    pub fn new(registry: Arc<dyn RegistryClient>) -> Self {
        Self {
            registry,
            options: ResolveOptions::default(),
            progress: Progress::hidden(),
            now: None,
        }
    }

    /// Set scheduling options (builder pattern)
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Shorthand for setting only the concurrency limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    /// Report completed fetches on a progress bar (builder pattern)
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Fix the clock used for release ages (for testing)
    pub fn with_time(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Effective concurrency limit
    pub fn concurrency(&self) -> usize {
        self.options.concurrency.max(1)
    }

    /// Resolve one set of dependencies (production or dev) into candidates
    pub async fn resolve(
        &self,
        dependencies: &[DependencySpec],
        is_dev: bool,
        policy: &ResolvePolicy,
    ) -> ResultSet {
        let shared = Arc::new(SharedResults::default());
        let mut locked = 0;
        let mut seen = HashSet::new();
        let mut work = Vec::new();

        for spec in dependencies {
            if !policy.matches(&spec.name) || !seen.insert(spec.name.as_str()) {
                continue;
            }

            let Some(current) = parse_clean(&spec.declared_range) else {
                info!(package = %spec.name, range = %spec.declared_range, "unsupported or invalid version, skipping");
                shared.skip(SkippedDependency::new(
                    &spec.name,
                    is_dev,
                    SkipReason::UnparseableRange(spec.declared_range.clone()),
                ));
                continue;
            };

            // Locked dependencies are still fetched; the selection stage flags them
            if current.is_locked() {
                locked += 1;
            }

            work.push(WorkItem {
                name: spec.name.clone(),
                current,
            });
        }

        let now = self.now.unwrap_or_else(Utc::now);
        let deadline = self.options.deadline;
        let semaphore = Arc::new(Semaphore::new(self.concurrency()));
        let token: Option<Arc<str>> = policy.auth_token.as_deref().map(Arc::from);
        let mut tasks = JoinSet::new();

        debug!(
            count = work.len(),
            concurrency = self.concurrency(),
            is_dev,
            "dispatching registry fetches"
        );

        let mut work = work.into_iter();
        while let Some(item) = work.next() {
            let permit = match acquire_slot(Arc::clone(&semaphore), deadline).await {
                Slot::Permit(permit) => permit,
                Slot::Expired => {
                    let expired: Vec<WorkItem> =
                        std::iter::once(item).chain(work.by_ref()).collect();
                    warn!(
                        count = expired.len(),
                        "deadline reached, not fetching remaining dependencies"
                    );
                    for item in expired {
                        shared.skip(SkippedDependency::new(
                            &item.name,
                            is_dev,
                            SkipReason::FetchFailed(FetchError::timeout(&item.name).to_string()),
                        ));
                        self.progress.tick(&item.name);
                    }
                    break;
                }
                Slot::Closed => {
                    warn!("concurrency budget closed, stopping dispatch");
                    break;
                }
            };

            let registry = Arc::clone(&self.registry);
            let shared = Arc::clone(&shared);
            let progress = self.progress.clone();
            let token = token.clone();
            let allow_downgrade = policy.allow_downgrade;

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = match deadline {
                    Some(at) if Instant::now() >= at => Err(FetchError::timeout(&item.name)),
                    Some(at) => {
                        tokio::time::timeout_at(at, registry.fetch(&item.name, token.as_deref()))
                            .await
                            .unwrap_or_else(|_| Err(FetchError::timeout(&item.name)))
                    }
                    None => registry.fetch(&item.name, token.as_deref()).await,
                };

                match outcome {
                    Ok(metadata) => {
                        match evaluate(
                            &item.name,
                            &item.current,
                            &metadata,
                            is_dev,
                            allow_downgrade,
                            now,
                        ) {
                            Evaluation::Candidate(candidate) => shared.insert(candidate),
                            Evaluation::Excluded => {
                                debug!(package = %item.name, latest = %metadata.latest_version, "no eligible change");
                            }
                            Evaluation::UnparseableLatest(latest) => {
                                info!(package = %item.name, latest = %latest, "unrecognized latest version, skipping");
                                shared.skip(SkippedDependency::new(
                                    &item.name,
                                    is_dev,
                                    SkipReason::UnparseableLatest(latest),
                                ));
                            }
                        }
                    }
                    Err(e) => {
                        warn!(package = %item.name, error = %e, "failed to fetch from registry, skipping");
                        shared.skip(SkippedDependency::new(
                            &item.name,
                            is_dev,
                            SkipReason::FetchFailed(e.to_string()),
                        ));
                    }
                }

                progress.tick(&item.name);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "resolver task did not complete");
            }
        }

        let mut results = shared.take();
        results.locked = locked;
        results
    }
}
