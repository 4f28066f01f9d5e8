//! Multi-repository orchestration
//!
//! - [`Orchestrator::run`] fans repositories out onto tokio tasks gated by a
//!   semaphore, waits for all of them, then commits run state once and
//!   publishes the batch of summaries
//! - [`process`] drives one repository and isolates its failures
//! - [`resolve_since`] computes the incremental lower bound
//!
//! Services are injected through [`Services`] so every collaborator can be
//! replaced in tests.

mod processor;
mod since;
mod source;

pub use processor::{process, RunResult};
pub use since::resolve_since;
pub use source::ActivitySource;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::join_all;
use github_activity::FilterSpec;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::config::RepoConfig;
use crate::output::{ReportWriter, SummaryEntry, SummarySink};
use crate::state::{run_key, StateStore};
use crate::summarizer::Summarizer;

/// Environment variable overriding `performance.max_concurrent_repos`
pub const CONCURRENCY_ENV: &str = "GHSUM_CONCURRENT_REPOS";

/// Collaborators shared by every repository task of a run
pub struct Services {
    pub source: Arc<dyn ActivitySource>,
    /// `None` produces empty summaries
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub state: Arc<dyn StateStore>,
    pub reports: ReportWriter,
    /// Receives the run's summaries after all repositories settle
    pub sink: Option<Arc<dyn SummarySink>>,
}

/// Per-run settings
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config_key: String,
    pub global_filters: FilterSpec,
    pub since_last_run: bool,
    pub lookback_days: u32,
    pub save_markdown: bool,
    pub save_json: bool,
}

pub struct Orchestrator {
    services: Arc<Services>,
    settings: Arc<RunSettings>,
}

impl Orchestrator {
    pub fn new(services: Services, settings: RunSettings) -> Self {
        Self {
            services: Arc::new(services),
            settings: Arc::new(settings),
        }
    }

    /// Process `repos` with at most `max_concurrency` in flight
    ///
    /// Per-repository failures are reported in the results. An error is
    /// returned only when the run state could not be committed; summaries are
    /// still published in that case.
    #[instrument(skip_all, fields(repos = repos.len(), max_concurrency = max_concurrency))]
    pub async fn run(&self, repos: Vec<RepoConfig>, max_concurrency: usize) -> Result<Vec<RunResult>> {
        let started = Utc::now();
        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        info!(repos = repos.len(), max_concurrency, "starting run");

        let mut handles = Vec::with_capacity(repos.len());
        for repo in repos {
            let name = repo.name.clone();
            let task = run_repository(
                repo,
                self.services.clone(),
                self.settings.clone(),
                semaphore.clone(),
            );
            handles.push((name, tokio::spawn(task)));
        }

        let (names, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let mut results = Vec::with_capacity(tasks.len());
        for (name, joined) in names.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(repo = %name, error = %e, "repository task aborted"),
            }
        }

        let updates = self.completion_updates(&results);
        let committed = self.services.state.set_batch(&updates).await;
        match &committed {
            Ok(()) => info!(updated = updates.len(), "run state committed"),
            Err(e) => error!(error = %e, "failed to commit run state"),
        }

        if let Some(sink) = &self.services.sink {
            let entries = summary_entries(&results, started);
            if !entries.is_empty() {
                if let Err(e) = sink.publish(&entries).await {
                    error!(error = %format!("{:#}", e), "failed to publish summaries");
                }
            }
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            succeeded = results.len() - failed,
            failed,
            "run finished"
        );

        committed.context("failed to commit run state")?;
        Ok(results)
    }

    fn completion_updates(&self, results: &[RunResult]) -> BTreeMap<String, DateTime<Utc>> {
        results
            .iter()
            .filter_map(|r| {
                let at = r.completed_at?;
                let repo = r.repo.to_string();
                Some((run_key(&self.settings.config_key, Some(&repo)), at))
            })
            .collect()
    }
}

async fn run_repository(
    repo: RepoConfig,
    services: Arc<Services>,
    settings: Arc<RunSettings>,
    semaphore: Arc<Semaphore>,
) -> RunResult {
    // Held until processing finishes, success or not.
    let _permit = semaphore.acquire_owned().await;
    process(&repo, &services, &settings).await
}

/// Feed entries for every successful, non-empty summary
pub fn summary_entries(results: &[RunResult], run_started: DateTime<Utc>) -> Vec<SummaryEntry> {
    results
        .iter()
        .filter(|r| r.is_success() && !r.summary.is_empty())
        .map(|r| {
            let timestamp = r.completed_at.unwrap_or(run_started);
            SummaryEntry {
                id: format!(
                    "{}-{}",
                    r.repo,
                    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
                title: format!("Summary for {}", r.repo),
                content: r.summary.clone(),
                link: r.repo.html_url(),
                timestamp,
            }
        })
        .collect()
}

// ============================================================================
// Concurrency limit
// ============================================================================

/// Explicit override, then environment value, then configured default; at least 1
pub fn resolve_concurrency(explicit: Option<usize>, env_value: Option<&str>, configured: usize) -> usize {
    let from_env = env_value.and_then(|raw| match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(
                variable = CONCURRENCY_ENV,
                value = raw,
                "ignoring invalid concurrency override"
            );
            None
        }
    });
    explicit.or(from_env).unwrap_or(configured).max(1)
}

/// [`resolve_concurrency`] reading the override from the process environment
pub fn concurrency_limit(explicit: Option<usize>, configured: usize) -> usize {
    let env_value = std::env::var(CONCURRENCY_ENV).ok();
    resolve_concurrency(explicit, env_value.as_deref(), configured)
}
