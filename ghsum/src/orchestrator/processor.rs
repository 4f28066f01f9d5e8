//! Per-repository processing
//!
//! fetch -> filter -> summarize -> write reports, isolated from sibling
//! repositories: every error is caught here and turned into a failed
//! [`RunResult`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use github_activity::{FilterSpec, RepoDataset, RepositoryId};
use tracing::{error, info, instrument};

use super::since::resolve_since;
use super::{RunSettings, Services};
use crate::config::RepoConfig;

/// Outcome of one repository in one run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub repo: RepositoryId,
    /// Completion instant to record; `None` on failure or with tracking disabled
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub dataset: RepoDataset,
    pub error: Option<String>,
}

impl RunResult {
    fn failed(repo: RepositoryId, error: &anyhow::Error) -> Self {
        Self {
            repo,
            completed_at: None,
            summary: String::new(),
            dataset: RepoDataset::default(),
            error: Some(format!("{:#}", error)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Process one repository; never fails
#[instrument(skip_all, fields(repo = %repo.name))]
pub async fn process(repo: &RepoConfig, services: &Services, settings: &RunSettings) -> RunResult {
    match try_process(repo, services, settings).await {
        Ok(result) => result,
        Err(e) => {
            error!(repo = %repo.name, error = %format!("{:#}", e), "repository processing failed");
            RunResult::failed(repo.name.clone(), &e)
        }
    }
}

async fn try_process(
    repo: &RepoConfig,
    services: &Services,
    settings: &RunSettings,
) -> Result<RunResult> {
    let since = resolve_since(
        services.state.as_ref(),
        &settings.config_key,
        &repo.name,
        settings.since_last_run,
        settings.lookback_days,
        Utc::now(),
    )
    .await
    .context("resolving since boundary")?;
    info!(repo = %repo.name, since = %since, "processing repository");

    let filters = FilterSpec::merge(&settings.global_filters, &repo.filters);
    let dataset = services.source.fetch(repo, &filters, since).await?;
    info!(
        repo = %repo.name,
        commits = dataset.commits.len(),
        pull_requests = dataset.pull_requests.len(),
        issues = dataset.issues.len(),
        discussions = dataset.discussions.len(),
        releases = dataset.releases.len(),
        "activity collected"
    );

    let summary = match &services.summarizer {
        Some(summarizer) => summarizer.summarize(&repo.name, &dataset, since).await?,
        None => String::new(),
    };

    if settings.save_markdown {
        services.reports.write_markdown(&repo.name, &summary).await?;
    }
    if settings.save_json {
        services.reports.write_json(&repo.name, &dataset).await?;
    }

    let completed_at = settings.since_last_run.then(Utc::now);
    info!(repo = %repo.name, "repository processed");

    Ok(RunResult {
        repo: repo.name.clone(),
        completed_at,
        summary,
        dataset,
        error: None,
    })
}
