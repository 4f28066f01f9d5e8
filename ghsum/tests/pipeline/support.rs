//! Shared fakes for pipeline tests

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use github_activity::{
    ActivityQuery, Commit, FilterSpec, GithubError, GithubResult, GraphqlTransport, RepoDataset,
    RepositoryId,
};
use serde_json::{json, Map, Value};

use ghsum::config::RepoConfig;
use ghsum::orchestrator::{ActivitySource, RunSettings, Services};
use ghsum::output::{ReportWriter, SummaryEntry, SummarySink};
use ghsum::state::{StateError, StateStore};
use ghsum::summarizer::Summarizer;

pub fn repo_configs(names: &[&str]) -> Vec<RepoConfig> {
    names
        .iter()
        .map(|name| RepoConfig::new(name.parse().unwrap()))
        .collect()
}

pub fn settings(tracking: bool) -> RunSettings {
    RunSettings {
        config_key: "config/config.toml".into(),
        global_filters: FilterSpec::default(),
        since_last_run: tracking,
        lookback_days: 7,
        save_markdown: false,
        save_json: false,
    }
}

pub fn services(
    source: Arc<dyn ActivitySource>,
    state: Arc<dyn StateStore>,
    output_dir: &std::path::Path,
) -> Services {
    Services {
        source,
        summarizer: None,
        state,
        reports: ReportWriter::new(output_dir),
        sink: None,
    }
}

// =============================================================================
// Activity source
// =============================================================================

/// Source that sleeps, optionally fails or panics, and tracks how many
/// fetches overlap
#[derive(Default)]
pub struct ScriptedSource {
    pub delay: Duration,
    pub failing: HashSet<String>,
    pub panicking: HashSet<String>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn panicking(names: &[&str]) -> Self {
        Self {
            panicking: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ActivitySource for ScriptedSource {
    async fn fetch(
        &self,
        repo: &RepoConfig,
        _filters: &FilterSpec,
        since: DateTime<Utc>,
    ) -> Result<RepoDataset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panicking.contains(&repo.name.to_string()) {
            panic!("fetch for {} blew up", repo.name);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&repo.name.to_string()) {
            bail!("connection reset while fetching {}", repo.name);
        }

        Ok(RepoDataset {
            commits: vec![Commit {
                sha: format!("{}-head", repo.name.name()),
                author: "dev".into(),
                message: "feat: something".into(),
                date: since,
                html_url: format!("{}/commit/1", repo.name.html_url()),
            }],
            ..Default::default()
        })
    }
}

// =============================================================================
// State store
// =============================================================================

/// In-memory state store recording every batch
#[derive(Default)]
pub struct RecordingState {
    pub values: Mutex<BTreeMap<String, DateTime<Utc>>>,
    pub batches: Mutex<Vec<BTreeMap<String, DateTime<Utc>>>>,
}

#[async_trait]
impl StateStore for RecordingState {
    async fn get(
        &self,
        config_key: &str,
        repo: Option<&RepositoryId>,
    ) -> Result<Option<DateTime<Utc>>, StateError> {
        let key = match repo {
            Some(repo) => format!("{config_key}::{repo}"),
            None => config_key.to_string(),
        };
        Ok(self.values.lock().unwrap().get(&key).copied())
    }

    async fn set_batch(&self, updates: &BTreeMap<String, DateTime<Utc>>) -> Result<(), StateError> {
        self.batches.lock().unwrap().push(updates.clone());
        self.values.lock().unwrap().extend(updates.clone());
        Ok(())
    }
}

// =============================================================================
// Summarizer and sink
// =============================================================================

pub struct CannedSummarizer;

#[async_trait]
impl Summarizer for CannedSummarizer {
    async fn summarize(
        &self,
        repo: &RepositoryId,
        dataset: &RepoDataset,
        _since: DateTime<Utc>,
    ) -> Result<String> {
        Ok(format!("{} had {} new items", repo, dataset.total()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<Vec<SummaryEntry>>>,
}

#[async_trait]
impl SummarySink for RecordingSink {
    async fn publish(&self, entries: &[SummaryEntry]) -> Result<()> {
        self.batches.lock().unwrap().push(entries.to_vec());
        Ok(())
    }
}

// =============================================================================
// GraphQL transport
// =============================================================================

/// Transport answering every query from one canned `data` object
///
/// Requests are counted per query; queries listed in `failing` error out.
pub struct CountingTransport {
    data: Value,
    failing: Vec<ActivityQuery>,
    requests: Mutex<BTreeMap<&'static str, usize>>,
}

const QUERIES: [ActivityQuery; 6] = [
    ActivityQuery::Commits,
    ActivityQuery::PullRequests,
    ActivityQuery::Issues,
    ActivityQuery::Discussions,
    ActivityQuery::Releases,
    ActivityQuery::Labels,
];

impl CountingTransport {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            failing: Vec::new(),
            requests: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn failing(mut self, query: ActivityQuery) -> Self {
        self.failing.push(query);
        self
    }

    pub fn requests(&self, query: ActivityQuery) -> usize {
        self.requests
            .lock()
            .unwrap()
            .get(query.name())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl GraphqlTransport for CountingTransport {
    async fn execute(&self, query: &str, _variables: &Map<String, Value>) -> GithubResult<Value> {
        let kind = QUERIES
            .into_iter()
            .find(|q| q.document() == query)
            .ok_or_else(|| GithubError::Graphql("unknown query".into()))?;
        *self.requests.lock().unwrap().entry(kind.name()).or_default() += 1;

        if self.failing.contains(&kind) {
            return Err(GithubError::Status {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(self.data.clone())
    }
}

fn last_page(nodes: Value) -> Value {
    json!({ "nodes": nodes, "pageInfo": { "hasNextPage": false, "endCursor": null } })
}

/// One response holding a single item for every activity connection
pub fn activity_data() -> Value {
    json!({
        "repository": {
            "defaultBranchRef": {
                "target": {
                    "history": last_page(json!([{
                        "oid": "abc123",
                        "messageHeadline": "fix: parser",
                        "url": "https://github.com/o/r/commit/abc123",
                        "author": { "name": "Dev", "date": "2030-01-02T00:00:00Z" },
                        "committedDate": "2030-01-02T00:00:00Z"
                    }]))
                }
            },
            "pullRequests": last_page(json!([{
                "number": 7,
                "title": "Add feature",
                "body": "",
                "author": { "login": "dev" },
                "state": "OPEN",
                "createdAt": "2030-01-01T00:00:00Z",
                "updatedAt": "2030-01-02T00:00:00Z",
                "mergedAt": null,
                "url": "https://github.com/o/r/pull/7",
                "labels": { "nodes": [] }
            }])),
            "discussions": last_page(json!([])),
            "releases": last_page(json!([]))
        },
        "search": last_page(json!([]))
    })
}
