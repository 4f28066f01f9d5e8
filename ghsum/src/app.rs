//! Application entry point for one summarization run
//!
//! [`App`] owns a validated [`Config`] and builds fresh services for every
//! run: the GraphQL transport (and its connection pool) lives only as long
//! as [`App::run`]. The state store and summary cache come from
//! [`SharedStores`] so every run in the process writes through the same
//! instances.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use github_activity::{GitHubClient, HttpTransport, RepositoryId};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigError, RepoConfig};
use crate::llm::create_llm;
use crate::orchestrator::{concurrency_limit, Orchestrator, RunResult, RunSettings, Services};
use crate::output::{FeedPublisher, ReportWriter, SummarySink};
use crate::stores::SharedStores;
use crate::summarizer::{LlmSummarizer, Summarizer};

/// Failures that abort before any repository is processed
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no GitHub token: set github.token in the config or GITHUB_TOKEN")]
    MissingToken,

    #[error("repository '{0}' is not in the configuration")]
    UnknownRepository(RepositoryId),

    #[error("failed to create {service}: {source}")]
    Service {
        service: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Options for [`App::run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Subset of configured repositories; `None` runs all of them
    pub repositories: Option<Vec<RepositoryId>>,
    pub save_json: bool,
    pub save_markdown: bool,
    /// Overrides the environment and configured concurrency
    pub max_concurrency: Option<usize>,
    pub skip_summary: bool,
}

pub struct App {
    config: Config,
    stores: Arc<SharedStores>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stores: SharedStores::new(),
        }
    }

    /// Use stores shared with other runs in this process
    pub fn with_stores(mut self, stores: Arc<SharedStores>) -> Self {
        self.stores = stores;
        self
    }

    pub fn load(path: &Path) -> Result<Self, SetupError> {
        Ok(Self::new(Config::load_from_path(path)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configured repositories matching `names`, in configuration order
    pub fn select_repositories(
        &self,
        names: Option<&[RepositoryId]>,
    ) -> Result<Vec<RepoConfig>, SetupError> {
        let Some(names) = names else {
            return Ok(self.config.repositories.clone());
        };
        if let Some(unknown) = names.iter().find(|n| self.config.repository(n).is_none()) {
            return Err(SetupError::UnknownRepository(unknown.clone()));
        }
        Ok(self
            .config
            .repositories
            .iter()
            .filter(|r| names.contains(&r.name))
            .cloned()
            .collect())
    }

    /// A client with its own HTTP connection pool
    pub fn github_client(&self) -> Result<GitHubClient, SetupError> {
        let token = self.config.github_token().ok_or(SetupError::MissingToken)?;
        let transport = HttpTransport::new(
            token,
            &self.config.github.api_url,
            Duration::from_secs(self.config.github.timeout_secs),
        )
        .map_err(|e| SetupError::Service {
            service: "GitHub client",
            source: e.into(),
        })?;
        Ok(GitHubClient::new(Arc::new(transport)))
    }

    fn summarizer(&self, skip: bool) -> Result<Option<Arc<dyn Summarizer>>, SetupError> {
        let Some(llm_config) = self.config.llm.as_ref().filter(|_| !skip) else {
            debug!("summaries disabled");
            return Ok(None);
        };
        let llm = create_llm(llm_config).map_err(|e| SetupError::Service {
            service: "LLM client",
            source: e.into(),
        })?;
        let summarizer = LlmSummarizer::new(
            llm,
            llm_config,
            self.config.performance.max_concurrent_llm,
        );
        Ok(Some(Arc::new(summarizer)))
    }

    async fn feed_publisher(&self) -> Option<Arc<dyn SummarySink>> {
        let rss = self.config.rss.clone()?;
        let cache = self.stores.cache(&self.config.cache_file).await;
        Some(Arc::new(FeedPublisher::new(
            cache,
            rss,
            &self.config.output_dir,
        )))
    }

    /// Run the selected repositories once
    ///
    /// Setup problems fail with [`SetupError`] before any work starts;
    /// per-repository failures are reported in the returned results.
    pub async fn run(&self, options: &RunOptions) -> Result<Vec<RunResult>> {
        let repos = self.select_repositories(options.repositories.as_deref())?;
        let client = self.github_client()?;
        let summarizer = self.summarizer(options.skip_summary)?;

        let services = Services {
            source: Arc::new(client.clone()),
            summarizer,
            state: self.stores.state(&self.config.state_file).await,
            reports: ReportWriter::new(&self.config.output_dir),
            sink: self.feed_publisher().await,
        };
        let settings = RunSettings {
            config_key: self.config.config_key(),
            global_filters: self.config.global_filters.clone(),
            since_last_run: self.config.since_last_run,
            lookback_days: self.config.fallback_lookback_days,
            save_markdown: options.save_markdown,
            save_json: options.save_json,
        };

        let max_concurrency = concurrency_limit(
            options.max_concurrency,
            self.config.performance.max_concurrent_repos,
        );
        let results = Orchestrator::new(services, settings)
            .run(repos, max_concurrency)
            .await?;

        if let Some(limit) = client.rate_limit() {
            info!(
                remaining = limit.remaining,
                limit = limit.limit,
                reset = limit.reset,
                "GitHub rate limit"
            );
        }
        Ok(results)
    }
}
