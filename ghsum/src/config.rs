//! Configuration loading
//!
//! The config file is TOML. Secrets may reference environment variables
//! (`token = "${GITHUB_TOKEN}"`); they are expanded once at load time.
//! Regex filters are compiled while parsing, so a bad pattern is reported
//! here instead of halfway through a run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use github_activity::{DataType, FilterSpec, RepositoryId, DEFAULT_API_URL};
use serde::Deserialize;
use thiserror::Error;

use crate::scheduler::CronSchedule;

/// Default location of the config file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Top-level configuration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,

    /// Filters applied to every repository, overridden per repository
    #[serde(default, rename = "filters")]
    pub global_filters: FilterSpec,

    #[serde(default)]
    pub repositories: Vec<RepoConfig>,

    /// Absent means no summaries are generated
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Absent means no summary cache and no feed
    #[serde(default)]
    pub rss: Option<RssConfig>,

    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Track completion times and fetch only newer activity
    #[serde(default = "default_true")]
    pub since_last_run: bool,

    #[serde(default = "default_lookback_days")]
    pub fallback_lookback_days: u32,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Path the config was loaded from; part of every state key
    #[serde(skip)]
    pub source_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// Falls back to `GITHUB_TOKEN` when unset
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_max_concurrent_repos")]
    pub max_concurrent_repos: usize,

    #[serde(default = "default_max_concurrent_llm")]
    pub max_concurrent_llm: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Any OpenAI-compatible chat completions endpoint
    #[default]
    OpenAi,
    Ollama,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// OpenAI-compatible base URL, or the Ollama server URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Falls back to `OPENAI_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Language the summary should be written in
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Upper bound on one LLM call, retries excluded
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RssConfig {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_rss_filename")]
    pub filename: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct ScheduleConfig {
    /// Five-field crontab expression (`minute hour day month weekday`)
    #[serde(default = "default_cron")]
    pub cron: String,

    /// IANA zone name; the host's local time when unset
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoConfig {
    pub name: RepositoryId,

    #[serde(default)]
    pub filters: FilterSpec,

    #[serde(default = "default_true")]
    pub include_commits: bool,
    #[serde(default = "default_true")]
    pub include_pull_requests: bool,
    #[serde(default = "default_true")]
    pub include_issues: bool,
    #[serde(default = "default_true")]
    pub include_discussions: bool,
    #[serde(default)]
    pub include_releases: bool,

    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lookback_days() -> u32 {
    7
}

fn default_state_file() -> PathBuf {
    PathBuf::from("log/last_run_times.json")
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("cache/summary_cache.json")
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_repos() -> usize {
    4
}

fn default_max_concurrent_llm() -> usize {
    2
}

fn default_model_name() -> String {
    "gpt-4.1".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_cron() -> String {
    "0 6 * * *".to_string()
}

fn default_rss_filename() -> String {
    "rss.xml".to_string()
}

fn default_max_entries() -> usize {
    100
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You write technical briefings of recent GitHub repository activity for developers \
who already know the project.

Summarize the activity you are given (commits, pull requests, issues, discussions, \
releases) and focus on what the changes mean:
- architectural changes and notable refactors
- API additions, deprecations and breaking changes
- performance work and how it was achieved
- important bug fixes
- direction signalled by discussions and larger pull requests

Use precise language and structured Markdown. Link to the most relevant commits, \
pull requests and discussions.

The input is JSON with the keys `repo`, `commits`, `pull_requests`, `issues`, \
`discussions` and `releases`.";

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_repos: default_max_concurrent_repos(),
            max_concurrent_llm: default_max_concurrent_llm(),
        }
    }
}

impl RepoConfig {
    /// A repository with default toggles and no filters
    pub fn new(name: RepositoryId) -> Self {
        Self {
            name,
            filters: FilterSpec::default(),
            include_commits: true,
            include_pull_requests: true,
            include_issues: true,
            include_discussions: true,
            include_releases: false,
            schedule: None,
        }
    }

    /// Whether this data type is fetched for the repository
    pub fn includes(&self, data_type: DataType) -> bool {
        match data_type {
            DataType::Commits => self.include_commits,
            DataType::PullRequests => self.include_pull_requests,
            DataType::Issues => self.include_issues,
            DataType::Discussions => self.include_discussions,
            DataType::Releases => self.include_releases,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Load, expand and validate a config file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        tracing::debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse config text as if it had been read from `path`
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source_path = path.to_path_buf();

        config.github.token = expand_secret("github.token", config.github.token)?;
        if let Some(llm) = config.llm.as_mut() {
            llm.api_key = expand_secret("llm.api_key", llm.api_key.take())?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.performance.max_concurrent_repos == 0 {
            return Err(ConfigError::Invalid(
                "performance.max_concurrent_repos must be at least 1".into(),
            ));
        }
        if self.performance.max_concurrent_llm == 0 {
            return Err(ConfigError::Invalid(
                "performance.max_concurrent_llm must be at least 1".into(),
            ));
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "github.timeout_secs must be at least 1".into(),
            ));
        }
        if self.llm.as_ref().is_some_and(|llm| llm.timeout_secs == 0) {
            return Err(ConfigError::Invalid("llm.timeout_secs must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for repo in &self.repositories {
            if !seen.insert(&repo.name) {
                return Err(ConfigError::Invalid(format!(
                    "repository '{}' is listed more than once",
                    repo.name
                )));
            }
            if let Some(schedule) = &repo.schedule {
                CronSchedule::from_config(schedule).map_err(|e| {
                    ConfigError::Invalid(format!("repository '{}': schedule: {}", repo.name, e))
                })?;
            }
        }

        if let Some(schedule) = &self.schedule {
            CronSchedule::from_config(schedule)
                .map_err(|e| ConfigError::Invalid(format!("schedule: {}", e)))?;
        }
        if let Some(rss) = &self.rss {
            if rss.max_entries == 0 {
                return Err(ConfigError::Invalid("rss.max_entries must be at least 1".into()));
            }
            if rss.filename.trim().is_empty() {
                return Err(ConfigError::Invalid("rss.filename must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Key identifying this config in the state store
    pub fn config_key(&self) -> String {
        self.source_path.display().to_string()
    }

    /// GitHub token from the config, else `GITHUB_TOKEN`
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn repository(&self, name: &RepositoryId) -> Option<&RepoConfig> {
        self.repositories.iter().find(|r| &r.name == name)
    }
}

impl LlmConfig {
    /// API key from the config, else `OPENAI_API_KEY`
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

fn expand_secret(field: &str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    value
        .map(|raw| {
            shellexpand::env(&raw)
                .map(|expanded| expanded.into_owned())
                .map_err(|e| ConfigError::Invalid(format!("{field}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use github_activity::SinceField;

    const FULL: &str = r#"
        output_dir = "out"
        since_last_run = false
        fallback_lookback_days = 3

        [github]
        token = "literal-token"

        [performance]
        max_concurrent_repos = 2

        [llm]
        provider = "ollama"
        base_url = "http://localhost:11434"
        model_name = "llama3.1:8b"
        language = "German"

        [rss]
        title = "Activity"
        link = "https://example.com/rss.xml"

        [filters.commits]
        exclude_commit_messages_regex = "^Merge"

        [[repositories]]
        name = "neovim/neovim"
        include_discussions = false
        [repositories.schedule]
        cron = "0 9 * * 1"
        timezone = "Europe/Berlin"
        [repositories.filters.pull_requests]
        labels = ["bug"]
        since_filter_type = "created"

        [[repositories]]
        name = "rust-lang/rust"
        include_releases = true
    "#;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        Config::parse(content, Path::new("config/test.toml"))
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(FULL).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.since_last_run);
        assert_eq!(config.fallback_lookback_days, 3);
        assert_eq!(config.github.token.as_deref(), Some("literal-token"));
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.performance.max_concurrent_repos, 2);
        assert_eq!(config.performance.max_concurrent_llm, 2);
        assert_eq!(config.config_key(), "config/test.toml");

        let llm = config.llm.as_ref().unwrap();
        assert_eq!(llm.provider, LlmProvider::Ollama);
        assert_eq!(llm.retries, 3);
        assert_eq!(llm.timeout_secs, 120);
        assert_eq!(llm.system_prompt, DEFAULT_SYSTEM_PROMPT);

        let rss = config.rss.as_ref().unwrap();
        assert_eq!(rss.filename, "rss.xml");
        assert_eq!(rss.max_entries, 100);

        let neovim = &config.repositories[0];
        assert!(neovim.includes(DataType::Commits));
        assert!(!neovim.includes(DataType::Discussions));
        assert!(!neovim.includes(DataType::Releases));
        let schedule = neovim.schedule.as_ref().unwrap();
        assert_eq!(schedule.cron, "0 9 * * 1");
        assert_eq!(schedule.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(neovim.filters.pull_requests.since_field(), SinceField::Created);
        assert!(config.repositories[1].includes(DataType::Releases));
        assert!(config.global_filters.commits.exclude_commit_messages_regex.is_some());
    }

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert!(config.since_last_run);
        assert_eq!(config.fallback_lookback_days, 7);
        assert_eq!(config.state_file, PathBuf::from("log/last_run_times.json"));
        assert_eq!(config.cache_file, PathBuf::from("cache/summary_cache.json"));
        assert!(config.llm.is_none());
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_invalid_repository_name() {
        let err = parse("[[repositories]]\nname = \"not-a-repo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_regex_is_parse_error() {
        let err = parse("[filters.issues]\nexclude_issue_titles_regex = \"[\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_provider() {
        let err = parse("[llm]\nprovider = \"claude\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = parse("[performance]\nmax_concurrent_repos = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_schedule_defaults_to_daily() {
        let config = parse("[schedule]\n").unwrap();
        let schedule = config.schedule.unwrap();
        assert_eq!(schedule.cron, "0 6 * * *");
        assert_eq!(schedule.timezone, None);
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let err = parse("[schedule]\ncron = \"0 25 * * *\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = parse(
            "[[repositories]]\nname = \"o/r\"\nschedule = { cron = \"0 9 * * *\", timezone = \"Nowhere/City\" }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("o/r")));
    }

    #[test]
    fn test_zero_llm_timeout_rejected() {
        let err = parse("[llm]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_repository_rejected() {
        let err = parse("[[repositories]]\nname = \"o/r\"\n[[repositories]]\nname = \"o/r\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_token_expansion() {
        std::env::set_var("GHSUM_TEST_TOKEN_EXPANSION", "from-env");
        let config = parse("[github]\ntoken = \"${GHSUM_TEST_TOKEN_EXPANSION}\"\n").unwrap();
        assert_eq!(config.github.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_token_expansion_undefined_var() {
        let err = parse("[github]\ntoken = \"${GHSUM_TEST_SURELY_UNDEFINED_VAR}\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load_from_path(Path::new("/nonexistent/ghsum.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.config_key(), path.display().to_string());
    }
}
