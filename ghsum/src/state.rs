//! Incremental run state
//!
//! Maps run keys to the instant a repository last finished processing.
//! Keys are the config path, optionally qualified by repository
//! (`config/config.toml::owner/name`); the unqualified form is the legacy
//! whole-config key.
//!
//! The JSON file is read fresh on every lookup and rewritten only through
//! [`StateStore::set_batch`], which serializes writers and replaces the
//! file atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use github_activity::RepositoryId;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode run state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("state task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Key under which a completion time is stored
pub fn run_key(config_key: &str, repo: Option<&str>) -> String {
    match repo {
        Some(repo) => format!("{}::{}", config_key, repo),
        None => config_key.to_string(),
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Last completion for the config, or for one of its repositories
    ///
    /// Unparseable stored values read as `None`.
    async fn get(
        &self,
        config_key: &str,
        repo: Option<&RepositoryId>,
    ) -> Result<Option<DateTime<Utc>>, StateError>;

    /// Merge `updates` (full run keys) into the stored map in one write
    async fn set_batch(&self, updates: &BTreeMap<String, DateTime<Utc>>) -> Result<(), StateError>;
}

/// JSON-file-backed [`StateStore`]
pub struct JsonStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StateError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_map_blocking(&path)).await?
    }
}

fn read_map_blocking(path: &Path) -> Result<BTreeMap<String, String>, StateError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_str(&content) {
        Ok(map) => Ok(map),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "could not decode run state, starting with empty data"
            );
            Ok(BTreeMap::new())
        }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn get(
        &self,
        config_key: &str,
        repo: Option<&RepositoryId>,
    ) -> Result<Option<DateTime<Utc>>, StateError> {
        let repo_name = repo.map(ToString::to_string);
        let key = run_key(config_key, repo_name.as_deref());
        let map = self.read_map().await?;

        let Some(raw) = map.get(&key) else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(raw) {
            Ok(instant) => Ok(Some(instant.with_timezone(&Utc))),
            Err(e) => {
                warn!(key = %key, value = %raw, error = %e, "invalid timestamp in run state, ignoring");
                Ok(None)
            }
        }
    }

    async fn set_batch(&self, updates: &BTreeMap<String, DateTime<Utc>>) -> Result<(), StateError> {
        if updates.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_map().await?;
        for (key, instant) in updates {
            map.insert(key.clone(), instant.to_rfc3339());
        }

        let data = serde_json::to_vec_pretty(&map)?;
        ghsum_common::write_atomic(self.path.clone(), data)
            .await
            .map_err(|e| StateError::Write {
                path: self.path.clone(),
                source: e.into(),
            })?;

        debug!(path = %self.path.display(), updated = updates.len(), "run state saved");
        Ok(())
    }
}
