//! Summary cache
//!
//! A JSON array of published summaries, newest first, capped at
//! `max_entries`. The feed is always rendered from the whole cache.
//!
//! One [`SummaryCache`] per file is shared by every run in the process (see
//! [`crate::stores`]); its lock keeps overlapping runs from losing entries.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// `{owner/name}-{completion time}`
    pub id: String,
    pub title: String,
    /// Markdown summary text
    pub content: String,
    pub link: String,
    pub timestamp: DateTime<Utc>,
}

pub struct SummaryCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// Result of [`SummaryCache::add_batch`]
///
/// Other writers stay excluded until this is dropped, so anything derived
/// from `entries` (the feed file) is written in the same order as the cache.
pub struct CacheUpdate<'a> {
    pub added: usize,
    /// Cache contents after the update, newest first
    pub entries: Vec<SummaryEntry>,
    _guard: MutexGuard<'a, ()>,
}

impl SummaryCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All cached entries; a missing or corrupt file reads as empty
    pub async fn load(&self) -> Result<Vec<SummaryEntry>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_blocking(&path)).await?
    }

    /// Add new entries, skipping ids already cached, and keep the newest
    /// `max_entries`
    pub async fn add_batch(
        &self,
        entries: &[SummaryEntry],
        max_entries: usize,
    ) -> Result<CacheUpdate<'_>> {
        let guard = self.write_lock.lock().await;

        let mut cached = self.load().await?;
        let mut ids: HashSet<String> = cached.iter().map(|e| e.id.clone()).collect();

        let mut added = 0;
        for entry in entries {
            if ids.insert(entry.id.clone()) {
                cached.push(entry.clone());
                added += 1;
            } else {
                debug!(id = %entry.id, "summary already cached, skipping");
            }
        }

        cached.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        cached.truncate(max_entries.max(1));

        let data = serde_json::to_vec_pretty(&cached)?;
        ghsum_common::write_atomic(self.path.clone(), data)
            .await
            .with_context(|| format!("writing summary cache {}", self.path.display()))?;

        Ok(CacheUpdate {
            added,
            entries: cached,
            _guard: guard,
        })
    }
}

fn load_blocking(path: &Path) -> Result<Vec<SummaryEntry>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("reading summary cache {}", path.display()))
        }
    };
    match serde_json::from_str(&content) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not decode summary cache, starting empty");
            Ok(Vec::new())
        }
    }
}
