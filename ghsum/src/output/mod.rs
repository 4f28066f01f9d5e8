//! Output sinks
//!
//! - [`ReportWriter`]: per-repository markdown summary and JSON dataset files
//! - [`SummaryCache`]: bounded, de-duplicated history of published summaries
//! - [`FeedPublisher`]: a [`SummarySink`] that feeds the cache and rewrites the RSS file
//!
//! Every file is replaced atomically on the blocking pool.

mod cache;
mod feed;

pub use cache::{CacheUpdate, SummaryCache, SummaryEntry};
pub use feed::{markdown_to_html, render_rss, FeedPublisher};

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use github_activity::{RepoDataset, RepositoryId};
use tracing::info;

/// Receives the batch of summaries produced by one run
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn publish(&self, entries: &[SummaryEntry]) -> Result<()>;
}

// ============================================================================
// Report files
// ============================================================================

/// Writes `{owner}_{name}_summary.md` / `.json` into the output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn markdown_path(&self, repo: &RepositoryId) -> PathBuf {
        self.output_dir
            .join(format!("{}_summary.md", repo.file_stem()))
    }

    pub fn json_path(&self, repo: &RepositoryId) -> PathBuf {
        self.output_dir
            .join(format!("{}_summary.json", repo.file_stem()))
    }

    /// Write the summary as markdown; empty summaries produce no file
    pub async fn write_markdown(&self, repo: &RepositoryId, summary: &str) -> Result<Option<PathBuf>> {
        if summary.is_empty() {
            return Ok(None);
        }
        let path = self.markdown_path(repo);
        let content = format!("## Summary for {}\n\n{}", repo, summary);
        ghsum_common::write_atomic(path.clone(), content.into_bytes())
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(repo = %repo, path = %path.display(), "summary saved");
        Ok(Some(path))
    }

    /// Write the filtered dataset as pretty JSON
    pub async fn write_json(&self, repo: &RepositoryId, dataset: &RepoDataset) -> Result<PathBuf> {
        let path = self.json_path(repo);
        let data = serde_json::to_vec_pretty(&dataset.snapshot(repo))?;
        ghsum_common::write_atomic(path.clone(), data)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(repo = %repo, path = %path.display(), "report saved");
        Ok(path)
    }
}
