//! Activity sources
//!
//! [`ActivitySource`] fetches the filtered dataset of one repository. The
//! [`GitHubClient`] implementation fetches every enabled data type
//! concurrently; a failing data type degrades to an empty list and never
//! fails its siblings.

use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use github_activity::{DataType, FilterSpec, GitHubClient, GithubResult, RepoDataset};
use tracing::{debug, error};

use crate::config::RepoConfig;

#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Filtered activity of `repo` since `since`, using already-merged filters
    async fn fetch(
        &self,
        repo: &RepoConfig,
        filters: &FilterSpec,
        since: DateTime<Utc>,
    ) -> Result<RepoDataset>;
}

#[async_trait]
impl ActivitySource for GitHubClient {
    async fn fetch(
        &self,
        repo: &RepoConfig,
        filters: &FilterSpec,
        since: DateTime<Utc>,
    ) -> Result<RepoDataset> {
        let name = &repo.name;
        let (commits, pull_requests, issues, discussions, releases) = tokio::join!(
            fetch_enabled(
                repo,
                DataType::Commits,
                self.fetch_commits(name, &filters.commits, since)
            ),
            fetch_enabled(
                repo,
                DataType::PullRequests,
                self.fetch_pull_requests(name, &filters.pull_requests, since)
            ),
            fetch_enabled(
                repo,
                DataType::Issues,
                self.fetch_issues(name, &filters.issues, since)
            ),
            fetch_enabled(
                repo,
                DataType::Discussions,
                self.fetch_discussions(name, &filters.discussions, since)
            ),
            fetch_enabled(
                repo,
                DataType::Releases,
                self.fetch_releases(name, &filters.releases, since)
            ),
        );

        Ok(RepoDataset {
            commits,
            pull_requests,
            issues,
            discussions,
            releases,
        })
    }
}

/// Await `fetch` only when the data type is enabled for `repo`
async fn fetch_enabled<T, F>(repo: &RepoConfig, data_type: DataType, fetch: F) -> Vec<T>
where
    F: Future<Output = GithubResult<Vec<T>>>,
{
    if !repo.includes(data_type) {
        debug!(repo = %repo.name, data_type = %data_type, "data type disabled");
        return Vec::new();
    }

    match fetch.await {
        Ok(items) => {
            debug!(repo = %repo.name, data_type = %data_type, count = items.len(), "fetched");
            items
        }
        Err(e) => {
            error!(
                repo = %repo.name,
                data_type = %data_type,
                error = %e,
                "fetch failed, continuing without this data type"
            );
            Vec::new()
        }
    }
}
