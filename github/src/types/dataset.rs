//! Per-repository collection of filtered activity

use serde::{Deserialize, Serialize};

use super::{Commit, Discussion, Issue, PullRequest, Release, RepositoryId};

/// Kinds of activity the client can fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Commits,
    PullRequests,
    Issues,
    Discussions,
    Releases,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::Commits,
        DataType::PullRequests,
        DataType::Issues,
        DataType::Discussions,
        DataType::Releases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Commits => "commits",
            DataType::PullRequests => "pull_requests",
            DataType::Issues => "issues",
            DataType::Discussions => "discussions",
            DataType::Releases => "releases",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filtered activity for one repository, keyed by data type
///
/// A data type that was disabled or whose fetch failed is simply empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoDataset {
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequest>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub discussions: Vec<Discussion>,
    #[serde(default)]
    pub releases: Vec<Release>,
}

impl RepoDataset {
    pub fn count(&self, data_type: DataType) -> usize {
        match data_type {
            DataType::Commits => self.commits.len(),
            DataType::PullRequests => self.pull_requests.len(),
            DataType::Issues => self.issues.len(),
            DataType::Discussions => self.discussions.len(),
            DataType::Releases => self.releases.len(),
        }
    }

    pub fn total(&self) -> usize {
        DataType::ALL.iter().map(|t| self.count(*t)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A dataset tagged with its repository, as written to reports and prompts
#[derive(Debug, Serialize)]
pub struct RepoSnapshot<'a> {
    pub repo: &'a RepositoryId,
    #[serde(flatten)]
    pub dataset: &'a RepoDataset,
}

impl RepoDataset {
    pub fn snapshot<'a>(&'a self, repo: &'a RepositoryId) -> RepoSnapshot<'a> {
        RepoSnapshot {
            repo,
            dataset: self,
        }
    }
}
