//! Typed activity fetches
//!
//! [`GitHubClient`] binds query variables, paginates, decodes raw nodes into
//! activity items and applies the data type's [`ItemFilter`]. One client is
//! shared by every repository task of a run.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::error::{GithubError, GithubResult};
use crate::filters::{
    CommitFilter, DiscussionFilter, IssueFilter, ItemFilter, PullRequestFilter, ReleaseFilter,
};
use crate::pagination::{paginate, DEFAULT_MAX_PAGES};
use crate::queries::ActivityQuery;
use crate::transport::{GraphqlTransport, RateLimit};
use crate::types::commit::CommitNode;
use crate::types::common::LabelNode;
use crate::types::discussion::DiscussionNode;
use crate::types::issue::IssueNode;
use crate::types::pull_request::PullRequestNode;
use crate::types::release::ReleaseNode;
use crate::types::{Commit, Discussion, Issue, PullRequest, Release, RepositoryId};

/// GitHub activity client over any [`GraphqlTransport`]
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn GraphqlTransport>,
    max_pages: usize,
}

impl GitHubClient {
    pub fn new(transport: Arc<dyn GraphqlTransport>) -> Self {
        Self {
            transport,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Last rate-limit budget seen by the transport
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.transport.rate_limit()
    }

    async fn fetch_nodes(
        &self,
        query: ActivityQuery,
        variables: Map<String, Value>,
    ) -> GithubResult<Vec<Value>> {
        let result = paginate(self.transport.as_ref(), &query, variables, self.max_pages).await?;
        debug!(
            query = query.name(),
            nodes = result.nodes.len(),
            pages = result.pages,
            truncated = result.truncated,
            "fetched nodes"
        );
        Ok(result.nodes)
    }

    /// Default-branch commits authored at or after `since`
    #[instrument(skip(self, filter), fields(repo = %repo))]
    pub async fn fetch_commits(
        &self,
        repo: &RepositoryId,
        filter: &CommitFilter,
        since: DateTime<Utc>,
    ) -> GithubResult<Vec<Commit>> {
        let mut variables = repo_variables(repo);
        variables.insert("since".into(), json!(iso_seconds(since)));

        let nodes = self.fetch_nodes(ActivityQuery::Commits, variables).await?;
        let mut commits = Vec::new();
        for node in nodes {
            let commit = Commit::from(decode::<CommitNode>("commit", node)?);
            if filter.passes(&commit, since) {
                commits.push(commit);
            }
        }
        Ok(commits)
    }

    /// Pull requests whose selected timestamp is at or after `since`
    #[instrument(skip(self, filter), fields(repo = %repo))]
    pub async fn fetch_pull_requests(
        &self,
        repo: &RepositoryId,
        filter: &PullRequestFilter,
        since: DateTime<Utc>,
    ) -> GithubResult<Vec<PullRequest>> {
        let mut variables = repo_variables(repo);
        if let Some(state) = &filter.state {
            variables.insert("states".into(), json!([state]));
        }
        if let Some(labels) = &filter.labels {
            variables.insert("labels".into(), json!(labels));
        }

        let nodes = self.fetch_nodes(ActivityQuery::PullRequests, variables).await?;
        let mut pull_requests = Vec::new();
        for node in nodes {
            let pr = PullRequest::from(decode::<PullRequestNode>("pull request", node)?);
            if filter.passes(&pr, since) {
                pull_requests.push(pr);
            }
        }
        Ok(pull_requests)
    }

    /// Issues created after `since`
    #[instrument(skip(self, filter), fields(repo = %repo))]
    pub async fn fetch_issues(
        &self,
        repo: &RepositoryId,
        filter: &IssueFilter,
        since: DateTime<Utc>,
    ) -> GithubResult<Vec<Issue>> {
        let mut variables = Map::new();
        variables.insert("searchQuery".into(), json!(issue_search_query(repo, since)));

        let nodes = self.fetch_nodes(ActivityQuery::Issues, variables).await?;
        let mut issues = Vec::new();
        for node in nodes {
            // Search results that are not issues come back as empty objects.
            if node.as_object().is_some_and(Map::is_empty) {
                continue;
            }
            let issue = Issue::from(decode::<IssueNode>("issue", node)?);
            if filter.passes(&issue, since) {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    /// Discussions created at or after `since`
    #[instrument(skip(self, filter), fields(repo = %repo))]
    pub async fn fetch_discussions(
        &self,
        repo: &RepositoryId,
        filter: &DiscussionFilter,
        since: DateTime<Utc>,
    ) -> GithubResult<Vec<Discussion>> {
        let nodes = self
            .fetch_nodes(ActivityQuery::Discussions, repo_variables(repo))
            .await?;
        let mut discussions = Vec::new();
        for node in nodes {
            let discussion = Discussion::from(decode::<DiscussionNode>("discussion", node)?);
            if filter.passes(&discussion, since) {
                discussions.push(discussion);
            }
        }
        Ok(discussions)
    }

    /// Releases published at or after `since`; drafts are skipped
    #[instrument(skip(self, filter), fields(repo = %repo))]
    pub async fn fetch_releases(
        &self,
        repo: &RepositoryId,
        filter: &ReleaseFilter,
        since: DateTime<Utc>,
    ) -> GithubResult<Vec<Release>> {
        let nodes = self
            .fetch_nodes(ActivityQuery::Releases, repo_variables(repo))
            .await?;
        let mut releases = Vec::new();
        for node in nodes {
            let Some(release) = decode::<ReleaseNode>("release", node)?.into_release() else {
                continue;
            };
            if filter.passes(&release, since) {
                releases.push(release);
            }
        }
        Ok(releases)
    }

    /// Names of every label defined on the repository
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn fetch_labels(&self, repo: &RepositoryId) -> GithubResult<Vec<String>> {
        let nodes = self
            .fetch_nodes(ActivityQuery::Labels, repo_variables(repo))
            .await?;
        nodes
            .into_iter()
            .map(|node| decode::<LabelNode>("label", node).map(|l| l.name))
            .collect()
    }
}

fn repo_variables(repo: &RepositoryId) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert("owner".into(), json!(repo.owner()));
    variables.insert("repo".into(), json!(repo.name()));
    variables
}

fn iso_seconds(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Search string restricting issues to one repository and a creation window
pub fn issue_search_query(repo: &RepositoryId, since: DateTime<Utc>) -> String {
    format!("repo:{repo} is:issue created:>{}", iso_seconds(since))
}

fn decode<N: DeserializeOwned>(kind: &'static str, node: Value) -> GithubResult<N> {
    serde_json::from_value(node).map_err(|source| GithubError::Decode { kind, source })
}
