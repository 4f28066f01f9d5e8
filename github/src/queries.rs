//! GraphQL query documents and their page extractors
//!
//! Every [`ActivityQuery`] variant pairs a query document (taking a
//! `$cursor: String` variable) with the JSON pointer of the connection it
//! pages through. Pagination itself is shared, see [`crate::pagination`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GithubError, GithubResult};
use crate::pagination::Page;

const COMMITS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $since: GitTimestamp, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: 100, after: $cursor, since: $since) {
            pageInfo { endCursor hasNextPage }
            nodes {
              oid
              messageHeadline
              url
              committedDate
              author { name date }
            }
          }
        }
      }
    }
  }
}
"#;

const PULL_REQUESTS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $states: [PullRequestState!], $labels: [String!], $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequests(first: 100, after: $cursor, orderBy: {field: UPDATED_AT, direction: DESC}, states: $states, labels: $labels) {
      pageInfo { endCursor hasNextPage }
      nodes {
        number
        title
        body
        author { login }
        state
        createdAt
        updatedAt
        mergedAt
        url
        labels(first: 20) { nodes { name } }
      }
    }
  }
}
"#;

const ISSUES_QUERY: &str = r#"
query($searchQuery: String!, $cursor: String) {
  search(query: $searchQuery, type: ISSUE, first: 100, after: $cursor) {
    pageInfo { endCursor hasNextPage }
    nodes {
      ... on Issue {
        number
        title
        body
        author { login }
        state
        createdAt
        url
        labels(first: 20) { nodes { name } }
        milestone { title }
        assignees(first: 10) { nodes { login } }
      }
    }
  }
}
"#;

const DISCUSSIONS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    discussions(first: 100, after: $cursor, orderBy: {field: UPDATED_AT, direction: DESC}) {
      pageInfo { endCursor hasNextPage }
      nodes {
        id
        title
        body
        author { login }
        createdAt
        url
        labels(first: 20) { nodes { name } }
      }
    }
  }
}
"#;

const RELEASES_QUERY: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    releases(first: 100, after: $cursor, orderBy: {field: CREATED_AT, direction: DESC}) {
      pageInfo { endCursor hasNextPage }
      nodes {
        id
        name
        tagName
        description
        publishedAt
        url
        author { login }
      }
    }
  }
}
"#;

const LABELS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    labels(first: 100, after: $cursor) {
      pageInfo { endCursor hasNextPage }
      nodes { name }
    }
  }
}
"#;

/// A paged activity query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityQuery {
    /// Default-branch history
    Commits,
    PullRequests,
    /// Issue search with a `created:>` predicate
    Issues,
    Discussions,
    Releases,
    Labels,
}

impl ActivityQuery {
    pub fn name(&self) -> &'static str {
        match self {
            ActivityQuery::Commits => "commits",
            ActivityQuery::PullRequests => "pull_requests",
            ActivityQuery::Issues => "issues",
            ActivityQuery::Discussions => "discussions",
            ActivityQuery::Releases => "releases",
            ActivityQuery::Labels => "labels",
        }
    }

    pub fn document(&self) -> &'static str {
        match self {
            ActivityQuery::Commits => COMMITS_QUERY,
            ActivityQuery::PullRequests => PULL_REQUESTS_QUERY,
            ActivityQuery::Issues => ISSUES_QUERY,
            ActivityQuery::Discussions => DISCUSSIONS_QUERY,
            ActivityQuery::Releases => RELEASES_QUERY,
            ActivityQuery::Labels => LABELS_QUERY,
        }
    }

    /// JSON pointer of the paged connection inside `data`
    pub fn connection_path(&self) -> &'static str {
        match self {
            ActivityQuery::Commits => "/repository/defaultBranchRef/target/history",
            ActivityQuery::PullRequests => "/repository/pullRequests",
            ActivityQuery::Issues => "/search",
            ActivityQuery::Discussions => "/repository/discussions",
            ActivityQuery::Releases => "/repository/releases",
            ActivityQuery::Labels => "/repository/labels",
        }
    }

    /// Pull `{nodes, pageInfo}` out of one response
    pub fn extract_page(&self, data: &Value) -> GithubResult<Page> {
        // An empty repository has no default branch and therefore no history.
        if *self == ActivityQuery::Commits
            && data
                .pointer("/repository/defaultBranchRef")
                .is_some_and(Value::is_null)
        {
            return Ok(Page::empty());
        }

        let path = self.connection_path();
        let connection = data
            .pointer(path)
            .filter(|v| !v.is_null())
            .ok_or_else(|| GithubError::MalformedPage {
                path,
                reason: "connection missing from response".to_string(),
            })?;

        Page::deserialize(connection).map_err(|e| GithubError::MalformedPage {
            path,
            reason: e.to_string(),
        })
    }
}
