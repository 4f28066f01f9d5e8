//! GitHub activity client
//!
//! Fetches recent repository activity (commits, pull requests, issues,
//! discussions, releases) through the GitHub GraphQL API and filters it
//! against layered [`FilterSpec`]s.
//!
//! - **Transport**: [`GraphqlTransport`] abstracts one GraphQL round trip;
//!   [`HttpTransport`] is the reqwest-backed implementation
//! - **Pagination**: [`paginate`] walks cursor pages up to a hard page ceiling
//! - **Queries**: [`ActivityQuery`] pairs each query document with its page extractor
//! - **Filters**: [`FilterSpec`] merges global and per-repository predicates
//!
//! # Example
//!
//! ```rust,ignore
//! use github_activity::{GitHubClient, HttpTransport, FilterSpec, RepositoryId};
//!
//! let transport = HttpTransport::new(token, DEFAULT_API_URL, timeout)?;
//! let client = GitHubClient::new(Arc::new(transport));
//! let repo: RepositoryId = "rust-lang/rust".parse()?;
//! let commits = client.fetch_commits(&repo, &filters.commits, since).await?;
//! ```

pub mod client;
pub mod error;
pub mod filters;
pub mod pagination;
pub mod queries;
pub mod transport;
pub mod types;

pub use client::GitHubClient;
pub use error::{GithubError, GithubResult};
pub use filters::{
    CommitFilter, DiscussionFilter, FilterSpec, IssueFilter, ItemFilter, Pattern,
    PullRequestFilter, ReleaseFilter, SinceField,
};
pub use pagination::{paginate, Page, PageInfo, Paginated, DEFAULT_MAX_PAGES};
pub use queries::ActivityQuery;
pub use transport::{GraphqlTransport, HttpTransport, RateLimit, DEFAULT_API_URL};
pub use types::{
    ActivityItem, Commit, DataType, Discussion, Issue, PullRequest, Release, RepoDataset,
    RepoSnapshot, RepositoryId,
};
