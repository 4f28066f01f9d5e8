//! Type definitions for GitHub activity
//!
//! Each activity type has a raw `*Node` struct mirroring the GraphQL shape
//! and a flattened item struct used by filters, summaries and reports.

pub mod commit;
pub mod common;
pub mod dataset;
pub mod discussion;
pub mod issue;
pub mod pull_request;
pub mod release;
pub mod repo;

use chrono::{DateTime, Utc};

pub use commit::Commit;
pub use dataset::{DataType, RepoDataset, RepoSnapshot};
pub use discussion::Discussion;
pub use issue::Issue;
pub use pull_request::PullRequest;
pub use release::Release;
pub use repo::RepositoryId;

/// Fields every activity item carries
///
/// The filter engine runs its shared author and date checks through this.
pub trait ActivityItem {
    fn author(&self) -> &str;

    /// Timestamp compared against the since boundary by default
    fn timestamp(&self) -> DateTime<Utc>;
}
