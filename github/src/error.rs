//! Error types for GitHub API operations
//!
//! Transport, protocol and decoding failures all abort the pagination attempt
//! that hit them; callers decide how far the failure propagates.

use thiserror::Error;

/// Errors that can occur when talking to the GitHub GraphQL API
#[derive(Error, Debug)]
pub enum GithubError {
    /// The HTTP request itself failed (connect, timeout, body read)
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("GitHub API returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The token was rejected
    #[error("GitHub token rejected - check github.token or GITHUB_TOKEN")]
    Unauthorized,

    /// The GraphQL response carried an `errors` array
    #[error("GraphQL errors: {0}")]
    Graphql(String),

    /// The GraphQL response had neither `data` nor `errors`
    #[error("GraphQL response contained no data")]
    MissingData,

    /// A page did not have the expected `nodes` / `pageInfo` shape
    #[error("unexpected page shape at {path}: {reason}")]
    MalformedPage {
        /// JSON pointer of the connection that was expected
        path: &'static str,
        /// What went wrong
        reason: String,
    },

    /// A node could not be decoded into its activity type
    #[error("failed to decode {kind} node: {source}")]
    Decode {
        /// Data type being decoded
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A repository name was not in `owner/name` form
    #[error("invalid repository name '{0}' - expected owner/name")]
    InvalidRepository(String),
}

/// Result type alias for GitHub operations
pub type GithubResult<T> = Result<T, GithubError>;
