//! Commit type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::GHOST_AUTHOR;
use super::ActivityItem;

/// A commit on the default branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full object id
    pub sha: String,

    /// Git author name
    pub author: String,

    /// Commit headline (first line of the message)
    pub message: String,

    /// Authored date
    pub date: DateTime<Utc>,

    pub html_url: String,
}

/// Commit history node as returned by GraphQL
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub oid: String,
    pub message_headline: String,
    pub url: String,
    #[serde(default)]
    pub author: Option<GitActorNode>,
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
}

/// Git-level author of a commit (not necessarily a GitHub user)
#[derive(Debug, Clone, Deserialize)]
pub struct GitActorNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl From<CommitNode> for Commit {
    fn from(node: CommitNode) -> Self {
        let (author, authored) = match node.author {
            Some(actor) => (actor.name, actor.date),
            None => (None, None),
        };
        Self {
            sha: node.oid,
            author: author.unwrap_or_else(|| GHOST_AUTHOR.to_string()),
            message: node.message_headline,
            date: authored.or(node.committed_date).unwrap_or_default(),
            html_url: node.url,
        }
    }
}

impl ActivityItem for Commit {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.date
    }
}
