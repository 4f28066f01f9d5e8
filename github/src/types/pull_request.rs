//! Pull request type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{label_names, login_or_ghost, ActorNode, Connection, LabelNode};
use super::ActivityItem;

/// A pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author: String,

    /// OPEN, CLOSED or MERGED
    pub state: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Pull request node as returned by GraphQL
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<ActorNode>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(default)]
    pub labels: Option<Connection<LabelNode>>,
}

impl From<PullRequestNode> for PullRequest {
    fn from(node: PullRequestNode) -> Self {
        Self {
            number: node.number,
            title: node.title,
            body: node.body.unwrap_or_default(),
            author: login_or_ghost(node.author),
            state: node.state,
            created_at: node.created_at,
            updated_at: node.updated_at,
            merged_at: node.merged_at,
            html_url: node.url,
            labels: label_names(node.labels),
        }
    }
}

impl ActivityItem for PullRequest {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
