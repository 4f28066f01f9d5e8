//! Discussion type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{label_names, login_or_ghost, ActorNode, Connection, LabelNode};
use super::ActivityItem;

/// A repository discussion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    /// GraphQL node id
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Discussion node as returned by GraphQL
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<ActorNode>,
    pub created_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub labels: Option<Connection<LabelNode>>,
}

impl From<DiscussionNode> for Discussion {
    fn from(node: DiscussionNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            body: node.body.unwrap_or_default(),
            author: login_or_ghost(node.author),
            created_at: node.created_at,
            html_url: node.url,
            labels: label_names(node.labels),
        }
    }
}

impl ActivityItem for Discussion {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}
