//! Issue type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{
    label_names, login_or_ghost, ActorNode, Connection, LabelNode, MilestoneNode,
};
use super::ActivityItem;

/// An issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author: String,

    /// OPEN or CLOSED
    pub state: String,

    pub created_at: DateTime<Utc>,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<String>,

    /// Milestone title, if any
    #[serde(default)]
    pub milestone: Option<String>,

    #[serde(default)]
    pub assignees: Vec<String>,
}

/// Issue node as returned by the GraphQL search connection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<ActorNode>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub labels: Option<Connection<LabelNode>>,
    #[serde(default)]
    pub milestone: Option<MilestoneNode>,
    #[serde(default)]
    pub assignees: Option<Connection<ActorNode>>,
}

impl From<IssueNode> for Issue {
    fn from(node: IssueNode) -> Self {
        Self {
            number: node.number,
            title: node.title,
            body: node.body.unwrap_or_default(),
            author: login_or_ghost(node.author),
            state: node.state,
            created_at: node.created_at,
            html_url: node.url,
            labels: label_names(node.labels),
            milestone: node.milestone.map(|m| m.title),
            assignees: node
                .assignees
                .unwrap_or_default()
                .nodes
                .into_iter()
                .map(|a| a.login)
                .collect(),
        }
    }
}

impl ActivityItem for Issue {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}
