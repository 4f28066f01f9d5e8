//! GraphQL building blocks shared across activity nodes
//!
//! Users, labels and milestones arrive wrapped in nullable objects and
//! `nodes` connections; these helpers flatten them into plain strings.

use serde::Deserialize;

/// Author login used when GitHub reports no author (deleted accounts)
pub const GHOST_AUTHOR: &str = "ghost";

/// A `{ login }` actor object
#[derive(Debug, Clone, Deserialize)]
pub struct ActorNode {
    pub login: String,
}

/// A `{ name }` label object
#[derive(Debug, Clone, Deserialize)]
pub struct LabelNode {
    pub name: String,
}

/// A `{ title }` milestone object
#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneNode {
    pub title: String,
}

/// A `{ nodes: [...] }` connection
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// Login of a nullable author, falling back to [`GHOST_AUTHOR`]
pub fn login_or_ghost(actor: Option<ActorNode>) -> String {
    actor
        .map(|a| a.login)
        .unwrap_or_else(|| GHOST_AUTHOR.to_string())
}

/// Label names of a nullable label connection
pub fn label_names(labels: Option<Connection<LabelNode>>) -> Vec<String> {
    labels
        .unwrap_or_default()
        .nodes
        .into_iter()
        .map(|l| l.name)
        .collect()
}
