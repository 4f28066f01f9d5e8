//! Release type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{login_or_ghost, ActorNode};
use super::ActivityItem;

/// A published release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// GraphQL node id
    pub id: String,

    /// Release name, or the tag name when the release is unnamed
    pub name: String,

    pub tag_name: String,
    #[serde(default)]
    pub description: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub html_url: String,
}

/// Release node as returned by GraphQL
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNode {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<ActorNode>,

    /// Null for drafts
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    pub url: String,
}

impl ReleaseNode {
    /// Converts to a [`Release`]; unpublished drafts yield `None`
    pub fn into_release(self) -> Option<Release> {
        let published_at = self.published_at?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.tag_name.clone());
        Some(Release {
            id: self.id,
            name,
            tag_name: self.tag_name,
            description: self.description.unwrap_or_default(),
            author: login_or_ghost(self.author),
            published_at,
            html_url: self.url,
        })
    }
}

impl ActivityItem for Release {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.published_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: Option<&str>, published: Option<&str>) -> ReleaseNode {
        serde_json::from_value(serde_json::json!({
            "id": "RE_1",
            "name": name,
            "tagName": "v1.2.0",
            "description": "notes",
            "author": { "login": "maintainer" },
            "publishedAt": published,
            "url": "https://github.com/o/r/releases/tag/v1.2.0"
        }))
        .unwrap()
    }

    #[test]
    fn test_unnamed_release_uses_tag() {
        let release = node(None, Some("2024-03-01T00:00:00Z"))
            .into_release()
            .unwrap();
        assert_eq!(release.name, "v1.2.0");
        assert_eq!(release.author, "maintainer");
    }

    #[test]
    fn test_draft_release_is_skipped() {
        assert!(node(Some("Draft"), None).into_release().is_none());
    }
}
