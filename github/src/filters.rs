//! Layered activity filters
//!
//! A [`FilterSpec`] holds one optional-predicate sub-spec per data type.
//! Global and per-repository specs are combined with [`FilterSpec::merge`]:
//! any field set on the repository spec replaces the global one, unset
//! fields fall through.
//!
//! Predicate semantics:
//! - unset predicate means "no constraint"
//! - equality is exact and case-sensitive
//! - regexes use "contains a match" semantics
//! - required labels must all be present on the item

use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{ActivityItem, Commit, Discussion, Issue, PullRequest, Release};

// ============================================================================
// Pattern
// ============================================================================

/// A regex compiled when the config is loaded
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source)
            .map_err(|e| serde::de::Error::custom(format!("invalid regex '{source}': {e}")))
    }
}

/// Which pull request timestamp is compared against the since boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinceField {
    #[default]
    Updated,
    Created,
}

// ============================================================================
// Sub-specs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitFilter {
    /// Exact git author name
    pub author: Option<String>,
    pub exclude_commit_messages_regex: Option<Pattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestFilter {
    pub author: Option<String>,

    /// OPEN, CLOSED or MERGED
    pub state: Option<String>,

    /// All of these labels must be present
    pub labels: Option<Vec<String>>,

    pub exclude_pull_request_titles_regex: Option<Pattern>,

    /// Unset resolves to [`SinceField::Updated`]
    pub since_filter_type: Option<SinceField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueFilter {
    pub author: Option<String>,
    pub milestone: Option<String>,

    /// All of these labels must be present
    pub labels: Option<Vec<String>>,

    /// Must be one of the issue's assignees
    pub assignee: Option<String>,

    pub exclude_issue_titles_regex: Option<Pattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscussionFilter {
    pub author: Option<String>,
    pub exclude_discussion_titles_regex: Option<Pattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseFilter {
    pub author: Option<String>,
    pub exclude_release_names_regex: Option<Pattern>,
}

/// Filter predicates for every data type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub commits: CommitFilter,
    pub pull_requests: PullRequestFilter,
    pub issues: IssueFilter,
    pub discussions: DiscussionFilter,
    pub releases: ReleaseFilter,
}

// ============================================================================
// Merge
// ============================================================================

fn pick<T: Clone>(specific: &Option<T>, general: &Option<T>) -> Option<T> {
    specific.clone().or_else(|| general.clone())
}

impl CommitFilter {
    pub fn merge(global: &Self, repo: &Self) -> Self {
        Self {
            author: pick(&repo.author, &global.author),
            exclude_commit_messages_regex: pick(
                &repo.exclude_commit_messages_regex,
                &global.exclude_commit_messages_regex,
            ),
        }
    }
}

impl PullRequestFilter {
    pub fn merge(global: &Self, repo: &Self) -> Self {
        Self {
            author: pick(&repo.author, &global.author),
            state: pick(&repo.state, &global.state),
            labels: pick(&repo.labels, &global.labels),
            exclude_pull_request_titles_regex: pick(
                &repo.exclude_pull_request_titles_regex,
                &global.exclude_pull_request_titles_regex,
            ),
            since_filter_type: pick(&repo.since_filter_type, &global.since_filter_type),
        }
    }

    pub fn since_field(&self) -> SinceField {
        self.since_filter_type.unwrap_or_default()
    }
}

impl IssueFilter {
    pub fn merge(global: &Self, repo: &Self) -> Self {
        Self {
            author: pick(&repo.author, &global.author),
            milestone: pick(&repo.milestone, &global.milestone),
            labels: pick(&repo.labels, &global.labels),
            assignee: pick(&repo.assignee, &global.assignee),
            exclude_issue_titles_regex: pick(
                &repo.exclude_issue_titles_regex,
                &global.exclude_issue_titles_regex,
            ),
        }
    }
}

impl DiscussionFilter {
    pub fn merge(global: &Self, repo: &Self) -> Self {
        Self {
            author: pick(&repo.author, &global.author),
            exclude_discussion_titles_regex: pick(
                &repo.exclude_discussion_titles_regex,
                &global.exclude_discussion_titles_regex,
            ),
        }
    }
}

impl ReleaseFilter {
    pub fn merge(global: &Self, repo: &Self) -> Self {
        Self {
            author: pick(&repo.author, &global.author),
            exclude_release_names_regex: pick(
                &repo.exclude_release_names_regex,
                &global.exclude_release_names_regex,
            ),
        }
    }
}

impl FilterSpec {
    /// Field-level merge; repository values win over global ones
    pub fn merge(global: &FilterSpec, repo: &FilterSpec) -> FilterSpec {
        FilterSpec {
            commits: CommitFilter::merge(&global.commits, &repo.commits),
            pull_requests: PullRequestFilter::merge(&global.pull_requests, &repo.pull_requests),
            issues: IssueFilter::merge(&global.issues, &repo.issues),
            discussions: DiscussionFilter::merge(&global.discussions, &repo.discussions),
            releases: ReleaseFilter::merge(&global.releases, &repo.releases),
        }
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Decides whether one fetched item survives into the result set
pub trait ItemFilter<T> {
    fn passes(&self, item: &T, since: DateTime<Utc>) -> bool;
}

/// Author match plus, when `since` is given, the item's own timestamp bound
fn common_checks<T: ActivityItem>(
    author: &Option<String>,
    item: &T,
    since: Option<DateTime<Utc>>,
) -> bool {
    since.map_or(true, |s| item.timestamp() >= s)
        && author.as_deref().map_or(true, |r| r == item.author())
}

fn not_excluded(pattern: &Option<Pattern>, text: &str) -> bool {
    pattern.as_ref().map_or(true, |p| !p.is_match(text))
}

fn has_all_labels(required: &Option<Vec<String>>, labels: &[String]) -> bool {
    required
        .as_ref()
        .map_or(true, |req| req.iter().all(|r| labels.contains(r)))
}

impl ItemFilter<Commit> for CommitFilter {
    fn passes(&self, commit: &Commit, since: DateTime<Utc>) -> bool {
        common_checks(&self.author, commit, Some(since))
            && not_excluded(&self.exclude_commit_messages_regex, &commit.message)
    }
}

impl ItemFilter<PullRequest> for PullRequestFilter {
    fn passes(&self, pr: &PullRequest, since: DateTime<Utc>) -> bool {
        let compared = match self.since_field() {
            SinceField::Updated => pr.updated_at,
            SinceField::Created => pr.created_at,
        };
        compared >= since
            && common_checks(&self.author, pr, None)
            && self.state.as_deref().map_or(true, |s| s == pr.state)
            && has_all_labels(&self.labels, &pr.labels)
            && not_excluded(&self.exclude_pull_request_titles_regex, &pr.title)
    }
}

impl ItemFilter<Issue> for IssueFilter {
    // The search query already restricts issues to those created after `since`.
    fn passes(&self, issue: &Issue, _since: DateTime<Utc>) -> bool {
        common_checks(&self.author, issue, None)
            && has_all_labels(&self.labels, &issue.labels)
            && self
                .milestone
                .as_deref()
                .map_or(true, |m| issue.milestone.as_deref() == Some(m))
            && self
                .assignee
                .as_ref()
                .map_or(true, |a| issue.assignees.contains(a))
            && not_excluded(&self.exclude_issue_titles_regex, &issue.title)
    }
}

impl ItemFilter<Discussion> for DiscussionFilter {
    fn passes(&self, discussion: &Discussion, since: DateTime<Utc>) -> bool {
        common_checks(&self.author, discussion, Some(since))
            && not_excluded(&self.exclude_discussion_titles_regex, &discussion.title)
    }
}

impl ItemFilter<Release> for ReleaseFilter {
    fn passes(&self, release: &Release, since: DateTime<Utc>) -> bool {
        common_checks(&self.author, release, Some(since))
            && not_excluded(&self.exclude_release_names_regex, &release.name)
    }
}
