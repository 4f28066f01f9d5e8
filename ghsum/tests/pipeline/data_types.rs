//! Data-type toggles and per-type failures through the GitHub client

use std::sync::Arc;

use chrono::{Duration, Utc};
use github_activity::{ActivityQuery, FilterSpec, GitHubClient};

use ghsum::orchestrator::ActivitySource;

use crate::support::{activity_data, repo_configs, CountingTransport};

#[tokio::test]
async fn test_disabled_types_issue_no_requests() {
    let transport = Arc::new(CountingTransport::new(activity_data()));
    let client = GitHubClient::new(transport.clone());

    let mut repo = repo_configs(&["o/r"]).remove(0);
    repo.include_issues = false;
    repo.include_discussions = false;
    repo.include_releases = false;

    let since = Utc::now() - Duration::days(7);
    let dataset = client.fetch(&repo, &FilterSpec::default(), since).await.unwrap();

    assert_eq!(transport.requests(ActivityQuery::Commits), 1);
    assert_eq!(transport.requests(ActivityQuery::PullRequests), 1);
    assert_eq!(transport.requests(ActivityQuery::Issues), 0);
    assert_eq!(transport.requests(ActivityQuery::Discussions), 0);
    assert_eq!(transport.requests(ActivityQuery::Releases), 0);
    assert_eq!(transport.total_requests(), 2);

    assert_eq!(dataset.commits.len(), 1);
    assert_eq!(dataset.pull_requests.len(), 1);
}

#[tokio::test]
async fn test_failing_type_degrades_to_empty() {
    let transport =
        Arc::new(CountingTransport::new(activity_data()).failing(ActivityQuery::PullRequests));
    let client = GitHubClient::new(transport.clone());
    let repo = repo_configs(&["o/r"]).remove(0);

    let since = Utc::now() - Duration::days(7);
    let dataset = client.fetch(&repo, &FilterSpec::default(), since).await.unwrap();

    assert!(dataset.pull_requests.is_empty());
    assert_eq!(dataset.commits.len(), 1);
    assert_eq!(transport.requests(ActivityQuery::Issues), 1);
    assert_eq!(transport.requests(ActivityQuery::Discussions), 1);
}

#[tokio::test]
async fn test_merged_filters_reach_the_client() {
    let transport = Arc::new(CountingTransport::new(activity_data()));
    let client = GitHubClient::new(transport.clone());
    let repo = repo_configs(&["o/r"]).remove(0);

    let global: FilterSpec = toml::from_str(
        r#"
        [commits]
        exclude_commit_messages_regex = "^fix"
        "#,
    )
    .unwrap();
    let filters = FilterSpec::merge(&global, &repo.filters);

    let since = Utc::now() - Duration::days(7);
    let dataset = client.fetch(&repo, &filters, since).await.unwrap();
    assert!(dataset.commits.is_empty());
    assert_eq!(dataset.pull_requests.len(), 1);
}
