//! Failure isolation and the batched state commit

use std::sync::Arc;

use ghsum::orchestrator::Orchestrator;
use ghsum::state::{JsonStateStore, StateStore};
use github_activity::RepositoryId;

use crate::support::{repo_configs, services, settings, RecordingState, ScriptedSource};

#[tokio::test]
async fn test_failing_repository_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(RecordingState::default());
    let source = Arc::new(ScriptedSource::failing(&["o/two"]));
    let orchestrator = Orchestrator::new(
        services(source, state.clone(), dir.path()),
        settings(true),
    );

    let results = orchestrator
        .run(repo_configs(&["o/one", "o/two", "o/three"]), 3)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    for result in &results {
        if result.repo.to_string() == "o/two" {
            assert!(result.completed_at.is_none());
            assert!(result.dataset.is_empty());
            assert!(result.summary.is_empty());
            assert!(result.error.as_deref().unwrap().contains("connection reset"));
        } else {
            assert!(result.completed_at.is_some());
            assert_eq!(result.dataset.commits.len(), 1);
            assert!(result.is_success());
        }
    }
}

#[tokio::test]
async fn test_state_committed_once_for_successful_repositories() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(RecordingState::default());
    let source = Arc::new(ScriptedSource::failing(&["o/two"]));
    let orchestrator = Orchestrator::new(
        services(source, state.clone(), dir.path()),
        settings(true),
    );

    orchestrator
        .run(repo_configs(&["o/one", "o/two", "o/three"]), 2)
        .await
        .unwrap();

    let batches = state.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let keys: Vec<&str> = batches[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["config/config.toml::o/one", "config/config.toml::o/three"]
    );
}

#[tokio::test]
async fn test_failed_repository_keeps_previous_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(RecordingState::default());
    let source = Arc::new(ScriptedSource::failing(&["o/two"]));
    let orchestrator = Orchestrator::new(
        services(source, state.clone(), dir.path()),
        settings(true),
    );

    orchestrator.run(repo_configs(&["o/one", "o/two"]), 2).await.unwrap();
    orchestrator.run(repo_configs(&["o/one", "o/two"]), 2).await.unwrap();

    let values = state.values.lock().unwrap();
    assert!(values.contains_key("config/config.toml::o/one"));
    assert!(!values.contains_key("config/config.toml::o/two"));
    assert_eq!(state.batches.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_single_repository_uses_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(RecordingState::default());
    let orchestrator = Orchestrator::new(
        services(Arc::new(ScriptedSource::default()), state.clone(), dir.path()),
        settings(true),
    );

    let results = orchestrator.run(repo_configs(&["o/only"]), 4).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(state.batches.lock().unwrap()[0].len(), 1);
}

#[tokio::test]
async fn test_panicking_task_is_dropped_and_run_still_commits() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(RecordingState::default());
    let source = Arc::new(ScriptedSource::panicking(&["o/two"]));
    let orchestrator = Orchestrator::new(
        services(source.clone(), state.clone(), dir.path()),
        settings(true),
    );

    let results = orchestrator
        .run(repo_configs(&["o/one", "o/two", "o/three"]), 3)
        .await
        .unwrap();

    let mut names: Vec<String> = results.iter().map(|r| r.repo.to_string()).collect();
    names.sort();
    assert_eq!(names, ["o/one", "o/three"]);
    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(source.calls.load(std::sync::atomic::Ordering::SeqCst), 3);

    let batches = state.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let keys: Vec<&str> = batches[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["config/config.toml::o/one", "config/config.toml::o/three"]
    );
}

#[tokio::test]
async fn test_concurrent_runs_sharing_a_store_keep_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(JsonStateStore::new(dir.path().join("state.json")));

    let first = Orchestrator::new(
        services(Arc::new(ScriptedSource::default()), state.clone(), dir.path()),
        settings(true),
    );
    let second = Orchestrator::new(
        services(Arc::new(ScriptedSource::default()), state.clone(), dir.path()),
        settings(true),
    );

    for round in 0..10 {
        let a = format!("o/a{round}");
        let b = format!("o/b{round}");
        let (ra, rb) = tokio::join!(
            first.run(repo_configs(&[a.as_str()]), 1),
            second.run(repo_configs(&[b.as_str()]), 1),
        );
        ra.unwrap();
        rb.unwrap();
    }

    for round in 0..10 {
        for prefix in ["a", "b"] {
            let repo = RepositoryId::new("o", format!("{prefix}{round}"));
            assert!(
                state.get("config/config.toml", Some(&repo)).await.unwrap().is_some(),
                "missing completion for {repo}"
            );
        }
    }
}
