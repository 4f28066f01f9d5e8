//! Bounded fan-out across repositories

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ghsum::orchestrator::Orchestrator;

use crate::support::{repo_configs, services, settings, RecordingState, ScriptedSource};

#[tokio::test]
async fn test_at_most_two_repositories_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::with_delay(Duration::from_millis(50)));
    let orchestrator = Orchestrator::new(
        services(source.clone(), Arc::new(RecordingState::default()), dir.path()),
        settings(true),
    );

    let results = orchestrator
        .run(repo_configs(&["o/a", "o/b", "o/c", "o/d", "o/e"]), 2)
        .await
        .unwrap();

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repositories_overlap_when_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::with_delay(Duration::from_millis(100)));
    let orchestrator = Orchestrator::new(
        services(source.clone(), Arc::new(RecordingState::default()), dir.path()),
        settings(false),
    );

    orchestrator
        .run(repo_configs(&["o/a", "o/b", "o/c"]), 3)
        .await
        .unwrap();

    assert!(source.max_in_flight.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_zero_concurrency_still_runs() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::default());
    let orchestrator = Orchestrator::new(
        services(source.clone(), Arc::new(RecordingState::default()), dir.path()),
        settings(true),
    );

    let results = orchestrator.run(repo_configs(&["o/a", "o/b"]), 0).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
}
