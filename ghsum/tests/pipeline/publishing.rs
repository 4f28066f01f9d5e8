//! Summaries flowing into the cache and the RSS feed

use std::sync::Arc;

use ghsum::config::RssConfig;
use ghsum::orchestrator::Orchestrator;
use ghsum::output::{FeedPublisher, SummaryCache};

use crate::support::{
    repo_configs, services, settings, CannedSummarizer, RecordingSink, RecordingState,
    ScriptedSource,
};

fn rss_config(max_entries: usize) -> RssConfig {
    RssConfig {
        title: "Activity".into(),
        link: "https://example.com/rss.xml".into(),
        description: "Repository summaries".into(),
        filename: "rss.xml".into(),
        max_entries,
    }
}

#[tokio::test]
async fn test_summaries_published_as_one_batch() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut services = services(
        Arc::new(ScriptedSource::failing(&["o/b"])),
        Arc::new(RecordingState::default()),
        dir.path(),
    );
    services.summarizer = Some(Arc::new(CannedSummarizer));
    services.sink = Some(sink.clone());

    Orchestrator::new(services, settings(true))
        .run(repo_configs(&["o/a", "o/b", "o/c"]), 3)
        .await
        .unwrap();

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let mut titles: Vec<&str> = batches[0].iter().map(|e| e.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, ["Summary for o/a", "Summary for o/c"]);
}

#[tokio::test]
async fn test_feed_accumulates_and_prunes_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("output");
    let cache_path = dir.path().join("cache").join("summary_cache.json");

    let cache = Arc::new(SummaryCache::new(&cache_path));
    for run in 0..3 {
        let publisher = FeedPublisher::new(cache.clone(), rss_config(4), &output_dir);
        let mut services = services(
            Arc::new(ScriptedSource::default()),
            Arc::new(RecordingState::default()),
            &output_dir,
        );
        services.summarizer = Some(Arc::new(CannedSummarizer));
        services.sink = Some(Arc::new(publisher));

        Orchestrator::new(services, settings(true))
            .run(repo_configs(&["o/a", "o/b"]), 2)
            .await
            .unwrap();

        // Distinct completion times per run.
        if run < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        }
    }

    let cached = SummaryCache::new(&cache_path).load().await.unwrap();
    assert_eq!(cached.len(), 4);
    assert!(cached.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

    let xml = std::fs::read_to_string(output_dir.join("rss.xml")).unwrap();
    assert_eq!(xml.matches("<item>").count(), 4);
    assert!(xml.contains("o/a had 1 new items"));
}

#[tokio::test]
async fn test_republishing_same_entries_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SummaryCache::new(dir.path().join("cache.json"));
    let entry = ghsum::output::SummaryEntry {
        id: "o/a-2024-03-01T00:00:00Z".into(),
        title: "Summary for o/a".into(),
        content: "text".into(),
        link: "https://github.com/o/a".into(),
        timestamp: chrono::Utc::now(),
    };

    let first = cache.add_batch(&[entry.clone()], 10).await.unwrap().added;
    let second = cache.add_batch(&[entry], 10).await.unwrap();
    assert_eq!((first, second.added), (1, 0));
    assert_eq!(second.entries.len(), 1);
}
