//! E2E tests: real runs against the GitHub API

use std::path::PathBuf;

use ghsum::{App, Config, RunOptions};

fn live_config(dir: &std::path::Path) -> Config {
    let content = format!(
        r#"
        output_dir = "{out}"
        state_file = "{state}"
        fallback_lookback_days = 3

        [[repositories]]
        name = "rust-lang/rust"
        include_discussions = false
        "#,
        out = dir.join("output").display(),
        state = dir.join("state.json").display(),
    );
    Config::parse(&content, &PathBuf::from("live.toml")).unwrap()
}

#[tokio::test]
#[ignore = "requires GITHUB_TOKEN and network access"]
async fn test_live_run_records_state() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::new(live_config(dir.path()));

    let options = RunOptions {
        save_json: true,
        skip_summary: true,
        ..Default::default()
    };
    let results = app.run(&options).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].is_success(), "{:?}", results[0].error);
    assert!(dir.path().join("output").join("rust-lang_rust_summary.json").exists());

    let state = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
    assert!(state.contains("live.toml::rust-lang/rust"));
}

#[tokio::test]
#[ignore = "requires GITHUB_TOKEN and network access"]
async fn test_live_labels() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::new(live_config(dir.path()));
    let client = app.github_client().unwrap();

    let labels = client
        .fetch_labels(&"rust-lang/rust".parse().unwrap())
        .await
        .unwrap();
    assert!(!labels.is_empty());
}
