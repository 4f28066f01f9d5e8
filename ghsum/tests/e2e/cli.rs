//! E2E tests: command-line behavior without network access

use std::path::Path;
use std::process::{Command, Output};

fn ghsum(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ghsum"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("GHSUM_CONFIG_PATH")
        .output()
        .expect("Failed to run ghsum")
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_ghsum"))
        .arg("--help")
        .output()
        .expect("Failed to run ghsum --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["run", "schedule", "serve", "utils"] {
        assert!(stdout.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_validate_config_prints_overview() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
        [[repositories]]
        name = "neovim/neovim"
        include_releases = true

        [repositories.schedule]
        cron = "0 9 * * 1"
        timezone = "UTC"
        "#,
    );

    let output = ghsum(&config, &["utils", "validate-config"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration OK"));
    assert!(stdout.contains("neovim/neovim"));
    assert!(stdout.contains("releases"));
    assert!(stdout.contains("cron \"0 9 * * 1\" (UTC)"));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = ghsum(&dir.path().join("absent.toml"), &["utils", "validate-config"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.toml"));
}

#[test]
fn test_invalid_regex_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
        [filters.commits]
        exclude_commit_messages_regex = "("
        "#,
    );

    let output = ghsum(&config, &["utils", "validate-config"]);
    assert!(!output.status.success());
}

#[test]
fn test_unknown_repository_fails_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
        [[repositories]]
        name = "o/known"
        "#,
    );

    let output = ghsum(&config, &["run", "--repo", "o/unknown"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("o/unknown"));
}
