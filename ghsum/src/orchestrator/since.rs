//! Since-boundary resolution

use chrono::{DateTime, Duration, Utc};
use github_activity::RepositoryId;
use tracing::{debug, info, warn};

use crate::state::{StateError, StateStore};

/// Lower bound for "new" activity of one repository in this run
///
/// With tracking enabled the repository-qualified run time wins, then the
/// legacy whole-config run time, then `now - lookback_days`. With tracking
/// disabled the state store is not consulted.
pub async fn resolve_since(
    state: &dyn StateStore,
    config_key: &str,
    repo: &RepositoryId,
    tracking: bool,
    lookback_days: u32,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, StateError> {
    let fallback = now - Duration::days(i64::from(lookback_days));

    if !tracking {
        debug!(repo = %repo, since = %fallback, "run tracking disabled, using lookback window");
        return Ok(fallback);
    }

    if let Some(last) = state.get(config_key, Some(repo)).await? {
        debug!(repo = %repo, since = %last, "using last run time");
        return Ok(last);
    }

    if let Some(last) = state.get(config_key, None).await? {
        info!(repo = %repo, since = %last, "using legacy config-wide run time");
        return Ok(last);
    }

    warn!(
        repo = %repo,
        lookback_days,
        since = %fallback,
        "no previous run recorded, falling back to lookback window"
    );
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{run_key, JsonStateStore};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    async fn store_with(entries: &[(&str, &str)]) -> (tempfile::TempDir, JsonStateStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let map: BTreeMap<&str, &str> = entries.iter().copied().collect();
        std::fs::write(&path, serde_json::to_string(&map).unwrap()).unwrap();
        (dir, JsonStateStore::new(path))
    }

    #[tokio::test]
    async fn test_repo_key_wins_over_legacy() {
        let (_dir, store) = store_with(&[
            ("cfg", "2024-03-01T00:00:00+00:00"),
            ("cfg::o/r", "2024-03-05T00:00:00+00:00"),
        ])
        .await;
        let repo = RepositoryId::new("o", "r");

        let since = resolve_since(&store, "cfg", &repo, true, 7, at(10)).await.unwrap();
        assert_eq!(since, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_legacy_key_used_when_repo_key_missing() {
        let (_dir, store) = store_with(&[("cfg", "2024-03-01T00:00:00+00:00")]).await;
        let repo = RepositoryId::new("o", "r");

        let since = resolve_since(&store, "cfg", &repo, true, 7, at(10)).await.unwrap();
        assert_eq!(since, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_value_falls_back_to_lookback() {
        let (_dir, store) = store_with(&[("cfg::o/r", "not a time")]).await;
        let repo = RepositoryId::new("o", "r");

        let since = resolve_since(&store, "cfg", &repo, true, 7, at(10)).await.unwrap();
        assert_eq!(since, at(3));
    }

    #[tokio::test]
    async fn test_tracking_disabled_ignores_state() {
        let (_dir, store) = store_with(&[("cfg::o/r", "2024-03-09T00:00:00+00:00")]).await;
        let repo = RepositoryId::new("o", "r");

        for _ in 0..3 {
            let since = resolve_since(&store, "cfg", &repo, false, 2, at(10)).await.unwrap();
            assert_eq!(since, at(8));
        }
    }

    #[tokio::test]
    async fn test_written_batch_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));
        let repo = RepositoryId::new("o", "r");

        let mut updates = BTreeMap::new();
        updates.insert(run_key("cfg", Some("o/r")), at(9));
        store.set_batch(&updates).await.unwrap();

        let since = resolve_since(&store, "cfg", &repo, true, 7, at(10)).await.unwrap();
        assert_eq!(since, at(9));
    }
}
