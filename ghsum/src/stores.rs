//! Process-wide persistence handles
//!
//! Runs started by the same process (scheduled jobs firing together, the
//! scheduler inside `serve`) must commit through the same [`JsonStateStore`]
//! and [`SummaryCache`] for a given file, or their read-modify-write cycles
//! race and the last rename wins. [`SharedStores`] hands out one instance
//! per path and keeps it for the life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::output::SummaryCache;
use crate::state::JsonStateStore;

#[derive(Default)]
pub struct SharedStores {
    states: Mutex<HashMap<PathBuf, Arc<JsonStateStore>>>,
    caches: Mutex<HashMap<PathBuf, Arc<SummaryCache>>>,
}

impl SharedStores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The state store for `path`, created on first use
    pub async fn state(&self, path: &Path) -> Arc<JsonStateStore> {
        let mut states = self.states.lock().await;
        states
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                debug!(path = %path.display(), "opening run state");
                Arc::new(JsonStateStore::new(path))
            })
            .clone()
    }

    /// The summary cache for `path`, created on first use
    pub async fn cache(&self, path: &Path) -> Arc<SummaryCache> {
        let mut caches = self.caches.lock().await;
        caches
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                debug!(path = %path.display(), "opening summary cache");
                Arc::new(SummaryCache::new(path))
            })
            .clone()
    }
}
