//! Atomic file writes
//!
//! Output files (reports, run state, summary cache, RSS) are written to a
//! temp file in the target directory and renamed into place, so a reader
//! never observes a half-written file.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic_blocking(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Async wrapper that runs [`write_atomic_blocking`] on the blocking pool.
pub async fn write_atomic(path: PathBuf, data: Vec<u8>) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &data)).await?
}
