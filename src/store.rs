//! Flat JSON snapshot of the last-notified video id per channel.
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::instrument;

/// channel id -> last-notified video id. Absence of a key means the channel
/// has never been notified on.
pub type Snapshot = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Owns the persisted snapshot file. One writer per cycle; callers pass the
/// complete merged mapping to `save`, never a delta.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty snapshot, not an error. Anything else
    /// (unreadable file, bad JSON) surfaces so we never invent state.
    #[instrument(skip_all)]
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Snapshot::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Full overwrite. Writes a sibling temp file and renames it over the
    /// target so a crash mid-write cannot truncate the previous snapshot.
    #[instrument(skip_all)]
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
