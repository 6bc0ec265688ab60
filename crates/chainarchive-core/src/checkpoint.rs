//! Checkpoint manager — persists the last processed height for resumption.
//!
//! The checkpoint is a single JSON document `{"height": N}`. A missing or
//! unreadable checkpoint means "no prior progress"; a failed save only costs
//! reprocessing on the next run, so neither ever fails the crawl.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;
use crate::storage::RecordStorage;

/// A persisted checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last successfully processed block height.
    pub height: u64,
}

/// Manages checkpoint reads/writes at a fixed location.
pub struct CheckpointManager {
    storage: Arc<dyn RecordStorage>,
    dir: PathBuf,
    name: String,
}

impl CheckpointManager {
    pub fn new(
        storage: Arc<dyn RecordStorage>,
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Full path of the checkpoint file.
    pub fn location(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Load the saved checkpoint. Absent, unreadable and unparseable all
    /// return `None`.
    pub async fn load(&self) -> Option<Checkpoint> {
        let location = self.location();
        match self.storage.read_file(&location).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Checkpoint>(&bytes) {
                Ok(cp) => Some(cp),
                Err(e) => {
                    tracing::warn!(
                        path = %location.display(),
                        error = %e,
                        "Ignoring unparseable checkpoint"
                    );
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(path = %location.display(), "No checkpoint found");
                None
            }
            Err(e) => {
                tracing::warn!(
                    path = %location.display(),
                    error = %e,
                    "Ignoring unreadable checkpoint"
                );
                None
            }
        }
    }

    /// Write the checkpoint, creating its container first.
    pub async fn try_save(&self, height: u64) -> Result<(), ArchiveError> {
        let bytes = serde_json::to_vec_pretty(&Checkpoint { height })?;
        self.storage.ensure_container(&self.dir).await?;
        self.storage.write_file(&self.dir, &self.name, &bytes).await
    }

    /// Write the checkpoint, logging instead of failing.
    pub async fn save(&self, height: u64) {
        if let Err(e) = self.try_save(height).await {
            tracing::warn!(height, error = %e, "Failed to save checkpoint");
        }
    }
}
