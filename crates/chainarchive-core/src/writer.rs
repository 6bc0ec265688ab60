//! Indexed record writer — persists one record under every path of its
//! placement.
//!
//! Writes for the paths of one record run concurrently and independently. A
//! failing path is logged and reported but never stops its siblings, so a
//! record can end up present under some index paths and absent under others.
//! There is no cross-path atomicity; re-processing the height repairs it.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::error::ArchiveError;
use crate::layout::RecordPlacement;
use crate::storage::RecordStorage;

/// Per-path outcome of writing one record.
#[derive(Debug)]
pub struct WriteReport {
    pub name: String,
    pub outcomes: Vec<(PathBuf, Result<(), ArchiveError>)>,
}

impl WriteReport {
    /// `true` if the record was written under every path.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }

    /// Number of paths written successfully.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &ArchiveError)> {
        self.outcomes
            .iter()
            .filter_map(|(path, r)| r.as_ref().err().map(|e| (path, e)))
    }
}

/// Writes serialized records to a [`RecordStorage`].
pub struct IndexedRecordWriter {
    storage: Arc<dyn RecordStorage>,
}

impl IndexedRecordWriter {
    pub fn new(storage: Arc<dyn RecordStorage>) -> Self {
        Self { storage }
    }

    /// Write `content` as pretty JSON under every path of `placement`.
    pub async fn write<T: Serialize + ?Sized>(
        &self,
        placement: &RecordPlacement,
        content: &T,
    ) -> WriteReport {
        let name = placement.name.clone();
        let bytes = match serde_json::to_vec_pretty(content) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(record = %name, error = %e, "unable to serialize record");
                let outcomes = placement
                    .paths
                    .iter()
                    .map(|p| {
                        let err = ArchiveError::Other(format!("cannot serialize {name}: {e}"));
                        (p.clone(), Err(err))
                    })
                    .collect();
                return WriteReport { name, outcomes };
            }
        };

        let writes = placement.paths.iter().map(|path| {
            let bytes = &bytes;
            let name = &name;
            async move {
                let result = self.write_one(path, name, bytes).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        path = %path.join(name).display(),
                        error = %e,
                        "unable to write record"
                    );
                }
                (path.clone(), result)
            }
        });
        let outcomes = join_all(writes).await;

        WriteReport { name, outcomes }
    }

    async fn write_one(
        &self,
        path: &std::path::Path,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), ArchiveError> {
        self.storage.ensure_container(path).await?;
        self.storage.write_file(path, name, bytes).await
    }
}
