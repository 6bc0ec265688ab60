//! Filesystem storage backend.
//!
//! Records live as ordinary files under a root directory, so the archive can
//! be served or synced by any static file tool.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chainarchive_core::error::ArchiveError;
use chainarchive_core::storage::RecordStorage;

/// Directory-tree storage rooted at `root`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl RecordStorage for FsStorage {
    async fn ensure_container(&self, path: &Path) -> Result<(), ArchiveError> {
        let dir = self.resolve(path);
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => Ok(()),
            // A read-only mount that already holds the tree is still usable.
            Err(e) if e.kind() == ErrorKind::AlreadyExists || e.kind() == ErrorKind::ReadOnlyFilesystem => {
                tracing::debug!(path = %dir.display(), error = %e, "container not created");
                Ok(())
            }
            Err(e) => Err(ArchiveError::Storage(format!(
                "cannot create {}: {e}",
                dir.display()
            ))),
        }
    }

    async fn write_file(&self, path: &Path, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let file = self.resolve(path).join(name);
        tokio::fs::write(&file, bytes)
            .await
            .map_err(|e| ArchiveError::Storage(format!("cannot write {}: {e}", file.display())))
    }

    async fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>, ArchiveError> {
        let file = self.resolve(path);
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ArchiveError::Storage(format!(
                "cannot read {}: {e}",
                file.display()
            ))),
        }
    }
}
