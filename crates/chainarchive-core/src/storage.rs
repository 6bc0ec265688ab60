//! Durable storage abstraction for archived records.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ArchiveError;

/// Trait for the byte store records and checkpoints are written to.
///
/// Paths are relative to the backend's root. Implementations include
/// [`MemoryStorage`] here and `FsStorage` in `chainarchive-storage`.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Create the container at `path` and any missing parents.
    /// An existing container is not an error.
    async fn ensure_container(&self, path: &Path) -> Result<(), ArchiveError>;

    /// Write `bytes` as `name` inside the container at `path`, replacing
    /// previous content.
    async fn write_file(&self, path: &Path, name: &str, bytes: &[u8]) -> Result<(), ArchiveError>;

    /// Read the file at `path`. An absent file is `Ok(None)`.
    async fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>, ArchiveError>;
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

/// In-memory storage for tests and dry runs.
///
/// Mirrors filesystem rules: writing into a container that was never ensured
/// fails. Writes under a prefix registered with [`MemoryStorage::fail_writes_under`]
/// fail as well, to exercise partial-failure paths; reads can be made to fail
/// the same way with [`MemoryStorage::fail_reads_under`].
#[derive(Default)]
pub struct MemoryStorage {
    containers: Mutex<BTreeSet<PathBuf>>,
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    failing: Mutex<Vec<PathBuf>>,
    failing_reads: Mutex<Vec<PathBuf>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write below `prefix` fail from now on.
    pub fn fail_writes_under(&self, prefix: impl Into<PathBuf>) {
        self.failing.lock().unwrap().push(prefix.into());
    }

    /// Make every read below `prefix` fail from now on.
    pub fn fail_reads_under(&self, prefix: impl Into<PathBuf>) {
        self.failing_reads.lock().unwrap().push(prefix.into());
    }

    /// Content of the file at `path`, if any.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    /// Number of stored files.
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn is_failing(prefixes: &Mutex<Vec<PathBuf>>, path: &Path) -> bool {
        prefixes
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

#[async_trait]
impl RecordStorage for MemoryStorage {
    async fn ensure_container(&self, path: &Path) -> Result<(), ArchiveError> {
        let mut containers = self.containers.lock().unwrap();
        for ancestor in path.ancestors() {
            containers.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let file = path.join(name);
        if Self::is_failing(&self.failing, &file) {
            return Err(ArchiveError::Storage(format!(
                "injected failure writing {}",
                file.display()
            )));
        }
        if !self.containers.lock().unwrap().contains(path) {
            return Err(ArchiveError::Storage(format!(
                "no such container: {}",
                path.display()
            )));
        }
        self.files.lock().unwrap().insert(file, bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>, ArchiveError> {
        if Self::is_failing(&self.failing_reads, path) {
            return Err(ArchiveError::Storage(format!(
                "injected failure reading {}",
                path.display()
            )));
        }
        Ok(self.get(path))
    }
}
