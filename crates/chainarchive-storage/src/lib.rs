//! chainarchive-storage — storage backends for ChainArchive.
//!
//! Backends:
//! - [`fs`] — plain directory tree on the local filesystem
//! - `MemoryStorage` — in-memory (dev/testing), re-exported from core

pub mod fs;

pub use chainarchive_core::storage::MemoryStorage;
pub use fs::FsStorage;
