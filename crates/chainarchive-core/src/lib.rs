//! chainarchive-core — foundation for the time-boxed block and receipt archiver.
//!
//! # Architecture
//!
//! ```text
//! Crawler (chainarchive-evm)
//!     ├── retry              (bounded exponential backoff around every remote call)
//!     ├── CheckpointManager  (last processed height, resumption)
//!     ├── IndexLayout        (hash / height / address index paths)
//!     └── IndexedRecordWriter → RecordStorage (filesystem / memory)
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod layout;
pub mod retry;
pub mod storage;
pub mod types;
pub mod writer;

pub use checkpoint::{Checkpoint, CheckpointManager};
pub use config::CrawlerConfig;
pub use error::ArchiveError;
pub use layout::{IndexLayout, RecordPlacement};
pub use retry::{retry, RetryConfig, RetryPolicy};
pub use storage::RecordStorage;
pub use types::{AugmentedTransaction, Block, Receipt, Transaction};
pub use writer::{IndexedRecordWriter, WriteReport};
