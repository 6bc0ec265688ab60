//! Error types for the chainarchive pipeline.

use thiserror::Error;

/// Errors that can occur while crawling and archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Block {height} not available from provider")]
    MissingBlock { height: u64 },

    #[error("Receipt for transaction {tx_hash} not available from provider")]
    MissingReceipt { tx_hash: String },

    #[error("Connected to chain {actual}, expected chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("{0}")]
    Other(String),
}

impl ArchiveError {
    /// Returns `true` if this error is transient and worth another attempt.
    ///
    /// Informational only: the retry executor retries every error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Rpc(_) | Self::Storage(_) | Self::MissingBlock { .. } | Self::MissingReceipt { .. }
        )
    }
}
