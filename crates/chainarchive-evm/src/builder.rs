//! Fluent builder API for crawler configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use chainarchive_evm::CrawlerBuilder;
//!
//! let config = CrawlerBuilder::new()
//!     .rpc_url("http://localhost:8545")
//!     .data_dir("/var/lib/chainarchive")
//!     .runtime_budget(Duration::from_secs(600))
//!     .build_config();
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chainarchive_core::config::CrawlerConfig;
use chainarchive_core::retry::RetryConfig;

/// Fluent builder for `CrawlerConfig`.
#[derive(Default)]
pub struct CrawlerBuilder {
    config: CrawlerConfig,
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the JSON-RPC endpoint.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = url.into();
        self
    }

    /// Set the chain id the endpoint must serve.
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.config.chain_id = chain_id;
        self
    }

    /// Set the archive root directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the checkpoint location (relative to the data dir).
    pub fn checkpoint(mut self, dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        self.config.checkpoint_dir = dir.into();
        self.config.checkpoint_name = name.into();
        self
    }

    /// Set the wall-clock budget of one run.
    pub fn runtime_budget(mut self, budget: Duration) -> Self {
        self.config.runtime_budget_ms = budget.as_millis() as u64;
        self
    }

    /// Set how many blocks behind head a fresh start begins.
    pub fn lookback(mut self, blocks: u64) -> Self {
        self.config.lookback = blocks;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the maximum number of concurrent RPC requests.
    pub fn throttle_limit(mut self, limit: usize) -> Self {
        self.config.throttle_limit = limit;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Build the `CrawlerConfig`.
    pub fn build_config(self) -> CrawlerConfig {
        self.config
    }
}
