//! Crawler configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Configuration for a crawler instance.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// JSON-RPC endpoint of the chain-data provider.
    pub rpc_url: String,
    /// Chain id the provider must report (1 = Ethereum mainnet).
    pub chain_id: u64,
    /// Root directory for archived records and the checkpoint.
    pub data_dir: PathBuf,
    /// Checkpoint directory, relative to `data_dir`.
    pub checkpoint_dir: PathBuf,
    /// Checkpoint file name inside `checkpoint_dir`.
    pub checkpoint_name: String,
    /// Wall-clock budget for one run. Checked only between heights.
    pub runtime_budget_ms: u64,
    /// How far behind the head to start when there is no checkpoint.
    pub lookback: u64,
    /// Backoff policy for remote calls and for the per-height unit.
    pub retry: RetryConfig,
    /// Maximum concurrent in-flight RPC requests.
    pub throttle_limit: usize,
    /// Per-request HTTP timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://cloudflare-eth.com/v1/mainnet".into(),
            chain_id: 1,
            data_dir: PathBuf::from("data"),
            checkpoint_dir: PathBuf::from("metadata"),
            checkpoint_name: "metadata.json".into(),
            runtime_budget_ms: 15 * 60 * 1000,
            lookback: 5,
            retry: RetryConfig::default(),
            throttle_limit: 10,
            request_timeout_ms: 30_000,
        }
    }
}

impl CrawlerConfig {
    pub fn runtime_budget(&self) -> Duration {
        Duration::from_millis(self.runtime_budget_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
