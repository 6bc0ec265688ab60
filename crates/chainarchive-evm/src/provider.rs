//! Chain-data provider trait and its JSON-RPC implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use chainarchive_core::config::CrawlerConfig;
use chainarchive_core::error::ArchiveError;
use chainarchive_core::types::{parse_quantity, Block, Receipt};

use crate::rpc::{JsonRpcRequest, JsonRpcResponse};

/// The three remote capabilities the crawler needs.
///
/// `Ok(None)` means the provider answered but does not have the item (yet).
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn current_height(&self) -> Result<u64, ArchiveError>;
    async fn block_with_transactions(&self, height: u64) -> Result<Option<Block>, ArchiveError>;
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ArchiveError>;
}

/// HTTP JSON-RPC provider backed by `reqwest`.
///
/// At most `throttle_limit` requests are in flight at once; the rest queue on
/// a semaphore. Retrying is left to the caller.
pub struct JsonRpcProvider {
    url: String,
    http: reqwest::Client,
    throttle: Semaphore,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    /// Create a provider for `url` with its own HTTP client.
    pub fn new(
        url: impl Into<String>,
        throttle_limit: usize,
        request_timeout: Duration,
    ) -> Result<Self, ArchiveError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ArchiveError::Rpc(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(url, http, throttle_limit))
    }

    /// Create a provider from the crawler configuration.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ArchiveError> {
        Self::new(
            config.rpc_url.clone(),
            config.throttle_limit,
            config.request_timeout(),
        )
    }

    /// Create a provider around an existing `reqwest::Client`.
    pub fn with_client(url: impl Into<String>, http: reqwest::Client, throttle_limit: usize) -> Self {
        Self {
            url: url.into(),
            http,
            throttle: Semaphore::new(throttle_limit.max(1)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Chain id reported by the node (`eth_chainId`).
    pub async fn chain_id(&self) -> Result<u64, ArchiveError> {
        let raw: String = self.call("eth_chainId", vec![]).await?;
        parse_quantity(&raw).ok_or_else(|| ArchiveError::Rpc(format!("invalid chain id '{raw}'")))
    }

    /// Fail with [`ArchiveError::ChainMismatch`] unless the node serves `expected`.
    pub async fn ensure_chain(&self, expected: u64) -> Result<(), ArchiveError> {
        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(ArchiveError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ArchiveError> {
        let _permit = self
            .throttle
            .acquire()
            .await
            .map_err(|e| ArchiveError::Rpc(e.to_string()))?;

        let req = JsonRpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ArchiveError::Rpc(format!("{method}: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ArchiveError::Rpc(format!("{method}: HTTP {status}: {body}")));
        }

        let body: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| ArchiveError::Rpc(format!("{method}: {e}")))?;
        let result = body
            .into_result()
            .map_err(|e| ArchiveError::Rpc(format!("{method}: {e}")))?;
        Ok(serde_json::from_value(result)?)
    }
}

#[async_trait]
impl ChainProvider for JsonRpcProvider {
    async fn current_height(&self) -> Result<u64, ArchiveError> {
        let raw: String = self.call("eth_blockNumber", vec![]).await?;
        parse_quantity(&raw)
            .ok_or_else(|| ArchiveError::Rpc(format!("invalid block number '{raw}'")))
    }

    async fn block_with_transactions(&self, height: u64) -> Result<Option<Block>, ArchiveError> {
        self.call(
            "eth_getBlockByNumber",
            vec![json!(format!("{height:#x}")), json!(true)],
        )
        .await
    }

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ArchiveError> {
        self.call("eth_getTransactionReceipt", vec![json!(tx_hash)])
            .await
    }
}
