//! EVM block and receipt fetcher.
//!
//! Every remote call goes through the retry executor on its own, so one slow
//! or flaky receipt never forces a refetch of its siblings.

use std::sync::Arc;

use futures::future::join_all;

use chainarchive_core::error::ArchiveError;
use chainarchive_core::retry::{retry, RetryPolicy};
use chainarchive_core::types::{AugmentedTransaction, Block, Receipt};

use crate::provider::ChainProvider;

/// Fetches blocks with receipts merged into their transactions.
pub struct BlockFetcher<P> {
    provider: Arc<P>,
    retry: RetryPolicy,
}

impl<P: ChainProvider> BlockFetcher<P> {
    pub fn new(provider: Arc<P>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Fetch the current chain head height.
    pub async fn head(&self) -> Result<u64, ArchiveError> {
        retry(&self.retry, "current_height", || self.provider.current_height()).await
    }

    /// Fetch the block at `height` and the receipt of every transaction in it.
    ///
    /// Receipts are fetched concurrently and all of them are awaited; the
    /// height fails as a whole if the block or any single receipt could not
    /// be fetched within the retry budget.
    pub async fn fetch(&self, height: u64) -> Result<Block<AugmentedTransaction>, ArchiveError> {
        let mut block = retry(&self.retry, "get_block", || async move {
            self.provider
                .block_with_transactions(height)
                .await?
                .ok_or(ArchiveError::MissingBlock { height })
        })
        .await?;

        let receipts = join_all(block.transactions.iter().map(|tx| self.receipt(&tx.hash))).await;
        let receipts = receipts.into_iter().collect::<Result<Vec<_>, _>>()?;

        let transactions = std::mem::take(&mut block.transactions)
            .into_iter()
            .zip(receipts)
            .map(|(tx, receipt)| AugmentedTransaction::merge(tx, receipt))
            .collect();

        Ok(block.with_transactions(transactions))
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Receipt, ArchiveError> {
        retry(&self.retry, "get_receipt", || async move {
            self.provider
                .transaction_receipt(tx_hash)
                .await?
                .ok_or_else(|| ArchiveError::MissingReceipt {
                    tx_hash: tx_hash.to_string(),
                })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chainarchive_core::retry::RetryConfig;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// One block at height 42 with two transactions.
    #[derive(Default)]
    struct StubProvider {
        block_failures: AtomicU32,
        receipt_failures: Mutex<HashMap<String, u32>>,
        receipt_calls: AtomicU32,
    }

    #[async_trait]
    impl ChainProvider for StubProvider {
        async fn current_height(&self) -> Result<u64, ArchiveError> {
            Ok(42)
        }

        async fn block_with_transactions(&self, height: u64) -> Result<Option<Block>, ArchiveError> {
            if self.block_failures.load(Ordering::SeqCst) > 0 {
                self.block_failures.fetch_sub(1, Ordering::SeqCst);
                return Ok(None);
            }
            let block = json!({
                "hash": "0xB42",
                "number": format!("{height:#x}"),
                "transactions": [
                    { "hash": "0xT1", "from": "0xA", "to": "0xB", "nonce": "0x1" },
                    { "hash": "0xT2", "from": "0xA", "to": null, "nonce": "0x2" },
                ],
            });
            Ok(Some(serde_json::from_value(block)?))
        }

        async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ArchiveError> {
            self.receipt_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(left) = self.receipt_failures.lock().unwrap().get_mut(tx_hash) {
                if *left > 0 {
                    *left -= 1;
                    return Err(ArchiveError::Rpc("connection reset".into()));
                }
            }
            // 0xT2 is a contract creation
            let (index, to, created) = if tx_hash == "0xT1" {
                (0u64, json!("0xB"), json!(null))
            } else {
                (1u64, json!(null), json!("0xC"))
            };
            let receipt = json!({
                "transactionHash": tx_hash,
                "from": "0xA",
                "to": to,
                "contractAddress": created,
                "blockNumber": "0x2a",
                "transactionIndex": format!("{index:#x}"),
                "logs": [],
                "status": "0x1",
            });
            Ok(Some(serde_json::from_value(receipt)?))
        }
    }

    fn no_delay() -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            base_delay_ms: 0,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn fetch_merges_every_receipt() {
        let fetcher = BlockFetcher::new(Arc::new(StubProvider::default()), no_delay());
        let block = fetcher.fetch(42).await.unwrap();

        assert_eq!(block.number, 42);
        assert_eq!(block.transactions.len(), 2);
        assert!(block.transactions.iter().all(|t| t.receipt.is_some()));
        assert_eq!(block.transactions[1].transaction.transaction_index, Some(1));
        assert_eq!(block.transactions[1].recipient(), Some("0xC"));
    }

    #[tokio::test]
    async fn missing_block_is_retried() {
        let provider = StubProvider::default();
        provider.block_failures.store(3, Ordering::SeqCst);
        let fetcher = BlockFetcher::new(Arc::new(provider), no_delay());
        assert!(fetcher.fetch(42).await.is_ok());
    }

    #[tokio::test]
    async fn flaky_receipt_is_retried_alone() {
        let provider = StubProvider::default();
        provider
            .receipt_failures
            .lock()
            .unwrap()
            .insert("0xT2".into(), 5);
        let provider = Arc::new(provider);
        let fetcher = BlockFetcher::new(provider.clone(), no_delay());

        let block = fetcher.fetch(42).await.unwrap();
        assert_eq!(block.transactions.len(), 2);
        // one call for 0xT1, six for 0xT2
        assert_eq!(provider.receipt_calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn exhausted_receipt_fails_the_height_after_siblings_finish() {
        let provider = StubProvider::default();
        provider
            .receipt_failures
            .lock()
            .unwrap()
            .insert("0xT1".into(), 8);
        let provider = Arc::new(provider);
        let fetcher = BlockFetcher::new(provider.clone(), no_delay());

        let err = fetcher.fetch(42).await.unwrap_err();
        assert!(matches!(err, ArchiveError::Rpc(_)));
        // 8 attempts for 0xT1, 1 for 0xT2
        assert_eq!(provider.receipt_calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn head_is_retried_query() {
        let fetcher = BlockFetcher::new(Arc::new(StubProvider::default()), no_delay());
        assert_eq!(fetcher.head().await.unwrap(), 42);
    }
}
