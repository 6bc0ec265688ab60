//! The crawl loop — one time-boxed, resumable pass over new heights.
//!
//! ```text
//! load checkpoint → query head → next = checkpoint + 1 | head - lookback
//! while next <= head && elapsed < budget:
//!     retry(fetch(next) + process(next))
//!     save checkpoint(next)
//!     head = query head
//!     next += 1
//! ```
//!
//! The budget is checked only between heights; a height that has started
//! always runs to success or to an exhausted retry. The process is meant to be
//! re-run by an external scheduler, which picks up from the checkpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use chainarchive_core::checkpoint::{Checkpoint, CheckpointManager};
use chainarchive_core::config::CrawlerConfig;
use chainarchive_core::error::ArchiveError;
use chainarchive_core::layout::IndexLayout;
use chainarchive_core::retry::{retry, RetryPolicy};
use chainarchive_core::storage::RecordStorage;

use crate::fetcher::BlockFetcher;
use crate::processor::{BlockProcessor, ProcessReport};
use crate::provider::ChainProvider;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every height up to the head has been processed.
    CaughtUp,
    /// The runtime budget ran out before the head was reached.
    BudgetExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CaughtUp => write!(f, "caught-up"),
            Self::BudgetExhausted => write!(f, "budget-exhausted"),
        }
    }
}

/// Outcome of one [`Crawler::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// First height this run attempted. `None` when the checkpoint already
    /// sits at the last representable height.
    pub start_height: Option<u64>,
    /// Last height processed and checkpointed, if any.
    pub last_processed: Option<u64>,
    pub heights_processed: u64,
    /// Chain head as last observed.
    pub head: u64,
    pub stop: StopReason,
}

/// First height to process given the saved checkpoint and the current head.
///
/// Returns `None` when no height can follow the checkpoint.
pub fn start_height(checkpoint: Option<Checkpoint>, head: u64, lookback: u64) -> Option<u64> {
    match checkpoint {
        Some(cp) => cp.height.checked_add(1),
        None => Some(head.saturating_sub(lookback)),
    }
}

/// Drives fetch → process → checkpoint for consecutive heights.
pub struct Crawler<P> {
    fetcher: BlockFetcher<P>,
    processor: BlockProcessor,
    checkpoint: CheckpointManager,
    retry: RetryPolicy,
    runtime_budget: Duration,
    lookback: u64,
}

impl<P: ChainProvider> Crawler<P> {
    /// Build a crawler over an injected provider and storage backend.
    pub fn new(config: &CrawlerConfig, provider: Arc<P>, storage: Arc<dyn RecordStorage>) -> Self {
        let retry = RetryPolicy::new(config.retry.clone());
        Self {
            fetcher: BlockFetcher::new(provider, retry.clone()),
            processor: BlockProcessor::new(storage.clone(), IndexLayout::default()),
            checkpoint: CheckpointManager::new(
                storage,
                config.checkpoint_dir.clone(),
                config.checkpoint_name.clone(),
            ),
            retry,
            runtime_budget: config.runtime_budget(),
            lookback: config.lookback,
        }
    }

    /// Run one crawl pass.
    ///
    /// Returns an error only when a head query or a whole height exhausted
    /// its retries; the checkpoint then still points at the last completed
    /// height.
    pub async fn run(&self) -> Result<CrawlSummary, ArchiveError> {
        let started = Instant::now();
        let checkpoint = self.checkpoint.load().await;
        let mut head = self.fetcher.head().await?;
        let start = start_height(checkpoint, head, self.lookback);
        if start.is_none() {
            tracing::warn!(
                checkpoint = checkpoint.map(|cp| cp.height),
                "Checkpoint is at the maximum height, nothing left to crawl"
            );
        }

        tracing::info!(
            checkpoint = checkpoint.map(|cp| cp.height),
            head,
            start,
            "Starting crawl"
        );

        let mut next = start;
        let mut last_processed = None;
        let mut heights_processed = 0u64;

        let stop = loop {
            let Some(height) = next else {
                break StopReason::CaughtUp;
            };
            if height > head {
                break StopReason::CaughtUp;
            }
            let elapsed = started.elapsed();
            if elapsed >= self.runtime_budget {
                break StopReason::BudgetExhausted;
            }
            tracing::debug!(
                minutes_left = (self.runtime_budget - elapsed).as_secs_f64() / 60.0,
                "Processing time left"
            );

            let report =
                match retry(&self.retry, "process_height", || self.process_height(height)).await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::error!(
                            height,
                            error = %e,
                            transient = e.is_retryable(),
                            "Height failed after all retries"
                        );
                        return Err(e);
                    }
                };
            if !report.is_complete() {
                tracing::warn!(
                    height,
                    failed_writes = report.failed_writes(),
                    "Height archived with missing index entries"
                );
            }

            self.checkpoint.save(height).await;
            last_processed = Some(height);
            heights_processed += 1;

            head = self.fetcher.head().await?;
            next = height.checked_add(1);
        };

        tracing::info!(
            start,
            last_processed,
            heights_processed,
            head,
            stop = %stop,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Crawl finished"
        );

        Ok(CrawlSummary {
            start_height: start,
            last_processed,
            heights_processed,
            head,
            stop,
        })
    }

    async fn process_height(&self, height: u64) -> Result<ProcessReport, ArchiveError> {
        tracing::debug!(height, "Processing block");
        let block = self.fetcher.fetch(height).await?;
        let report = self.processor.process(&block).await;
        tracing::info!(
            height,
            hash = %block.hash,
            transactions = block.transactions.len(),
            "Processed block"
        );
        Ok(report)
    }
}
