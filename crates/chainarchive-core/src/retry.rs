//! Exponential backoff retry executor.
//!
//! Every remote interaction (head query, block fetch, each receipt fetch) and
//! the crawl loop's per-height unit are wrapped independently by [`retry`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the first try).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay on each retry.
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 7,
            base_delay_ms: 10,
            multiplier: 2,
        }
    }
}

/// Stateless retry policy — computes the delay for a given retry depth.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the delay to sleep after a failure at `depth` (0 = first try).
    /// Returns `None` once `max_retries` retries have been spent.
    pub fn next_delay(&self, depth: u32) -> Option<Duration> {
        if depth >= self.config.max_retries {
            return None;
        }
        let factor = u64::from(self.config.multiplier).saturating_pow(depth);
        Some(Duration::from_millis(
            self.config.base_delay_ms.saturating_mul(factor),
        ))
    }
}

/// Run `op` until it succeeds or the policy's retries are exhausted.
///
/// The final error is returned unchanged. `operation` only labels the
/// diagnostics.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut depth = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.next_delay(depth) {
                Some(delay) => {
                    tracing::debug!(
                        operation,
                        depth,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying"
                    );
                    tokio::time::sleep(delay).await;
                    depth += 1;
                }
                None => {
                    tracing::warn!(
                        operation,
                        attempts = depth + 1,
                        error = %e,
                        "retries exhausted"
                    );
                    return Err(e);
                }
            },
        }
    }
}
