//! chainarchive — archive new blocks and receipts, then exit.
//!
//! Usage:
//! ```bash
//! # run from a scheduler (cron, systemd timer, CI job) every few minutes
//! chainarchive
//!
//! # more detail
//! RUST_LOG=debug chainarchive
//! ```
//!
//! Each run resumes from `data/metadata/metadata.json`, processes new heights
//! for at most 15 minutes and exits. Exit status is non-zero when a height
//! could not be processed.

use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainarchive_evm::{CrawlerBuilder, Crawler, JsonRpcProvider};
use chainarchive_storage::FsStorage;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %format!("{e:#}"), "Crawl aborted");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = CrawlerBuilder::new().build_config();

    let provider = JsonRpcProvider::from_config(&config).context("creating RPC provider")?;
    provider
        .ensure_chain(config.chain_id)
        .await
        .with_context(|| format!("checking chain id at {}", provider.url()))?;

    let storage = Arc::new(FsStorage::new(&config.data_dir));
    tracing::info!(
        rpc = %provider.url(),
        data_dir = %storage.root().display(),
        "Archiver configured"
    );

    let crawler = Crawler::new(&config, Arc::new(provider), storage);
    let summary = crawler.run().await.context("crawl failed")?;

    tracing::info!(
        processed = summary.heights_processed,
        last = summary.last_processed,
        stop = %summary.stop,
        "Done"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
