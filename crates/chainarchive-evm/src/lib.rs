//! chainarchive-evm — EVM provider, block fetcher, processor and crawl loop.

pub mod builder;
pub mod crawler;
pub mod fetcher;
pub mod processor;
pub mod provider;
pub mod rpc;

pub use builder::CrawlerBuilder;
pub use crawler::{start_height, CrawlSummary, Crawler, StopReason};
pub use fetcher::BlockFetcher;
pub use processor::{BlockProcessor, ProcessReport};
pub use provider::{ChainProvider, JsonRpcProvider};
