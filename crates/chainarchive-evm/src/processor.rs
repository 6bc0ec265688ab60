//! Block processor — fans a fetched block out to its index placements.

use std::sync::Arc;

use futures::future::join_all;

use chainarchive_core::layout::IndexLayout;
use chainarchive_core::storage::RecordStorage;
use chainarchive_core::types::{AugmentedTransaction, Block};
use chainarchive_core::writer::{IndexedRecordWriter, WriteReport};

/// Aggregated write outcomes for one height.
#[derive(Debug)]
pub struct ProcessReport {
    pub height: u64,
    pub block: WriteReport,
    pub transactions: Vec<WriteReport>,
}

impl ProcessReport {
    /// `true` if every record landed under every one of its paths.
    pub fn is_complete(&self) -> bool {
        self.block.is_complete() && self.transactions.iter().all(WriteReport::is_complete)
    }

    /// Number of individual path writes that failed.
    pub fn failed_writes(&self) -> usize {
        std::iter::once(&self.block)
            .chain(&self.transactions)
            .map(|r| r.failures().count())
            .sum()
    }
}

/// Writes the block record and one record per transaction.
pub struct BlockProcessor {
    writer: IndexedRecordWriter,
    layout: IndexLayout,
}

impl BlockProcessor {
    pub fn new(storage: Arc<dyn RecordStorage>, layout: IndexLayout) -> Self {
        Self {
            writer: IndexedRecordWriter::new(storage),
            layout,
        }
    }

    /// Persist `block` and its transactions concurrently.
    ///
    /// Write failures are reported, not returned: they were already logged by
    /// the writer and never fail the height.
    pub async fn process(&self, block: &Block<AugmentedTransaction>) -> ProcessReport {
        let (block_report, transactions) =
            futures::join!(self.write_block(block), self.write_transactions(block));
        ProcessReport {
            height: block.number,
            block: block_report,
            transactions,
        }
    }

    async fn write_block(&self, block: &Block<AugmentedTransaction>) -> WriteReport {
        self.writer.write(&self.layout.block(block), block).await
    }

    async fn write_transactions(&self, block: &Block<AugmentedTransaction>) -> Vec<WriteReport> {
        let writes = block.transactions.iter().enumerate().map(|(position, tx)| async move {
            let placement = self.layout.transaction(block.number, position, tx);
            self.writer.write(&placement, tx).await
        });
        join_all(writes).await
    }
}
