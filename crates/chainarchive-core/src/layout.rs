//! Index layout — where each record is placed in storage.
//!
//! ```text
//! blocks/hash/<hash>/<hash>.json
//! blocks/height/<height:010>/<hash>.json
//! transactions/hash/<tx>/<tx>.json
//! transactions/to/<to>/<height:010>-<index:04>/<tx>.json
//! transactions/from/<from>/<nonce:010>/<tx>.json
//! ```
//!
//! Derived segments are lower-cased and numbers are zero-padded so that
//! lexicographic order of directory names equals numeric order.

use std::path::PathBuf;

use crate::types::{AugmentedTransaction, Block};

pub const HEIGHT_WIDTH: usize = 10;
pub const TX_INDEX_WIDTH: usize = 4;
pub const NONCE_WIDTH: usize = 10;

/// One logical record and every path it is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPlacement {
    /// Containers the record is written into.
    pub paths: Vec<PathBuf>,
    /// File name inside each container.
    pub name: String,
}

/// Derives index paths for blocks and transactions.
#[derive(Debug, Clone, Default)]
pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    /// Layout rooted at `root` inside the storage backend.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Placement of a block record: by hash and by height.
    pub fn block<T>(&self, block: &Block<T>) -> RecordPlacement {
        let hash = block.hash.to_lowercase();
        RecordPlacement {
            paths: vec![
                self.root.join("blocks/hash").join(&hash),
                self.root
                    .join("blocks/height")
                    .join(pad(block.number, HEIGHT_WIDTH)),
            ],
            name: record_name(&hash),
        }
    }

    /// Placement of a transaction+receipt record: by hash, by recipient and
    /// position, and by sender and nonce.
    ///
    /// `block_number` and `position` are used when the record itself carries
    /// no block number or transaction index. With neither `to` nor a created
    /// contract address there is no recipient placement.
    pub fn transaction(
        &self,
        block_number: u64,
        position: usize,
        tx: &AugmentedTransaction,
    ) -> RecordPlacement {
        let inner = &tx.transaction;
        let hash = inner.hash.to_lowercase();
        let height = inner.block_number.unwrap_or(block_number);
        let index = inner.transaction_index.unwrap_or(position as u64);

        let mut paths = vec![self.root.join("transactions/hash").join(&hash)];
        if let Some(to) = tx.recipient() {
            paths.push(
                self.root
                    .join("transactions/to")
                    .join(to.to_lowercase())
                    .join(format!(
                        "{}-{}",
                        pad(height, HEIGHT_WIDTH),
                        pad(index, TX_INDEX_WIDTH)
                    )),
            );
        }
        paths.push(
            self.root
                .join("transactions/from")
                .join(inner.from.to_lowercase())
                .join(pad(inner.nonce, NONCE_WIDTH)),
        );

        RecordPlacement {
            paths,
            name: record_name(&hash),
        }
    }
}

fn pad(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

fn record_name(hash: &str) -> String {
    format!("{hash}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;
    use serde_json::{json, Map};

    fn tx(to: Option<&str>) -> AugmentedTransaction {
        AugmentedTransaction {
            transaction: Transaction {
                hash: "0xDEAD".into(),
                from: "0xFrOm".into(),
                to: Some(to.map(String::from)),
                nonce: 7,
                block_number: Some(42),
                transaction_index: Some(3),
                extra: Map::new(),
            },
            receipt: None,
        }
    }

    #[test]
    fn block_fans_out_to_hash_and_height() {
        let block: Block = serde_json::from_value(json!({
            "hash": "0xABC", "number": "0x2a", "transactions": [],
        }))
        .unwrap();
        let placement = IndexLayout::default().block(&block);
        assert_eq!(placement.name, "0xabc.json");
        assert_eq!(
            placement.paths,
            vec![
                PathBuf::from("blocks/hash/0xabc"),
                PathBuf::from("blocks/height/0000000042"),
            ]
        );
    }

    #[test]
    fn transaction_paths_are_padded_and_lowercased() {
        let placement = IndexLayout::default().transaction(42, 3, &tx(Some("0xTo")));
        assert_eq!(placement.name, "0xdead.json");
        assert_eq!(
            placement.paths,
            vec![
                PathBuf::from("transactions/hash/0xdead"),
                PathBuf::from("transactions/to/0xto/0000000042-0003"),
                PathBuf::from("transactions/from/0xfrom/0000000007"),
            ]
        );
    }

    #[test]
    fn missing_recipient_skips_to_index() {
        let placement = IndexLayout::default().transaction(42, 3, &tx(None));
        assert_eq!(placement.paths.len(), 2);
        assert!(placement
            .paths
            .iter()
            .all(|p| !p.starts_with("transactions/to")));
    }

    #[test]
    fn root_prefixes_every_path() {
        let placement = IndexLayout::new("archive").transaction(42, 3, &tx(Some("0xto")));
        assert!(placement.paths.iter().all(|p| p.starts_with("archive")));
    }

    #[test]
    fn falls_back_to_block_position() {
        let mut t = tx(Some("0xto"));
        t.transaction.block_number = None;
        t.transaction.transaction_index = None;
        let placement = IndexLayout::default().transaction(9, 12, &t);
        assert_eq!(
            placement.paths[1],
            PathBuf::from("transactions/to/0xto/0000000009-0012")
        );
    }
}
