//! Chain records as fetched from the provider and as persisted.
//!
//! Fields the archiver needs are typed; everything else the provider returns
//! is carried through in `extra` so the persisted record stays verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Quantities ───────────────────────────────────────────────────────────────

/// Parse a JSON-RPC quantity (`0x`-prefixed hex, prefix optional) to u64.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).ok()
}

/// Serde adapter for JSON-RPC quantities.
///
/// Deserializes hex strings or plain JSON numbers; always serializes hex so a
/// fetched record is written back in its wire form.
pub mod quantity {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Hex(String),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Hex(s) => super::parse_quantity(&s)
                .ok_or_else(|| D::Error::custom(format!("invalid quantity '{s}'"))),
        }
    }

    /// Same as the parent module, for optional fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<u64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u64>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] u64);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
        }
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A block with its full transaction objects.
///
/// `T` is [`Transaction`] straight from the provider and
/// [`AugmentedTransaction`] once receipts have been merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block<T = Transaction> {
    pub hash: String,
    #[serde(with = "quantity")]
    pub number: u64,
    pub transactions: Vec<T>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> Block<T> {
    /// Replace the transaction list, keeping every other block field.
    pub fn with_transactions<U>(self, transactions: Vec<U>) -> Block<U> {
        Block {
            hash: self.hash,
            number: self.number,
            transactions,
            extra: self.extra,
        }
    }
}

/// Serde adapter for keys where absence differs from an explicit `null`.
///
/// Paired with `default` and `skip_serializing_if = "Option::is_none"`:
/// `None` is an absent key, `Some(None)` is `null`.
mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

// ─── Transaction ──────────────────────────────────────────────────────────────

/// A transaction as embedded in `eth_getBlockByNumber(…, true)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// `Some(None)` for contract creations, `None` when the key was absent.
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<Option<String>>,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(
        rename = "blockNumber",
        default,
        with = "quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub block_number: Option<u64>,
    #[serde(
        rename = "transactionIndex",
        default,
        with = "quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_index: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Recipient address, if the transaction has one.
    pub fn to_address(&self) -> Option<&str> {
        self.to.as_ref().and_then(|to| to.as_deref())
    }
}

// ─── Receipt ──────────────────────────────────────────────────────────────────

/// A transaction receipt from `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    pub from: String,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<Option<String>>,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<String>,
    #[serde(rename = "blockNumber", with = "quantity")]
    pub block_number: u64,
    #[serde(rename = "transactionIndex", with = "quantity")]
    pub transaction_index: u64,
    #[serde(default)]
    pub logs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Receipt-only fields carried by an [`AugmentedTransaction`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptFields {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,
    pub logs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─── AugmentedTransaction ─────────────────────────────────────────────────────

/// A transaction with its receipt merged on top.
///
/// Fields present on both sides take the receipt's value; receipt-only fields
/// are appended. The serialized object never repeats a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AugmentedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(flatten)]
    pub receipt: Option<ReceiptFields>,
}

impl AugmentedTransaction {
    /// Merge `receipt` onto `transaction`.
    pub fn merge(mut transaction: Transaction, receipt: Receipt) -> Self {
        transaction.from = receipt.from;
        if receipt.to.is_some() {
            transaction.to = receipt.to;
        }
        transaction.block_number = Some(receipt.block_number);
        transaction.transaction_index = Some(receipt.transaction_index);
        for key in ["transactionHash", "contractAddress", "logs"] {
            transaction.extra.remove(key);
        }

        let mut extra = Map::new();
        for (key, value) in receipt.extra {
            match transaction.extra.get_mut(&key) {
                Some(slot) => *slot = value,
                None => {
                    extra.insert(key, value);
                }
            }
        }

        Self {
            transaction,
            receipt: Some(ReceiptFields {
                transaction_hash: receipt.transaction_hash,
                contract_address: receipt.contract_address,
                logs: receipt.logs,
                extra,
            }),
        }
    }

    pub fn hash(&self) -> &str {
        &self.transaction.hash
    }

    /// Recipient address, or the created contract for contract creations.
    pub fn recipient(&self) -> Option<&str> {
        self.transaction.to_address().or_else(|| {
            self.receipt
                .as_ref()
                .and_then(|r| r.contract_address.as_deref())
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
