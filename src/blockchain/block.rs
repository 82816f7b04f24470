use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// A single block in the chain.
///
/// Field order is the serialized layout external consumers parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: i64,
    pub hash: String,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub difficulty: u32,
}

/// SHA-256 over the header fields, hex encoded.
///
/// `difficulty`, `hash` and `transactions` are not part of the preimage.
pub fn calculate_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    payload: i64,
    previous_hash: &str,
    nonce: u64,
) -> String {
    let preimage = format!(
        "{}:{}:{}:{}:{}",
        index,
        timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        payload,
        previous_hash,
        nonce
    );
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash of the all-zero header; every genesis block carries it.
pub fn genesis_hash() -> String {
    calculate_hash(0, &DateTime::<Utc>::default(), 0, "", 0)
}

/// True when `hash` starts with `difficulty` zero characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    hash.len() >= required && hash.bytes().take(required).all(|c| c == b'0')
}

impl Block {
    /// Create the genesis block stamped with the current time.
    pub fn genesis() -> Self {
        Self::genesis_at(Utc::now())
    }

    /// Genesis block with an explicit creation time. The hash does not depend on it.
    pub fn genesis_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            index: 0,
            timestamp,
            payload: 0,
            hash: genesis_hash(),
            previous_hash: String::new(),
            transactions: Vec::new(),
            nonce: 0,
            difficulty: 0,
        }
    }

    /// Recompute the hash from the block's current header fields.
    pub fn compute_hash(&self) -> String {
        calculate_hash(
            self.index,
            &self.timestamp,
            self.payload,
            &self.previous_hash,
            self.nonce,
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}
