pub mod auth;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod verify;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use chain::Ledger;
pub use config::LedgerConfig;
pub use verify::{Verification, Violation};

/// An opaque transaction payload. The ledger never looks inside it.
pub type Payload = serde_json::Value;

/// Current UTC time truncated to whole microseconds, the precision the hasher encodes.
pub fn utc_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), now.timestamp_subsec_micros() * 1_000)
        .unwrap_or(now)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Payload>,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub nonce: u64,
    /// Set once the block is finalized, `None` while it is a mining candidate.
    pub hash: Option<String>,
}

/// Field order here is the canonical hash input order.
#[derive(Serialize)]
struct HashInput<'a> {
    index: u64,
    transactions: &'a [Payload],
    timestamp: i64,
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    pub fn candidate(
        index: u64,
        transactions: Vec<Payload>,
        timestamp: DateTime<Utc>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            transactions,
            timestamp,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: None,
        }
    }

    /// Compact JSON of `index, transactions, timestamp, previous_hash, nonce`, with
    /// the timestamp as integer microseconds since the Unix epoch.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let input = HashInput {
            index: self.index,
            transactions: &self.transactions,
            timestamp: self.timestamp.timestamp_micros(),
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        };
        serde_json::to_vec(&input).expect("block fields always serialize to JSON")
    }

    /// Lowercase hex SHA-256 of [`Block::canonical_bytes`].
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_finalized(&self) -> bool {
        self.hash.is_some()
    }

    /// The finalized hash, or `""` for a candidate.
    pub fn hash_str(&self) -> &str {
        self.hash.as_deref().unwrap_or_default()
    }
}

pub mod pow {
    use super::Block;
    use crate::constants::DIFFICULTY_CHAR;
    use crate::error::PowError;
    use tracing::debug;

    pub fn difficulty_prefix(difficulty: u32) -> String {
        DIFFICULTY_CHAR.to_string().repeat(difficulty as usize)
    }

    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        leading_zero_digits(hash) >= difficulty as usize
    }

    pub fn leading_zero_digits(hash: &str) -> usize {
        hash.chars().take_while(|c| *c == DIFFICULTY_CHAR).count()
    }

    /// Mine the block by counting the nonce up from 0 until the block hash starts
    /// with `difficulty` zero digits. Returns that hash; the block keeps the
    /// winning nonce but its `hash` field is left for the caller to assign.
    pub fn mine_nonce(block: &mut Block, difficulty: u32) -> String {
        block.nonce = 0;
        let mut hash = block.compute_hash();
        while !meets_difficulty(&hash, difficulty) {
            block.nonce = block.nonce.wrapping_add(1);
            hash = block.compute_hash();
        }
        debug!(index = block.index, nonce = block.nonce, %hash, "proof of work found");
        hash
    }

    /// Same search as [`mine_nonce`], giving up after `max_attempts` hashes.
    pub fn mine_nonce_bounded(
        block: &mut Block,
        difficulty: u32,
        max_attempts: u64,
    ) -> Result<String, PowError> {
        block.nonce = 0;
        for _ in 0..max_attempts {
            let hash = block.compute_hash();
            if meets_difficulty(&hash, difficulty) {
                debug!(index = block.index, nonce = block.nonce, %hash, "proof of work found");
                return Ok(hash);
            }
            block.nonce = block.nonce.wrapping_add(1);
        }
        debug!(index = block.index, max_attempts, "proof of work search exhausted");
        Err(PowError::Exhausted {
            attempts: max_attempts,
        })
    }
}
