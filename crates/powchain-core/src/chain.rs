use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use crate::auth::{AdmissionPolicy, SignedTransaction};
use crate::config::LedgerConfig;
use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::error::{AdmissionError, AppendError, ConfigError, MineError, PowError, ProofError};
use crate::verify::{self, Verification};
use crate::{pow, utc_now, Block, Payload};

/// Append-only chain of finalized blocks plus the queue of unconfirmed transactions.
///
/// A `Ledger` has no internal locking. Callers sharing one across threads must
/// serialize every `&mut self` call (one writer at a time); reads of finalized
/// blocks may proceed concurrently.
#[derive(Debug, Clone)]
pub struct Ledger {
    difficulty: u32,
    max_mining_attempts: Option<u64>,
    policy: AdmissionPolicy,
    blocks: Vec<Block>,
    pending: Vec<Payload>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::build(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub fn with_difficulty(difficulty: u32) -> Result<Self, ConfigError> {
        Self::new(LedgerConfig::with_difficulty(difficulty))
    }

    /// Replace the admission policy, e.g. with a custom [`crate::auth::SignatureVerifier`].
    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn build(config: LedgerConfig) -> Self {
        let policy = if config.require_signatures {
            AdmissionPolicy::ed25519()
        } else {
            AdmissionPolicy::Open
        };
        let mut ledger = Self {
            difficulty: config.difficulty,
            max_mining_attempts: config.max_mining_attempts,
            policy,
            blocks: Vec::new(),
            pending: Vec::new(),
        };
        ledger.create_genesis();
        ledger
    }

    /// Genesis is hashed directly and never goes through proof of work, so its
    /// hash need not meet the difficulty.
    fn create_genesis(&mut self) {
        let mut genesis = Block::candidate(0, Vec::new(), utc_now(), GENESIS_PREVIOUS_HASH);
        let hash = genesis.compute_hash();
        info!(%hash, difficulty = self.difficulty, "genesis block created");
        genesis.hash = Some(hash);
        self.blocks.push(genesis);
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// The string every mined block hash must start with.
    pub fn prefix(&self) -> String {
        pow::difficulty_prefix(self.difficulty)
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Number of finalized blocks, genesis included.
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("ledger always holds the genesis block")
    }

    /// Unconfirmed transactions in arrival order.
    pub fn pending(&self) -> &[Payload] {
        &self.pending
    }

    /// Queue a transaction for the next block. Its content is not inspected.
    pub fn add_transaction(&mut self, tx: Payload) -> Result<(), AdmissionError> {
        if self.policy.requires_signature() {
            return Err(AdmissionError::SignatureRequired);
        }
        self.pending.push(tx);
        Ok(())
    }

    pub fn add_signed_transaction(&mut self, tx: SignedTransaction) -> Result<(), AdmissionError> {
        if let AdmissionPolicy::Signed(verifier) = &self.policy {
            tx.verify_with(verifier.as_ref()).inspect_err(|e| {
                warn!(identity = %tx.identity, error = %e, "signed transaction rejected");
            })?;
        }
        self.pending.push(tx.into_envelope());
        Ok(())
    }

    /// Check `proof` against `block`: it must carry the difficulty prefix and
    /// equal the hash recomputed from the block's current fields.
    pub fn is_valid_proof(&self, block: &Block, proof: &str) -> Result<(), ProofError> {
        if !pow::meets_difficulty(proof, self.difficulty) {
            return Err(ProofError::DifficultyNotMet {
                proof: proof.to_string(),
                prefix: self.prefix(),
            });
        }
        let computed = block.compute_hash();
        if computed != proof {
            return Err(ProofError::HashMismatch {
                proof: proof.to_string(),
                computed,
            });
        }
        Ok(())
    }

    /// Finalize `block` with `proof` and append it. Returns the new block's index.
    pub fn append(&mut self, mut block: Block, proof: &str) -> Result<u64, AppendError> {
        let tip = self.last_block().hash_str();
        if block.previous_hash != tip {
            return Err(AppendError::BrokenLink {
                expected: tip.to_string(),
                found: block.previous_hash,
            });
        }
        self.is_valid_proof(&block, proof)?;

        block.hash = Some(proof.to_string());
        let index = block.index;
        info!(
            index,
            nonce = block.nonce,
            txs = block.transactions.len(),
            hash = proof,
            "block appended"
        );
        self.blocks.push(block);
        Ok(index)
    }

    /// [`Ledger::append`] reduced to accepted / rejected.
    pub fn add_block(&mut self, block: Block, proof: &str) -> bool {
        self.append(block, proof).is_ok()
    }

    /// Mine every pending transaction into a new block.
    ///
    /// Returns `Ok(None)` when nothing is pending. The queue is only cleared once
    /// the block has been appended; on any error it is left as it was.
    pub fn mine(&mut self) -> Result<Option<u64>, MineError> {
        match self.max_mining_attempts {
            Some(cap) => self.mine_bounded(cap),
            None => self.mine_with(|block, difficulty| Ok(pow::mine_nonce(block, difficulty))),
        }
    }

    /// Like [`Ledger::mine`] but fails with [`MineError::Exhausted`] after `max_attempts` nonces.
    pub fn mine_bounded(&mut self, max_attempts: u64) -> Result<Option<u64>, MineError> {
        self.mine_with(|block, difficulty| pow::mine_nonce_bounded(block, difficulty, max_attempts))
    }

    fn mine_with<F>(&mut self, search: F) -> Result<Option<u64>, MineError>
    where
        F: FnOnce(&mut Block, u32) -> Result<String, PowError>,
    {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let tip = self.last_block();
        let mut candidate = Block::candidate(
            tip.index + 1,
            self.pending.clone(),
            self.next_timestamp(),
            tip.hash_str(),
        );

        let proof = search(&mut candidate, self.difficulty).inspect_err(|e| {
            warn!(index = candidate.index, error = %e, "mining gave up");
        })?;
        let index = self.append(candidate, &proof).inspect_err(|e| {
            warn!(error = %e, "mined block rejected, pending transactions kept");
        })?;

        self.pending.clear();
        Ok(Some(index))
    }

    /// Now, or one microsecond past the tip if the clock has not moved beyond it.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = utc_now();
        let tip = self.last_block().timestamp;
        if now > tip {
            now
        } else {
            tip + TimeDelta::microseconds(1)
        }
    }

    pub fn verify(&self) -> Verification {
        verify::verify(&self.blocks)
    }
}
