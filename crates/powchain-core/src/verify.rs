//! Tamper-evidence check over a whole chain.
//!
//! Every block after genesis is checked against four rules, and every broken
//! rule is reported; nothing short-circuits. Genesis is only ever used as the
//! predecessor of block 1, so neither its own hash nor its difficulty is checked.

use serde::Serialize;
use std::fmt;

use crate::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "block", rename_all = "snake_case")]
pub enum Violation {
    /// `blocks[i].index != i`.
    WrongIndex(usize),
    /// `blocks[i].previous_hash` differs from `blocks[i - 1].hash`.
    WrongPreviousHash(usize),
    /// The stored hash differs from the recomputed one.
    WrongHash(usize),
    /// Timestamp not strictly later than the predecessor's.
    Backdating(usize),
}

impl Violation {
    pub fn block(&self) -> usize {
        match *self {
            Violation::WrongIndex(i)
            | Violation::WrongPreviousHash(i)
            | Violation::WrongHash(i)
            | Violation::Backdating(i) => i,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::WrongIndex(i) => write!(f, "Wrong block index at block {i}"),
            Violation::WrongPreviousHash(i) => write!(f, "Wrong previous hash at block {i}"),
            Violation::WrongHash(i) => write!(f, "Wrong hash at block {i}"),
            Violation::Backdating(i) => write!(f, "Backdating at block {i}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    violations: Vec<Violation>,
}

impl Verification {
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Human readable diagnostics, one per violated rule per block.
    pub fn details(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn into_parts(self) -> (bool, Vec<String>) {
        (self.ok(), self.details())
    }
}

pub fn verify(blocks: &[Block]) -> Verification {
    let mut violations = Vec::new();
    for (i, pair) in blocks.windows(2).enumerate() {
        let i = i + 1;
        let (prev, block) = (&pair[0], &pair[1]);

        if block.index != i as u64 {
            violations.push(Violation::WrongIndex(i));
        }
        if prev.hash.as_deref() != Some(block.previous_hash.as_str()) {
            violations.push(Violation::WrongPreviousHash(i));
        }
        if block.hash.as_deref() != Some(block.compute_hash().as_str()) {
            violations.push(Violation::WrongHash(i));
        }
        if prev.timestamp >= block.timestamp {
            violations.push(Violation::Backdating(i));
        }
    }
    Verification { violations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, Utc};
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_600_000_000 + secs, 0).unwrap()
    }

    /// Hand-built, correctly linked chain of `len` blocks (no proof of work needed here).
    fn linked_chain(len: usize) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::with_capacity(len);
        for i in 0..len {
            let previous = blocks.last().map_or("0".to_string(), |b| b.hash_str().to_string());
            let mut block = Block::candidate(i as u64, vec![json!({ "n": i })], at(i as i64), previous);
            block.hash = Some(block.compute_hash());
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn consistent_chain_passes() {
        let result = verify(&linked_chain(5));
        assert_eq!(result.into_parts(), (true, vec![]));
    }

    #[test]
    fn genesis_only_passes() {
        assert!(verify(&linked_chain(1)).ok());
        assert!(verify(&[]).ok());
    }

    #[test]
    fn genesis_is_not_checked() {
        let mut blocks = linked_chain(1);
        blocks[0].transactions.push(json!("tampered"));
        blocks[0].index = 9;
        assert!(verify(&blocks).ok());
    }

    #[test]
    fn tampered_payload_is_wrong_hash() {
        let mut blocks = linked_chain(4);
        blocks[2].transactions[0]["n"] = json!(99);
        let result = verify(&blocks);
        assert_eq!(result.violations(), &[Violation::WrongHash(2)]);
        assert_eq!(result.details(), vec!["Wrong hash at block 2".to_string()]);
    }

    #[test]
    fn corrupted_link_is_reported_separately() {
        let mut blocks = linked_chain(3);
        blocks[1].previous_hash = "deadbeef".into();
        let result = verify(&blocks);
        // the digest covers previous_hash, so both rules fire
        assert_eq!(
            result.violations(),
            &[Violation::WrongPreviousHash(1), Violation::WrongHash(1)]
        );
    }

    #[test]
    fn relinked_block_still_breaks_linkage() {
        let mut blocks = linked_chain(3);
        blocks[1].previous_hash = "deadbeef".into();
        blocks[1].hash = Some(blocks[1].compute_hash());
        let result = verify(&blocks);
        // block 2 now points at the old hash of block 1
        assert_eq!(
            result.violations(),
            &[Violation::WrongPreviousHash(1), Violation::WrongPreviousHash(2)]
        );
    }

    #[test]
    fn wrong_index_reported() {
        let mut blocks = linked_chain(3);
        blocks[2].index = 7;
        blocks[2].hash = Some(blocks[2].compute_hash());
        let result = verify(&blocks);
        assert_eq!(result.details(), vec!["Wrong block index at block 2".to_string()]);
    }

    #[test]
    fn equal_timestamp_is_backdating() {
        let mut blocks = linked_chain(2);
        blocks[1].timestamp = blocks[0].timestamp;
        blocks[1].hash = Some(blocks[1].compute_hash());
        assert_eq!(verify(&blocks).violations(), &[Violation::Backdating(1)]);
    }

    #[test]
    fn earlier_timestamp_is_backdating() {
        let mut blocks = linked_chain(2);
        blocks[1].timestamp = blocks[0].timestamp - TimeDelta::seconds(5);
        blocks[1].hash = Some(blocks[1].compute_hash());
        assert_eq!(verify(&blocks).details(), vec!["Backdating at block 1".to_string()]);
    }

    #[test]
    fn accumulates_every_rule_across_blocks() {
        let mut blocks = linked_chain(4);
        blocks[1].index = 5;
        blocks[1].previous_hash = "x".into();
        blocks[1].timestamp = at(-1);
        blocks[3].transactions.clear();
        let result = verify(&blocks);
        assert!(!result.ok());
        assert_eq!(
            result.details(),
            vec![
                "Wrong block index at block 1".to_string(),
                "Wrong previous hash at block 1".to_string(),
                "Wrong hash at block 1".to_string(),
                "Backdating at block 1".to_string(),
                "Wrong hash at block 3".to_string(),
            ]
        );
        assert_eq!(result.violations()[4].block(), 3);
    }

    #[test]
    fn unfinalized_block_fails_hash_rule() {
        let mut blocks = linked_chain(2);
        blocks[1].hash = None;
        assert_eq!(verify(&blocks).violations(), &[Violation::WrongHash(1)]);
    }

    #[test]
    fn violation_serializes_with_rule_tag() {
        let text = serde_json::to_string(&Violation::Backdating(4)).unwrap();
        assert_eq!(text, r#"{"rule":"backdating","block":4}"#);
    }
}
