use thiserror::Error;

/// Why a proof-of-work digest was not accepted for a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("digest {proof} does not start with {prefix:?}")]
    DifficultyNotMet { proof: String, prefix: String },
    #[error("digest {proof} does not match the recomputed block hash {computed}")]
    HashMismatch { proof: String, computed: String },
}

/// Reasons `Ledger::append` refuses a block. The ledger is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    #[error("block does not extend the tip: expected previous hash {expected}, found {found}")]
    BrokenLink { expected: String, found: String },
    #[error("invalid proof of work: {0}")]
    InvalidProof(#[from] ProofError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    #[error("no nonce satisfied the difficulty within {attempts} attempts")]
    Exhausted { attempts: u64 },
}

/// A mining attempt that produced no block. Pending transactions are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MineError {
    #[error("mined block was rejected: {0}")]
    Rejected(#[from] AppendError),
    #[error(transparent)]
    Exhausted(#[from] PowError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("identity is not a hex-encoded 32-byte public key")]
    MalformedIdentity,
    #[error("signature is not a hex-encoded 64-byte signature")]
    MalformedSignature,
    #[error("signature does not match the payload and identity")]
    BadSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("ledger only accepts signed transactions")]
    SignatureRequired,
    #[error("transaction rejected: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("difficulty {difficulty} exceeds the {max}-digit hash length")]
    DifficultyTooHigh { difficulty: u32, max: usize },
    #[error("max_mining_attempts must be greater than zero")]
    ZeroMiningAttempts,
}
