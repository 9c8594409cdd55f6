use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DIFFICULTY, HASH_HEX_SIZE};
use crate::error::ConfigError;

/// Construction-time settings for a [`crate::chain::Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Number of leading `'0'` hex digits a mined block hash must have.
    pub difficulty: u32,
    /// Cap on nonces tried per `mine()` call. `None` searches until a proof is found.
    pub max_mining_attempts: Option<u64>,
    /// Only admit transactions carrying a valid Ed25519 signature.
    pub require_signatures: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_mining_attempts: None,
            require_signatures: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty as usize > HASH_HEX_SIZE {
            return Err(ConfigError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max: HASH_HEX_SIZE,
            });
        }
        if self.max_mining_attempts == Some(0) {
            return Err(ConfigError::ZeroMiningAttempts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: LedgerConfig = serde_json::from_str(r#"{"difficulty":3}"#).unwrap();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.max_mining_attempts, None);
        assert!(!config.require_signatures);
        assert_eq!(LedgerConfig::default().difficulty, 2);
    }

    #[test]
    fn rejects_unreachable_difficulty() {
        assert!(LedgerConfig::with_difficulty(64).validate().is_ok());
        assert_eq!(
            LedgerConfig::with_difficulty(65).validate(),
            Err(ConfigError::DifficultyTooHigh {
                difficulty: 65,
                max: 64
            })
        );
    }

    #[test]
    fn rejects_zero_attempt_cap() {
        let config = LedgerConfig {
            max_mining_attempts: Some(0),
            ..LedgerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMiningAttempts));
    }
}
