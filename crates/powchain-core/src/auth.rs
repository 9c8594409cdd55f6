//! Optional transaction authentication.
//!
//! A [`SignedTransaction`] carries a payload plus the signer's identity (hex
//! encoded public key) and a hex signature over the payload's compact JSON. The
//! ledger checks it through a [`SignatureVerifier`] chosen by its
//! [`AdmissionPolicy`]; blocks themselves never see keys or signatures beyond
//! the opaque envelope that gets queued.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::error::AuthError;
use crate::Payload;

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, identity: &str, message: &[u8], signature: &str) -> Result<(), AuthError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub payload: Payload,
    pub identity: String,
    pub signature: String,
}

impl SignedTransaction {
    pub fn signing_bytes(&self) -> Vec<u8> {
        signing_bytes(&self.payload)
    }

    pub fn verify_with(&self, verifier: &dyn SignatureVerifier) -> Result<(), AuthError> {
        verifier.verify(&self.identity, &self.signing_bytes(), &self.signature)
    }

    /// The value placed in the pending queue once admitted.
    pub fn into_envelope(self) -> Payload {
        json!({
            "payload": self.payload,
            "identity": self.identity,
            "signature": self.signature,
        })
    }
}

fn signing_bytes(payload: &Payload) -> Vec<u8> {
    payload.to_string().into_bytes()
}

/// Ed25519 signatures over hex identities.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, identity: &str, message: &[u8], signature: &str) -> Result<(), AuthError> {
        let key_bytes: [u8; 32] = hex::decode(identity)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(AuthError::MalformedIdentity)?;
        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| AuthError::MalformedIdentity)?;

        let sig_bytes: [u8; 64] = hex::decode(signature)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(AuthError::MalformedSignature)?;
        let sig = Signature::from_bytes(&sig_bytes);

        key.verify(message, &sig).map_err(|_| AuthError::BadSignature)
    }
}

/// Ed25519 signing key for producing [`SignedTransaction`]s.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair using the OS RNG.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self {
            signing: SigningKey::generate(&mut rng),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    pub fn seed(&self) -> [u8; 32] {
        self.signing.to_bytes()
    }

    /// Hex of the verifying key; this is the signer's identity.
    pub fn identity(&self) -> String {
        hex::encode(self.signing.verifying_key().to_bytes())
    }

    pub fn sign(&self, payload: Payload) -> SignedTransaction {
        let signature = self.signing.sign(&signing_bytes(&payload));
        SignedTransaction {
            payload,
            identity: self.identity(),
            signature: hex::encode(signature.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Which transactions the ledger admits into its pending queue.
#[derive(Clone, Default)]
pub enum AdmissionPolicy {
    /// Anything goes; signed transactions are queued without a check.
    #[default]
    Open,
    /// Only signed transactions that pass the verifier.
    Signed(Arc<dyn SignatureVerifier>),
}

impl AdmissionPolicy {
    pub fn ed25519() -> Self {
        AdmissionPolicy::Signed(Arc::new(Ed25519Verifier))
    }

    pub fn requires_signature(&self) -> bool {
        matches!(self, AdmissionPolicy::Signed(_))
    }
}

impl fmt::Debug for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPolicy::Open => f.write_str("Open"),
            AdmissionPolicy::Signed(_) => f.write_str("Signed"),
        }
    }
}
