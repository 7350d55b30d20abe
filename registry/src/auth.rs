//! Caller authorization.
//!
//! The registry never inspects signatures itself. It hands the caller and the
//! operation's canonical message (see [`crate::message`]) to an injected
//! [`AuthVerifier`], then applies its own role checks (admin set membership,
//! active oracle record) on top.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::types::Identity;

/// Claimed signer of a call plus the signature it supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub signer: Identity,
    pub signature: Vec<u8>,
}

impl Caller {
    pub fn new(signer: Identity, signature: Vec<u8>) -> Self {
        Self { signer, signature }
    }

    /// Sign `message` with `key`, producing a caller whose identity is the
    /// key's public half.
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        let signature = key.sign(message);
        Self {
            signer: Identity::from_bytes(key.verifying_key().to_bytes()),
            signature: signature.to_bytes().to_vec(),
        }
    }
}

/// Authorization capability provided by the host environment.
pub trait AuthVerifier: Send + Sync {
    /// True when `caller` proves possession of its admin credential for
    /// `message`. Admin set membership is checked by the registry.
    fn verify_admin(&self, caller: &Caller, message: &[u8]) -> bool;

    /// True when `caller` is `oracle` and proves it for `message`.
    fn verify_oracle(&self, caller: &Caller, oracle: &Identity, message: &[u8]) -> bool;
}

/// Production verifier: `signer` is an Ed25519 public key and `signature`
/// must verify over the canonical message digest. Small-order keys and
/// non-canonical signatures are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn verify_signature(caller: &Caller, message: &[u8]) -> bool {
        let Ok(public_key) = VerifyingKey::from_bytes(caller.signer.as_bytes()) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&caller.signature) else {
            return false;
        };
        public_key.verify_strict(message, &signature).is_ok()
    }
}

impl AuthVerifier for Ed25519Verifier {
    fn verify_admin(&self, caller: &Caller, message: &[u8]) -> bool {
        Self::verify_signature(caller, message)
    }

    fn verify_oracle(&self, caller: &Caller, oracle: &Identity, message: &[u8]) -> bool {
        caller.signer == *oracle && Self::verify_signature(caller, message)
    }
}

/// Verifier for deployments where the relay already authenticated the
/// transport: the claimed signer is trusted and only identity binding is
/// checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedTransportVerifier;

impl AuthVerifier for TrustedTransportVerifier {
    fn verify_admin(&self, _caller: &Caller, _message: &[u8]) -> bool {
        true
    }

    fn verify_oracle(&self, caller: &Caller, oracle: &Identity, _message: &[u8]) -> bool {
        caller.signer == *oracle
    }
}
