//! Canonical messages signed by admins and oracles.
//!
//! Each mutating operation has one builder. The signed payload is the SHA-256
//! digest of `boxmeout-oracle:v1:<operation>:<args>`, where byte fields are
//! lowercase hex and numbers are decimal. Relays must sign exactly these bytes.
//!
//! Admin and override messages lead with `nonce`, the registry's
//! `next_sequence` at the time of the call. Any accepted mutation advances
//! it, so such a signature authorizes exactly one call. Attestations carry
//! no nonce: an oracle's slot in a round is written once and never freed.

use sha2::{Digest, Sha256};

use crate::types::{DataHash, EventId, Identity, Outcome, Timestamp};

const DOMAIN: &str = "boxmeout-oracle:v1";

fn digest(operation: &str, args: &[String]) -> [u8; 32] {
    let mut preimage = format!("{DOMAIN}:{operation}");
    for arg in args {
        preimage.push(':');
        preimage.push_str(arg);
    }
    Sha256::digest(preimage.as_bytes()).into()
}

pub fn register_oracle(nonce: u64, oracle: &Identity, name: &str) -> [u8; 32] {
    digest(
        "register_oracle",
        &[nonce.to_string(), oracle.to_hex(), name.to_string()],
    )
}

pub fn deregister_oracle(nonce: u64, oracle: &Identity) -> [u8; 32] {
    digest("deregister_oracle", &[nonce.to_string(), oracle.to_hex()])
}

pub fn set_required_consensus(nonce: u64, required_consensus: u32) -> [u8; 32] {
    digest(
        "set_required_consensus",
        &[nonce.to_string(), required_consensus.to_string()],
    )
}

pub fn add_admin_signer(nonce: u64, new_admin: &Identity) -> [u8; 32] {
    digest("add_admin_signer", &[nonce.to_string(), new_admin.to_hex()])
}

pub fn set_required_signatures(nonce: u64, required_signatures: u32) -> [u8; 32] {
    digest(
        "set_required_signatures",
        &[nonce.to_string(), required_signatures.to_string()],
    )
}

pub fn set_override_cooldown(nonce: u64, cooldown_secs: u64) -> [u8; 32] {
    digest(
        "set_override_cooldown",
        &[nonce.to_string(), cooldown_secs.to_string()],
    )
}

pub fn schedule_event(nonce: u64, event_id: &EventId, resolution_time: Timestamp) -> [u8; 32] {
    digest(
        "schedule_event",
        &[
            nonce.to_string(),
            event_id.to_hex(),
            resolution_time.to_string(),
        ],
    )
}

pub fn submit_attestation(
    oracle: &Identity,
    event_id: &EventId,
    outcome: Outcome,
    data_hash: &DataHash,
) -> [u8; 32] {
    digest(
        "submit_attestation",
        &[
            oracle.to_hex(),
            event_id.to_hex(),
            outcome.to_string(),
            data_hash.to_hex(),
        ],
    )
}

pub fn emergency_override(
    nonce: u64,
    event_id: &EventId,
    forced_outcome: Outcome,
    justification_hash: &DataHash,
) -> [u8; 32] {
    digest(
        "emergency_override",
        &[
            nonce.to_string(),
            event_id.to_hex(),
            forced_outcome.to_string(),
            justification_hash.to_hex(),
        ],
    )
}
