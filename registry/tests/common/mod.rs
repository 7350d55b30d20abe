#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use oracle_registry::{
    Caller, DataHash, Ed25519Verifier, EventId, Identity, ManualClock, MemoryEventLog, Registry,
    RegistryConfig, TrustedTransportVerifier,
};

pub const START: u64 = 1_700_000_000;

pub fn id(byte: u8) -> Identity {
    Identity::from_bytes([byte; 32])
}

pub fn event(byte: u8) -> EventId {
    EventId::from_bytes([byte; 32])
}

pub fn evidence() -> DataHash {
    DataHash::from_bytes([0xee; 32])
}

pub const ADMIN: u8 = 0xad;

/// Caller whose identity is trusted by `TrustedTransportVerifier`.
pub fn caller(byte: u8) -> Caller {
    Caller::new(id(byte), Vec::new())
}

pub fn admin() -> Caller {
    caller(ADMIN)
}

pub fn registry(required_consensus: u32) -> (Registry, ManualClock) {
    registry_with(RegistryConfig {
        required_consensus,
        ..Default::default()
    })
}

pub fn registry_with(config: RegistryConfig) -> (Registry, ManualClock) {
    let clock = ManualClock::new(START);
    let registry = Registry::initialize(
        id(ADMIN),
        config,
        Box::new(TrustedTransportVerifier),
        Box::new(clock.clone()),
        MemoryEventLog::new(),
    )
    .expect("valid config");
    (registry, clock)
}

/// Registry with the given oracles already registered.
pub fn registry_with_oracles(required_consensus: u32, oracles: &[u8]) -> (Registry, ManualClock) {
    let (mut registry, clock) = registry(required_consensus);
    for &oracle in oracles {
        registry
            .register_oracle(&admin(), id(oracle), &format!("oracle-{oracle}"))
            .expect("register");
    }
    (registry, clock)
}

pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn identity_of(key: &SigningKey) -> Identity {
    Identity::from_bytes(key.verifying_key().to_bytes())
}

/// Registry that checks real Ed25519 signatures, administered by `admin_key`.
pub fn signed_registry(admin_key: &SigningKey, required_consensus: u32) -> (Registry, ManualClock) {
    let clock = ManualClock::new(START);
    let registry = Registry::initialize(
        identity_of(admin_key),
        RegistryConfig {
            required_consensus,
            ..Default::default()
        },
        Box::new(Ed25519Verifier),
        Box::new(clock.clone()),
        MemoryEventLog::new(),
    )
    .expect("valid config");
    (registry, clock)
}
