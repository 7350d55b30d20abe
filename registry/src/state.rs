//! Explicit registry state threaded through every operation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attestation::AttestationRound;
use crate::config::RegistryConfig;
use crate::emergency::OverrideRecord;
use crate::store::OracleStore;
use crate::types::{EventId, Identity, Timestamp};

/// Everything the registry knows. Membership operations own the counters,
/// thresholds, admin settings and oracle records; the attestation gate and
/// the emergency override own the rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    pub(crate) oracles: OracleStore,
    pub(crate) oracle_count: u32,
    pub(crate) required_consensus: u32,
    pub(crate) effective_threshold: u32,

    pub(crate) max_oracles: u32,
    pub(crate) outcome_count: u32,
    pub(crate) round_ttl_secs: u64,

    pub(crate) admin_signers: Vec<Identity>,
    pub(crate) required_signatures: u32,
    pub(crate) override_cooldown_secs: u64,
    pub(crate) last_override_at: Option<Timestamp>,

    pub(crate) schedules: BTreeMap<EventId, Timestamp>,
    pub(crate) rounds: BTreeMap<EventId, AttestationRound>,
    pub(crate) overrides: BTreeMap<EventId, OverrideRecord>,

    pub(crate) next_sequence: u64,
}

impl RegistryState {
    pub(crate) fn new(admin: Identity, config: &RegistryConfig) -> Self {
        Self {
            oracles: OracleStore::default(),
            oracle_count: 0,
            required_consensus: config.required_consensus,
            effective_threshold: 0,
            max_oracles: config.max_oracles,
            outcome_count: config.outcome_count,
            round_ttl_secs: config.round_ttl_secs,
            admin_signers: vec![admin],
            required_signatures: config.required_signatures,
            override_cooldown_secs: config.override_cooldown_secs,
            last_override_at: None,
            schedules: BTreeMap::new(),
            rounds: BTreeMap::new(),
            overrides: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    pub fn oracles(&self) -> &OracleStore {
        &self.oracles
    }

    pub fn oracle_count(&self) -> u32 {
        self.oracle_count
    }

    pub fn required_consensus(&self) -> u32 {
        self.required_consensus
    }

    pub fn effective_threshold(&self) -> u32 {
        self.effective_threshold
    }

    pub fn max_oracles(&self) -> u32 {
        self.max_oracles
    }

    pub fn outcome_count(&self) -> u32 {
        self.outcome_count
    }

    pub fn round_ttl_secs(&self) -> u64 {
        self.round_ttl_secs
    }

    pub fn admin_signers(&self) -> &[Identity] {
        &self.admin_signers
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admin_signers.contains(identity)
    }

    pub fn required_signatures(&self) -> u32 {
        self.required_signatures
    }

    pub fn override_cooldown_secs(&self) -> u64 {
        self.override_cooldown_secs
    }

    pub fn last_override_at(&self) -> Option<Timestamp> {
        self.last_override_at
    }

    pub fn schedule(&self, event_id: &EventId) -> Option<Timestamp> {
        self.schedules.get(event_id).copied()
    }

    pub fn round(&self, event_id: &EventId) -> Option<&AttestationRound> {
        self.rounds.get(event_id)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &AttestationRound> {
        self.rounds.values()
    }

    pub fn override_record(&self, event_id: &EventId) -> Option<&OverrideRecord> {
        self.overrides.get(event_id)
    }

    /// An event is known once it has been scheduled or has a round.
    pub fn is_known_event(&self, event_id: &EventId) -> bool {
        self.schedules.contains_key(event_id) || self.rounds.contains_key(event_id)
    }

    /// Sequence number the next emitted event will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}
