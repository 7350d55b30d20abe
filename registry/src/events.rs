//! Audit events.
//!
//! Every successful mutation appends exactly one [`EventRecord`] to the
//! injected [`EventSink`]; failed calls append nothing. Sequence numbers start
//! at zero and never skip.

use serde::{Deserialize, Serialize};

use crate::env::Env;
use crate::state::RegistryState;
use crate::types::{DataHash, EventId, Identity, Outcome, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    Initialized {
        admin: Identity,
        required_consensus: u32,
        max_oracles: u32,
    },
    OracleRegistered {
        oracle: Identity,
        name: String,
        reactivated: bool,
        oracle_count: u32,
        effective_threshold: u32,
    },
    OracleDeregistered {
        oracle: Identity,
        oracle_count: u32,
        effective_threshold: u32,
    },
    ConsensusThresholdUpdated {
        old_required: u32,
        new_required: u32,
        effective_threshold: u32,
    },
    AdminSignerAdded {
        admin: Identity,
    },
    RequiredSignaturesUpdated {
        required_signatures: u32,
    },
    OverrideCooldownUpdated {
        cooldown_secs: u64,
    },
    EventScheduled {
        event_id: EventId,
        resolution_time: Timestamp,
    },
    AttestationRecorded {
        event_id: EventId,
        oracle: Identity,
        outcome: Outcome,
    },
    ConsensusReached {
        event_id: EventId,
        outcome: Outcome,
        /// Oracle whose attestation completed the quorum.
        oracle: Identity,
        attestations: u32,
    },
    RoundExpired {
        event_id: EventId,
        attestations: u32,
    },
    EmergencyOverride {
        event_id: EventId,
        forced_outcome: Outcome,
        justification_hash: DataHash,
        approvers: Vec<Identity>,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "Initialized",
            Self::OracleRegistered { .. } => "OracleRegistered",
            Self::OracleDeregistered { .. } => "OracleDeregistered",
            Self::ConsensusThresholdUpdated { .. } => "ConsensusThresholdUpdated",
            Self::AdminSignerAdded { .. } => "AdminSignerAdded",
            Self::RequiredSignaturesUpdated { .. } => "RequiredSignaturesUpdated",
            Self::OverrideCooldownUpdated { .. } => "OverrideCooldownUpdated",
            Self::EventScheduled { .. } => "EventScheduled",
            Self::AttestationRecorded { .. } => "AttestationRecorded",
            Self::ConsensusReached { .. } => "ConsensusReached",
            Self::RoundExpired { .. } => "RoundExpired",
            Self::EmergencyOverride { .. } => "EmergencyOverride",
        }
    }
}

/// Immutable, ordered envelope around an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub event: RegistryEvent,
}

/// Append-only destination for audit records.
pub trait EventSink: Send {
    fn publish(&mut self, record: EventRecord);
}

/// In-process append-only event log.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    records: Vec<EventRecord>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = self.records.partition_point(|record| record.sequence < from);
        &self.records[start..]
    }

    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventSink for MemoryEventLog {
    fn publish(&mut self, record: EventRecord) {
        self.records.push(record);
    }
}

/// Stamp `event` with the next sequence number and the current time, then
/// hand it to the sink.
pub(crate) fn emit(state: &mut RegistryState, env: &mut Env<'_>, event: RegistryEvent) -> EventRecord {
    let record = EventRecord {
        sequence: state.next_sequence,
        timestamp: env.now(),
        event,
    };
    state.next_sequence += 1;
    tracing::debug!(
        sequence = record.sequence,
        event = record.event.name(),
        "registry event emitted"
    );
    env.publish(record.clone());
    record
}
