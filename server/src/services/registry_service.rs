//! Registry service: serializes access to the single registry instance.

use oracle_registry::{
    Attestation, AttestationRound, AuthVerifier, Caller, Clock, ConsensusStatus, DataHash,
    EventId, EventRecord, Identity, OracleRecord, OverrideRecord, Outcome, Registry,
    RegistryConfig, RegistryError, Timestamp,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::websocket::{BroadcastSink, WsState};

/// Registry-wide counters and settings.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub oracle_count: u32,
    pub required_consensus: u32,
    pub effective_threshold: u32,
    pub max_oracles: u32,
    pub outcome_count: u32,
    pub round_ttl_secs: u64,
    pub admin_signers: Vec<Identity>,
    pub required_signatures: u32,
    pub override_cooldown_secs: u64,
    pub last_override_at: Option<Timestamp>,
    pub next_sequence: u64,
}

/// Everything known about one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    pub event_id: EventId,
    pub resolution_time: Option<Timestamp>,
    pub round: Option<AttestationRound>,
    pub attestations: Vec<Attestation>,
    pub consensus_result: Option<Outcome>,
    pub manual_override: Option<OverrideRecord>,
}

pub struct RegistryService {
    registry: Mutex<Registry<BroadcastSink>>,
}

impl RegistryService {
    pub fn new(
        admin: Identity,
        config: RegistryConfig,
        verifier: Box<dyn AuthVerifier>,
        clock: Box<dyn Clock>,
        ws_state: WsState,
    ) -> Result<Self, RegistryError> {
        let registry = Registry::initialize(
            admin,
            config,
            verifier,
            clock,
            BroadcastSink::new(ws_state),
        )?;
        Ok(Self {
            registry: Mutex::new(registry),
        })
    }

    pub async fn summary(&self) -> RegistrySummary {
        let registry = self.registry.lock().await;
        let state = registry.state();
        RegistrySummary {
            oracle_count: state.oracle_count(),
            required_consensus: state.required_consensus(),
            effective_threshold: state.effective_threshold(),
            max_oracles: state.max_oracles(),
            outcome_count: state.outcome_count(),
            round_ttl_secs: state.round_ttl_secs(),
            admin_signers: state.admin_signers().to_vec(),
            required_signatures: state.required_signatures(),
            override_cooldown_secs: state.override_cooldown_secs(),
            last_override_at: state.last_override_at(),
            next_sequence: state.next_sequence(),
        }
    }

    pub async fn register_oracle(
        &self,
        caller: &Caller,
        oracle: Identity,
        name: &str,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.register_oracle(caller, oracle, name)
    }

    pub async fn deregister_oracle(
        &self,
        caller: &Caller,
        oracle: Identity,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.deregister_oracle(caller, oracle)
    }

    pub async fn set_required_consensus(
        &self,
        caller: &Caller,
        n: u32,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.set_required_consensus(caller, n)
    }

    pub async fn add_admin_signer(
        &self,
        caller: &Caller,
        new_admin: Identity,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.add_admin_signer(caller, new_admin)
    }

    pub async fn set_required_signatures(
        &self,
        caller: &Caller,
        n: u32,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.set_required_signatures(caller, n)
    }

    pub async fn set_override_cooldown(
        &self,
        caller: &Caller,
        secs: u64,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.set_override_cooldown(caller, secs)
    }

    pub async fn schedule_event(
        &self,
        caller: &Caller,
        event_id: EventId,
        resolution_time: Timestamp,
    ) -> Result<EventRecord, RegistryError> {
        self.registry
            .lock()
            .await
            .schedule_event(caller, event_id, resolution_time)
    }

    pub async fn submit_attestation(
        &self,
        caller: &Caller,
        event_id: EventId,
        outcome: Outcome,
        data_hash: DataHash,
    ) -> Result<EventRecord, RegistryError> {
        self.registry
            .lock()
            .await
            .submit_attestation(caller, event_id, outcome, data_hash)
    }

    pub async fn emergency_override(
        &self,
        approvals: &[Caller],
        event_id: EventId,
        forced_outcome: Outcome,
        justification_hash: DataHash,
    ) -> Result<EventRecord, RegistryError> {
        self.registry.lock().await.emergency_override(
            approvals,
            event_id,
            forced_outcome,
            justification_hash,
        )
    }

    /// Close overdue rounds; returns the `RoundExpired` records.
    pub async fn expire_rounds(&self) -> Vec<EventRecord> {
        self.registry.lock().await.expire_rounds()
    }

    pub async fn check_consensus(&self, event_id: &EventId) -> Result<ConsensusStatus, RegistryError> {
        self.registry.lock().await.check_consensus(event_id)
    }

    pub async fn oracle(&self, identity: &Identity) -> Option<OracleRecord> {
        self.registry.lock().await.oracle(identity).cloned()
    }

    /// Active oracles, or every record ever created when `include_inactive`.
    pub async fn list_oracles(&self, include_inactive: bool) -> Vec<OracleRecord> {
        let registry = self.registry.lock().await;
        if include_inactive {
            registry.state().oracles().iter().cloned().collect()
        } else {
            registry.active_oracles().into_iter().cloned().collect()
        }
    }

    pub async fn event_details(&self, event_id: &EventId) -> Option<EventDetails> {
        let registry = self.registry.lock().await;
        let state = registry.state();
        if !state.is_known_event(event_id) {
            return None;
        }
        Some(EventDetails {
            event_id: *event_id,
            resolution_time: state.schedule(event_id),
            round: registry.round(event_id).cloned(),
            attestations: registry
                .attestations(event_id)
                .into_iter()
                .cloned()
                .collect(),
            consensus_result: registry.consensus_result(event_id),
            manual_override: registry.override_record(event_id).cloned(),
        })
    }

    /// At most `limit` audit records with `sequence >= since`, oldest first.
    pub async fn audit_since(&self, since: u64, limit: usize) -> Vec<EventRecord> {
        let registry = self.registry.lock().await;
        registry
            .events()
            .log()
            .since(since)
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }
}
