//! Owner of one registry state and the capabilities its calls run against.

use tracing::{debug, warn};

use crate::attestation::{self, Attestation, AttestationRound, ConsensusStatus};
use crate::auth::{AuthVerifier, Caller};
use crate::config::RegistryConfig;
use crate::emergency::{self, OverrideRecord};
use crate::env::{Clock, Env};
use crate::error::Result;
use crate::events::{EventRecord, EventSink, MemoryEventLog};
use crate::membership;
use crate::state::RegistryState;
use crate::store::OracleRecord;
use crate::types::{DataHash, EventId, Identity, Outcome, Timestamp};

/// A registry bound to its verifier, clock and event sink.
///
/// Methods take `&mut self`, so holders decide how calls are serialized
/// (the host service wraps it in a single mutex).
pub struct Registry<S: EventSink = MemoryEventLog> {
    state: RegistryState,
    verifier: Box<dyn AuthVerifier>,
    clock: Box<dyn Clock>,
    events: S,
}

impl<S: EventSink> Registry<S> {
    pub fn initialize(
        admin: Identity,
        config: RegistryConfig,
        verifier: Box<dyn AuthVerifier>,
        clock: Box<dyn Clock>,
        mut events: S,
    ) -> Result<Self> {
        let state = {
            let mut env = Env::new(verifier.as_ref(), clock.as_ref(), &mut events);
            membership::initialize(admin, config, &mut env)?
        };
        Ok(Self {
            state,
            verifier,
            clock,
            events,
        })
    }

    fn call<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut RegistryState, &mut Env<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut env = Env::new(self.verifier.as_ref(), self.clock.as_ref(), &mut self.events);
        op(&mut self.state, &mut env).map_err(|err| {
            warn!(operation, error = %err, "registry call rejected");
            err
        })
    }

    pub fn register_oracle(
        &mut self,
        caller: &Caller,
        oracle: Identity,
        name: &str,
    ) -> Result<EventRecord> {
        self.call("register_oracle", |state, env| {
            membership::register_oracle(state, env, caller, oracle, name)
        })
    }

    pub fn deregister_oracle(&mut self, caller: &Caller, oracle: Identity) -> Result<EventRecord> {
        self.call("deregister_oracle", |state, env| {
            membership::deregister_oracle(state, env, caller, oracle)
        })
    }

    pub fn set_required_consensus(&mut self, caller: &Caller, n: u32) -> Result<EventRecord> {
        self.call("set_required_consensus", |state, env| {
            membership::set_required_consensus(state, env, caller, n)
        })
    }

    pub fn add_admin_signer(&mut self, caller: &Caller, new_admin: Identity) -> Result<EventRecord> {
        self.call("add_admin_signer", |state, env| {
            membership::add_admin_signer(state, env, caller, new_admin)
        })
    }

    pub fn set_required_signatures(&mut self, caller: &Caller, n: u32) -> Result<EventRecord> {
        self.call("set_required_signatures", |state, env| {
            membership::set_required_signatures(state, env, caller, n)
        })
    }

    pub fn set_override_cooldown(&mut self, caller: &Caller, secs: u64) -> Result<EventRecord> {
        self.call("set_override_cooldown", |state, env| {
            membership::set_override_cooldown(state, env, caller, secs)
        })
    }

    pub fn schedule_event(
        &mut self,
        caller: &Caller,
        event_id: EventId,
        resolution_time: Timestamp,
    ) -> Result<EventRecord> {
        self.call("schedule_event", |state, env| {
            attestation::schedule_event(state, env, caller, event_id, resolution_time)
        })
    }

    pub fn submit_attestation(
        &mut self,
        caller: &Caller,
        event_id: EventId,
        outcome: Outcome,
        data_hash: DataHash,
    ) -> Result<EventRecord> {
        self.call("submit_attestation", |state, env| {
            attestation::submit_attestation(state, env, caller, event_id, outcome, data_hash)
        })
    }

    pub fn emergency_override(
        &mut self,
        approvals: &[Caller],
        event_id: EventId,
        forced_outcome: Outcome,
        justification_hash: DataHash,
    ) -> Result<EventRecord> {
        self.call("emergency_override", |state, env| {
            emergency::emergency_override(
                state,
                env,
                approvals,
                event_id,
                forced_outcome,
                justification_hash,
            )
        })
    }

    pub fn expire_rounds(&mut self) -> Vec<EventRecord> {
        let mut env = Env::new(self.verifier.as_ref(), self.clock.as_ref(), &mut self.events);
        attestation::expire_rounds(&mut self.state, &mut env)
    }

    pub fn check_consensus(&self, event_id: &EventId) -> Result<ConsensusStatus> {
        debug!(%event_id, "consensus queried");
        attestation::check_consensus(&self.state, event_id)
    }

    pub fn oracle(&self, identity: &Identity) -> Option<&OracleRecord> {
        self.state.oracles().get(identity)
    }

    pub fn active_oracles(&self) -> Vec<&OracleRecord> {
        self.state.oracles().active().collect()
    }

    pub fn round(&self, event_id: &EventId) -> Option<&AttestationRound> {
        self.state.round(event_id)
    }

    pub fn attestation(&self, event_id: &EventId, oracle: &Identity) -> Option<&Attestation> {
        attestation::attestation(&self.state, event_id, oracle)
    }

    pub fn attestations(&self, event_id: &EventId) -> Vec<&Attestation> {
        attestation::attestations(&self.state, event_id)
    }

    pub fn consensus_result(&self, event_id: &EventId) -> Option<Outcome> {
        attestation::consensus_result(&self.state, event_id)
    }

    pub fn override_record(&self, event_id: &EventId) -> Option<&OverrideRecord> {
        self.state.override_record(event_id)
    }

    pub fn is_manual_override(&self, event_id: &EventId) -> bool {
        emergency::is_manual_override(&self.state, event_id)
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn events(&self) -> &S {
        &self.events
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
