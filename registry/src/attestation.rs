//! Attestation gate.
//!
//! Accepts at most one attestation per oracle per event from active members,
//! and decides quorum against the threshold that is live at submission time.
//! A deregistration in the middle of a round can therefore lower the bar for
//! the next submission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::Caller;
use crate::env::Env;
use crate::error::{RegistryError, Result};
use crate::events::{emit, EventRecord, RegistryEvent};
use crate::membership::authorize_admin;
use crate::message;
use crate::state::RegistryState;
use crate::threshold;
use crate::types::{count_u32, DataHash, EventId, Identity, Outcome, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub oracle: Identity,
    pub outcome: Outcome,
    pub data_hash: DataHash,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Resolved { outcome: Outcome },
    Expired,
    Overridden { outcome: Outcome },
}

impl RoundStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Resolved { outcome } | Self::Overridden { outcome } => Some(*outcome),
            Self::Open | Self::Expired => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRound {
    pub event_id: EventId,
    pub attestations: BTreeMap<Identity, Attestation>,
    pub status: RoundStatus,
    pub opened_at: Timestamp,
    pub expires_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl AttestationRound {
    pub(crate) fn open(event_id: EventId, now: Timestamp, expires_at: Timestamp) -> Self {
        Self {
            event_id,
            attestations: BTreeMap::new(),
            status: RoundStatus::Open,
            opened_at: now,
            expires_at,
            closed_at: None,
        }
    }

    /// Distinct attesting oracles per outcome.
    pub fn tally(&self) -> BTreeMap<Outcome, u32> {
        let mut tally = BTreeMap::new();
        for attestation in self.attestations.values() {
            *tally.entry(attestation.outcome).or_insert(0u32) += 1;
        }
        tally
    }

    pub fn quorum_reached(&self) -> bool {
        matches!(self.status, RoundStatus::Resolved { .. })
    }

    pub fn attestation_count(&self) -> u32 {
        count_u32(self.attestations.len())
    }

    pub(crate) fn close(&mut self, status: RoundStatus, now: Timestamp) {
        self.status = status;
        self.closed_at = Some(now);
    }
}

/// Result of evaluating a round against the live threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStatus {
    pub reached: bool,
    pub outcome: Option<Outcome>,
    pub threshold: u32,
    pub tally: BTreeMap<Outcome, u32>,
    pub status: RoundStatus,
}

/// Outcome that has quorum: its count meets `threshold` and is strictly
/// ahead of every other outcome. Ties stay unresolved.
pub fn leading_outcome(tally: &BTreeMap<Outcome, u32>, threshold: u32) -> Option<Outcome> {
    if threshold == 0 {
        return None;
    }

    let mut best: Option<(Outcome, u32)> = None;
    let mut tied = false;
    for (&outcome, &count) in tally {
        match best {
            Some((_, best_count)) if count == best_count => tied = true,
            Some((_, best_count)) if count < best_count => {}
            _ => {
                best = Some((outcome, count));
                tied = false;
            }
        }
    }

    match best {
        Some((outcome, count)) if !tied && count >= threshold => Some(outcome),
        _ => None,
    }
}

/// Register or move the resolution time of an event. Attestations are
/// rejected before it. Extends an open round's expiry if needed.
///
/// A round that is closed or already past its expiry cannot be rescheduled,
/// even before the sweep has closed it. Once attestations exist the
/// resolution time cannot move into the future, since those attestations
/// would then predate it.
pub fn schedule_event(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    event_id: EventId,
    resolution_time: Timestamp,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::schedule_event(state.next_sequence, &event_id, resolution_time),
    )?;

    let now = env.now();
    if let Some(round) = state.rounds.get(&event_id) {
        if !round.status.is_open() || now >= round.expires_at {
            return Err(RegistryError::RoundClosed);
        }
        if resolution_time > now && round.attestation_count() > 0 {
            return Err(RegistryError::RoundInProgress {
                attestations: round.attestation_count(),
            });
        }
    }

    let expires_at = resolution_time.saturating_add(state.round_ttl_secs);
    state.schedules.insert(event_id, resolution_time);
    if let Some(round) = state.rounds.get_mut(&event_id) {
        round.expires_at = round.expires_at.max(expires_at);
    }

    info!(%event_id, resolution_time, "event scheduled");
    Ok(emit(
        state,
        env,
        RegistryEvent::EventScheduled {
            event_id,
            resolution_time,
        },
    ))
}

pub fn submit_attestation(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    event_id: EventId,
    outcome: Outcome,
    data_hash: DataHash,
) -> Result<EventRecord> {
    let oracle = caller.signer;
    let signed = message::submit_attestation(&oracle, &event_id, outcome, &data_hash);
    if !env.verifier().verify_oracle(caller, &oracle, &signed) {
        return Err(RegistryError::Unauthorized);
    }
    if !state.oracles.is_active(&oracle) {
        warn!(%oracle, %event_id, "attestation from inactive or unknown oracle rejected");
        return Err(RegistryError::NotAuthorized);
    }
    if outcome >= state.outcome_count {
        return Err(RegistryError::InvalidOutcome {
            outcome,
            outcome_count: state.outcome_count,
        });
    }

    let now = env.now();
    let resolution_time = state.schedule(&event_id);
    if let Some(resolution_time) = resolution_time {
        if now < resolution_time {
            return Err(RegistryError::AttestationTooEarly {
                resolution_time,
                now,
            });
        }
    }

    if let Some(round) = state.rounds.get(&event_id) {
        if !round.status.is_open() || now >= round.expires_at {
            return Err(RegistryError::RoundClosed);
        }
        if round.attestations.contains_key(&oracle) {
            return Err(RegistryError::DuplicateAttestation);
        }
    }

    let bar = threshold::quorum_bar(state.effective_threshold)?;

    let expires_at = resolution_time
        .unwrap_or(now)
        .max(now)
        .saturating_add(state.round_ttl_secs);
    let round = state
        .rounds
        .entry(event_id)
        .or_insert_with(|| AttestationRound::open(event_id, now, expires_at));
    round.attestations.insert(
        oracle,
        Attestation {
            oracle,
            outcome,
            data_hash,
            timestamp: now,
        },
    );

    let attestations = round.attestation_count();
    let event = match leading_outcome(&round.tally(), bar) {
        Some(winner) => {
            round.close(RoundStatus::Resolved { outcome: winner }, now);
            info!(%event_id, outcome = winner, attestations, threshold = bar, "consensus reached");
            RegistryEvent::ConsensusReached {
                event_id,
                outcome: winner,
                oracle,
                attestations,
            }
        }
        None => {
            info!(%event_id, %oracle, outcome, attestations, threshold = bar, "attestation recorded");
            RegistryEvent::AttestationRecorded {
                event_id,
                oracle,
                outcome,
            }
        }
    };

    Ok(emit(state, env, event))
}

/// Evaluate an event without mutating anything. Open rounds are judged
/// against the live threshold.
pub fn check_consensus(state: &RegistryState, event_id: &EventId) -> Result<ConsensusStatus> {
    let Some(round) = state.rounds.get(event_id) else {
        if state.schedules.contains_key(event_id) {
            threshold::quorum_bar(state.effective_threshold)?;
            return Ok(ConsensusStatus {
                reached: false,
                outcome: None,
                threshold: state.effective_threshold,
                tally: BTreeMap::new(),
                status: RoundStatus::Open,
            });
        }
        return Err(RegistryError::UnknownEvent);
    };

    let tally = round.tally();
    if round.status.is_open() {
        let bar = threshold::quorum_bar(state.effective_threshold)?;
        let outcome = leading_outcome(&tally, bar);
        return Ok(ConsensusStatus {
            reached: outcome.is_some(),
            outcome,
            threshold: bar,
            tally,
            status: round.status,
        });
    }

    Ok(ConsensusStatus {
        reached: round.quorum_reached(),
        outcome: round.status.outcome(),
        threshold: state.effective_threshold,
        tally,
        status: round.status,
    })
}

/// Close every open round whose expiry has passed. One `RoundExpired` event
/// per closed round.
pub fn expire_rounds(state: &mut RegistryState, env: &mut Env<'_>) -> Vec<EventRecord> {
    let now = env.now();
    let due: Vec<EventId> = state
        .rounds
        .values()
        .filter(|round| round.status.is_open() && round.expires_at <= now)
        .map(|round| round.event_id)
        .collect();

    let mut records = Vec::with_capacity(due.len());
    for event_id in due {
        let Some(round) = state.rounds.get_mut(&event_id) else {
            continue;
        };
        round.close(RoundStatus::Expired, now);
        let attestations = round.attestation_count();
        warn!(%event_id, attestations, "attestation round expired without quorum");
        records.push(emit(
            state,
            env,
            RegistryEvent::RoundExpired {
                event_id,
                attestations,
            },
        ));
    }
    records
}

pub fn attestation<'a>(
    state: &'a RegistryState,
    event_id: &EventId,
    oracle: &Identity,
) -> Option<&'a Attestation> {
    state.rounds.get(event_id)?.attestations.get(oracle)
}

pub fn attestations<'a>(state: &'a RegistryState, event_id: &EventId) -> Vec<&'a Attestation> {
    state
        .rounds
        .get(event_id)
        .map(|round| round.attestations.values().collect())
        .unwrap_or_default()
}

/// Final outcome of a closed round, if it has one.
pub fn consensus_result(state: &RegistryState, event_id: &EventId) -> Option<Outcome> {
    state.rounds.get(event_id)?.status.outcome()
}
