//! Multi-signature emergency override of an event's outcome.
//!
//! Used when a round cannot reach quorum or the oracle set is known to be
//! compromised. Needs `required_signatures` distinct admin approvals and
//! respects a cooldown between overrides.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::attestation::{AttestationRound, RoundStatus};
use crate::auth::Caller;
use crate::env::Env;
use crate::error::{RegistryError, Result};
use crate::events::{emit, EventRecord, RegistryEvent};
use crate::message;
use crate::state::RegistryState;
use crate::types::{count_u32, DataHash, EventId, Identity, Outcome, Timestamp};

/// Permanent audit record of an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub event_id: EventId,
    pub forced_outcome: Outcome,
    pub justification_hash: DataHash,
    pub approvers: Vec<Identity>,
    pub timestamp: Timestamp,
}

pub fn emergency_override(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    approvals: &[Caller],
    event_id: EventId,
    forced_outcome: Outcome,
    justification_hash: DataHash,
) -> Result<EventRecord> {
    if forced_outcome >= state.outcome_count {
        return Err(RegistryError::InvalidOutcome {
            outcome: forced_outcome,
            outcome_count: state.outcome_count,
        });
    }

    let provided = count_u32(approvals.len());
    if provided < state.required_signatures {
        return Err(RegistryError::InsufficientApprovers {
            required: state.required_signatures,
            provided,
        });
    }

    let signed = message::emergency_override(
        state.next_sequence,
        &event_id,
        forced_outcome,
        &justification_hash,
    );
    for approval in approvals {
        if !state.is_admin(&approval.signer) || !env.verifier().verify_admin(approval, &signed) {
            return Err(RegistryError::Unauthorized);
        }
    }

    let distinct: BTreeSet<Identity> = approvals.iter().map(|approval| approval.signer).collect();
    if distinct.len() != approvals.len() {
        return Err(RegistryError::DuplicateApprover);
    }

    let now = env.now();
    if let Some(last) = state.last_override_at {
        let elapsed = now.saturating_sub(last);
        if elapsed < state.override_cooldown_secs {
            return Err(RegistryError::OverrideCooldown {
                remaining_secs: state.override_cooldown_secs - elapsed,
            });
        }
    }

    if !state.is_known_event(&event_id) {
        return Err(RegistryError::UnknownEvent);
    }

    let approvers: Vec<Identity> = approvals.iter().map(|approval| approval.signer).collect();
    state
        .rounds
        .entry(event_id)
        .or_insert_with(|| AttestationRound::open(event_id, now, now))
        .close(
            RoundStatus::Overridden {
                outcome: forced_outcome,
            },
            now,
        );
    state.overrides.insert(
        event_id,
        OverrideRecord {
            event_id,
            forced_outcome,
            justification_hash,
            approvers: approvers.clone(),
            timestamp: now,
        },
    );
    state.last_override_at = Some(now);

    warn!(
        %event_id,
        forced_outcome,
        approvers = approvers.len(),
        justification = %justification_hash,
        "emergency override applied"
    );

    Ok(emit(
        state,
        env,
        RegistryEvent::EmergencyOverride {
            event_id,
            forced_outcome,
            justification_hash,
            approvers,
        },
    ))
}

pub fn is_manual_override(state: &RegistryState, event_id: &EventId) -> bool {
    state.overrides.contains_key(event_id)
}
