//! Membership manager: admin-gated registration, deregistration and
//! configuration.
//!
//! Every operation checks all preconditions before touching the state, so a
//! rejected call leaves nothing behind. The threshold is recomputed from the
//! stored count on every change rather than adjusted incrementally.

use tracing::info;

use crate::auth::Caller;
use crate::config::{RegistryConfig, MIN_OVERRIDE_COOLDOWN_SECS};
use crate::env::Env;
use crate::error::{RegistryError, Result};
use crate::events::{emit, EventRecord, RegistryEvent};
use crate::message;
use crate::state::RegistryState;
use crate::threshold;
use crate::types::Identity;

/// Build a fresh registry with `admin` as its only admin signer.
pub fn initialize(
    admin: Identity,
    config: RegistryConfig,
    env: &mut Env<'_>,
) -> Result<RegistryState> {
    config.validate()?;

    let mut state = RegistryState::new(admin, &config);
    recompute_threshold(&mut state);

    emit(
        &mut state,
        env,
        RegistryEvent::Initialized {
            admin,
            required_consensus: config.required_consensus,
            max_oracles: config.max_oracles,
        },
    );
    info!(%admin, required_consensus = config.required_consensus, "oracle registry initialized");

    Ok(state)
}

/// Caller must be in the admin set and prove it for `message`.
pub(crate) fn authorize_admin(
    state: &RegistryState,
    env: &Env<'_>,
    caller: &Caller,
    message: &[u8],
) -> Result<()> {
    if !state.is_admin(&caller.signer) || !env.verifier().verify_admin(caller, message) {
        return Err(RegistryError::Unauthorized);
    }
    Ok(())
}

fn recompute_threshold(state: &mut RegistryState) {
    state.effective_threshold = threshold::recompute(state.oracle_count, state.required_consensus);
}

pub fn register_oracle(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    oracle: Identity,
    name: &str,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::register_oracle(state.next_sequence, &oracle, name),
    )?;

    if state.oracles.is_active(&oracle) {
        return Err(RegistryError::AlreadyRegistered);
    }
    if state.oracle_count >= state.max_oracles {
        return Err(RegistryError::OracleLimitReached {
            max: state.max_oracles,
        });
    }

    let reactivated = state.oracles.activate(oracle, name.to_string(), env.now());
    state.oracle_count = state.oracle_count.saturating_add(1);
    recompute_threshold(state);

    info!(
        %oracle,
        reactivated,
        oracle_count = state.oracle_count,
        effective_threshold = state.effective_threshold,
        "oracle registered"
    );

    let event = RegistryEvent::OracleRegistered {
        oracle,
        name: name.to_string(),
        reactivated,
        oracle_count: state.oracle_count,
        effective_threshold: state.effective_threshold,
    };
    Ok(emit(state, env, event))
}

/// Deactivate an oracle. Its past attestations stay counted in their rounds.
pub fn deregister_oracle(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    oracle: Identity,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::deregister_oracle(state.next_sequence, &oracle),
    )?;

    if !state.oracles.deactivate(&oracle, env.now()) {
        return Err(RegistryError::NotRegistered);
    }
    state.oracle_count = state.oracle_count.saturating_sub(1);
    recompute_threshold(state);

    info!(
        %oracle,
        oracle_count = state.oracle_count,
        effective_threshold = state.effective_threshold,
        "oracle deregistered"
    );

    let event = RegistryEvent::OracleDeregistered {
        oracle,
        oracle_count: state.oracle_count,
        effective_threshold: state.effective_threshold,
    };
    Ok(emit(state, env, event))
}

pub fn set_required_consensus(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    required_consensus: u32,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::set_required_consensus(state.next_sequence, required_consensus),
    )?;

    if required_consensus == 0 {
        return Err(RegistryError::invalid_config(
            "required_consensus must be greater than zero",
        ));
    }

    let old_required = state.required_consensus;
    state.required_consensus = required_consensus;
    recompute_threshold(state);

    info!(
        old_required,
        new_required = required_consensus,
        effective_threshold = state.effective_threshold,
        "required consensus updated"
    );

    let event = RegistryEvent::ConsensusThresholdUpdated {
        old_required,
        new_required: required_consensus,
        effective_threshold: state.effective_threshold,
    };
    Ok(emit(state, env, event))
}

pub fn add_admin_signer(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    new_admin: Identity,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::add_admin_signer(state.next_sequence, &new_admin),
    )?;

    if state.is_admin(&new_admin) {
        return Err(RegistryError::AdminAlreadyExists);
    }
    state.admin_signers.push(new_admin);

    info!(admin = %new_admin, signers = state.admin_signers.len(), "admin signer added");
    Ok(emit(
        state,
        env,
        RegistryEvent::AdminSignerAdded { admin: new_admin },
    ))
}

pub fn set_required_signatures(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    required_signatures: u32,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::set_required_signatures(state.next_sequence, required_signatures),
    )?;

    let signers = state.admin_signers.len();
    if required_signatures == 0 || required_signatures as usize > signers {
        return Err(RegistryError::invalid_config(format!(
            "required_signatures must be between 1 and {signers}"
        )));
    }
    state.required_signatures = required_signatures;

    info!(required_signatures, "required override signatures updated");
    Ok(emit(
        state,
        env,
        RegistryEvent::RequiredSignaturesUpdated {
            required_signatures,
        },
    ))
}

pub fn set_override_cooldown(
    state: &mut RegistryState,
    env: &mut Env<'_>,
    caller: &Caller,
    cooldown_secs: u64,
) -> Result<EventRecord> {
    authorize_admin(
        state,
        env,
        caller,
        &message::set_override_cooldown(state.next_sequence, cooldown_secs),
    )?;

    if cooldown_secs < MIN_OVERRIDE_COOLDOWN_SECS {
        return Err(RegistryError::invalid_config(format!(
            "override cooldown must be at least {MIN_OVERRIDE_COOLDOWN_SECS} seconds"
        )));
    }
    state.override_cooldown_secs = cooldown_secs;

    info!(cooldown_secs, "override cooldown updated");
    Ok(emit(
        state,
        env,
        RegistryEvent::OverrideCooldownUpdated { cooldown_secs },
    ))
}
