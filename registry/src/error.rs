//! Registry error taxonomy.
//!
//! Every variant is terminal for the call that produced it: the state is left
//! untouched and no event is emitted. Retrying is the caller's job.

use thiserror::Error;

use crate::types::{Outcome, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Bad or missing admin/oracle signature, or signer outside the admin set.
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    /// Submitting oracle has no record or its record is inactive.
    #[error("oracle is not an active member of the registry")]
    NotAuthorized,

    #[error("oracle is not registered")]
    NotRegistered,

    #[error("oracle is already registered")]
    AlreadyRegistered,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("oracle already attested this event")]
    DuplicateAttestation,

    /// No active oracles remain, so the live threshold is zero.
    #[error("no quorum possible: registry has no active oracles")]
    NoQuorumPossible,

    #[error("maximum oracle limit of {max} reached")]
    OracleLimitReached { max: u32 },

    #[error("invalid outcome {outcome}: expected a value below {outcome_count}")]
    InvalidOutcome { outcome: Outcome, outcome_count: u32 },

    #[error("cannot attest before resolution time {resolution_time} (now {now})")]
    AttestationTooEarly {
        resolution_time: Timestamp,
        now: Timestamp,
    },

    #[error("attestation round is closed")]
    RoundClosed,

    /// Resolution time cannot move past attestations already recorded.
    #[error("round already holds {attestations} attestations")]
    RoundInProgress { attestations: u32 },

    #[error("event is not known to the registry")]
    UnknownEvent,

    #[error("admin signer already exists")]
    AdminAlreadyExists,

    #[error("insufficient approvers: {provided} provided, {required} required")]
    InsufficientApprovers { required: u32, provided: u32 },

    #[error("duplicate approver in override request")]
    DuplicateApprover,

    #[error("override cooldown not elapsed: {remaining_secs}s remaining")]
    OverrideCooldown { remaining_secs: u64 },
}

impl RegistryError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
