//! BoxMeOut Oracle Registry
//!
//! Oracle membership and consensus-threshold state machine used to resolve
//! prediction markets. Admins register and deregister oracles, the live
//! threshold is recomputed on every membership change, and oracles submit at
//! most one attestation per event until a quorum agrees.
//!
//! All state lives in an explicit [`RegistryState`] and every operation gets
//! its capabilities (signature verification, clock, event sink) through an
//! [`Env`]. [`Registry`] bundles the two for hosts.

pub mod attestation;
pub mod auth;
pub mod config;
pub mod emergency;
pub mod env;
pub mod error;
pub mod events;
pub mod membership;
pub mod message;
pub mod registry;
pub mod state;
pub mod store;
pub mod threshold;
pub mod types;

pub use attestation::{Attestation, AttestationRound, ConsensusStatus, RoundStatus};
pub use auth::{AuthVerifier, Caller, Ed25519Verifier, TrustedTransportVerifier};
pub use config::{RegistryConfig, MIN_OVERRIDE_COOLDOWN_SECS};
pub use emergency::OverrideRecord;
pub use env::{Clock, Env, ManualClock, SystemClock};
pub use error::RegistryError;
pub use events::{EventRecord, EventSink, MemoryEventLog, RegistryEvent};
pub use registry::Registry;
pub use state::RegistryState;
pub use store::{OracleRecord, OracleStore};
pub use types::{DataHash, EventId, Identity, Outcome, ParseIdError, Timestamp};
