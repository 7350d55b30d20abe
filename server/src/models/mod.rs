//! Request and response models for the registry API

use oracle_registry::{Caller, DataHash, EventId, Identity};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A signer and its hex Ed25519 signature over the operation's canonical
/// message.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Approval {
    #[validate(length(equal = 64))]
    pub signer: String,
    #[validate(length(equal = 128))]
    pub signature: String,
}

impl Approval {
    pub fn to_caller(&self) -> Result<Caller, String> {
        let signer = parse_identity(&self.signer)?;
        let signature =
            hex::decode(self.signature.trim()).map_err(|e| format!("invalid signature: {}", e))?;
        Ok(Caller::new(signer, signature))
    }
}

pub fn parse_identity(value: &str) -> Result<Identity, String> {
    value
        .parse()
        .map_err(|e| format!("invalid identity: {}", e))
}

pub fn parse_event_id(value: &str) -> Result<EventId, String> {
    value
        .parse()
        .map_err(|e| format!("invalid event id: {}", e))
}

pub fn parse_data_hash(value: &str) -> Result<DataHash, String> {
    value
        .parse()
        .map_err(|e| format!("invalid data hash: {}", e))
}

/// Request DTO for registering (or re-activating) an oracle
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterOracleRequest {
    #[validate(length(equal = 64))]
    pub oracle: String,
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate]
    pub approval: Approval,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeregisterOracleRequest {
    #[validate]
    pub approval: Approval,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConsensusRequest {
    pub required_consensus: u32,
    #[validate]
    pub approval: Approval,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSignaturesRequest {
    pub required_signatures: u32,
    #[validate]
    pub approval: Approval,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCooldownRequest {
    pub cooldown_secs: u64,
    #[validate]
    pub approval: Approval,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddAdminRequest {
    #[validate(length(equal = 64))]
    pub admin: String,
    #[validate]
    pub approval: Approval,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleEventRequest {
    pub resolution_time: u64,
    #[validate]
    pub approval: Approval,
}

/// Oracle attestation: the oracle signs its own submission.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttestationRequest {
    #[validate(length(equal = 64))]
    pub oracle: String,
    pub outcome: u32,
    #[validate(length(equal = 64))]
    pub data_hash: String,
    #[validate(length(equal = 128))]
    pub signature: String,
}

impl SubmitAttestationRequest {
    pub fn to_caller(&self) -> Result<Caller, String> {
        Approval {
            signer: self.oracle.clone(),
            signature: self.signature.clone(),
        }
        .to_caller()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmergencyOverrideRequest {
    pub forced_outcome: u32,
    #[validate(length(equal = 64))]
    pub justification_hash: String,
    #[validate(length(min = 1, max = 32))]
    pub approvals: Vec<Approval>,
}

/// Query parameters for listing oracles
#[derive(Debug, Default, Deserialize)]
pub struct ListOraclesQuery {
    pub include_inactive: Option<bool>,
}

pub const DEFAULT_AUDIT_LIMIT: u32 = 100;
pub const MAX_AUDIT_LIMIT: u32 = 1_000;

/// Query parameters for reading the audit log
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub since: Option<u64>,
    pub limit: Option<u32>,
}

impl AuditQuery {
    /// Page size, clamped to `1..=MAX_AUDIT_LIMIT`.
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_AUDIT_LIMIT)
            .clamp(1, MAX_AUDIT_LIMIT) as usize
    }
}
