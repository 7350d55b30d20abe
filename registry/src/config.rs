use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Shortest cooldown an admin may configure between emergency overrides.
pub const MIN_OVERRIDE_COOLDOWN_SECS: u64 = 3_600;

/// Registry parameters fixed at initialization (the consensus target, signer
/// quorum and cooldown can later be changed through admin calls).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Target quorum size configured by the admin.
    pub required_consensus: u32,
    /// Upper bound on simultaneously active oracles.
    pub max_oracles: u32,
    /// Number of valid outcomes; attested values must be below it.
    pub outcome_count: u32,
    /// How long a round stays open after it opens (or after its scheduled
    /// resolution time, whichever is later).
    pub round_ttl_secs: u64,
    /// Admin approvals needed for an emergency override.
    pub required_signatures: u32,
    pub override_cooldown_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            required_consensus: 2,
            max_oracles: 10,
            outcome_count: 2,
            round_ttl_secs: 7 * 24 * 60 * 60,
            required_signatures: 2,
            override_cooldown_secs: 86_400,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.required_consensus == 0 {
            return Err(RegistryError::invalid_config(
                "required_consensus must be greater than zero",
            ));
        }
        if self.max_oracles == 0 {
            return Err(RegistryError::invalid_config(
                "max_oracles must be greater than zero",
            ));
        }
        if self.outcome_count < 2 {
            return Err(RegistryError::invalid_config(
                "outcome_count must be at least 2",
            ));
        }
        if self.round_ttl_secs == 0 {
            return Err(RegistryError::invalid_config(
                "round_ttl_secs must be greater than zero",
            ));
        }
        if self.required_signatures == 0 {
            return Err(RegistryError::invalid_config(
                "required_signatures must be greater than zero",
            ));
        }
        if self.override_cooldown_secs < MIN_OVERRIDE_COOLDOWN_SECS {
            return Err(RegistryError::invalid_config(format!(
                "override_cooldown_secs must be at least {MIN_OVERRIDE_COOLDOWN_SECS}"
            )));
        }
        Ok(())
    }
}
