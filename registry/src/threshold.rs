//! Consensus threshold calculation.

use crate::error::{RegistryError, Result};

/// Live threshold for the given membership: `min(oracle_count,
/// required_consensus)`, which is zero once no oracle is active.
pub fn recompute(oracle_count: u32, required_consensus: u32) -> u32 {
    oracle_count.min(required_consensus)
}

/// The bar a value must reach for quorum, or `NoQuorumPossible` when the
/// threshold collapsed to zero.
pub fn quorum_bar(effective_threshold: u32) -> Result<u32> {
    if effective_threshold == 0 {
        return Err(RegistryError::NoQuorumPossible);
    }
    Ok(effective_threshold)
}
