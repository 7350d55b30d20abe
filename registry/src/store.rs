//! Oracle record store.
//!
//! Records are never removed. Deregistration only flips `active`, and a later
//! registration of the same identity re-activates the existing record so its
//! history stays in one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Identity, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRecord {
    pub identity: Identity,
    pub name: String,
    pub active: bool,
    /// First registration; kept across re-activations.
    pub registered_at: Timestamp,
    pub last_activated_at: Timestamp,
    pub last_deregistered_at: Option<Timestamp>,
    /// Number of times the record has been (re)activated.
    pub activations: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleStore {
    records: BTreeMap<Identity, OracleRecord>,
}

impl OracleStore {
    pub fn get(&self, identity: &Identity) -> Option<&OracleRecord> {
        self.records.get(identity)
    }

    pub fn is_active(&self, identity: &Identity) -> bool {
        self.records
            .get(identity)
            .map(|record| record.active)
            .unwrap_or(false)
    }

    /// All records, active or not, ordered by identity.
    pub fn iter(&self) -> impl Iterator<Item = &OracleRecord> {
        self.records.values()
    }

    /// Active records ordered by identity.
    pub fn active(&self) -> impl Iterator<Item = &OracleRecord> {
        self.records.values().filter(|record| record.active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create the record or re-activate the existing one. Returns `true` when
    /// an existing record was re-activated.
    pub(crate) fn activate(&mut self, identity: Identity, name: String, now: Timestamp) -> bool {
        match self.records.get_mut(&identity) {
            Some(record) => {
                record.active = true;
                record.name = name;
                record.last_activated_at = now;
                record.activations = record.activations.saturating_add(1);
                true
            }
            None => {
                self.records.insert(
                    identity,
                    OracleRecord {
                        identity,
                        name,
                        active: true,
                        registered_at: now,
                        last_activated_at: now,
                        last_deregistered_at: None,
                        activations: 1,
                    },
                );
                false
            }
        }
    }

    /// Mark the record inactive. Returns `false` when there was no active
    /// record to deactivate.
    pub(crate) fn deactivate(&mut self, identity: &Identity, now: Timestamp) -> bool {
        match self.records.get_mut(identity) {
            Some(record) if record.active => {
                record.active = false;
                record.last_deregistered_at = Some(now);
                true
            }
            _ => false,
        }
    }
}
