//! The delegation ledger
//!
//! Entries are keyed by (principal, agent) in a sharded concurrent map.
//! [`DelegationLedger::commit`] re-evaluates capacity while holding the
//! entry's write guard, so two racing commits on one key serialize and the
//! second sees the first one's spend.

use a2p_types::{Amount, PrincipalId, SubjectId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{DelegationError, Result};

/// Ledger key: who delegated to whom
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DelegationKey {
    pub principal_id: PrincipalId,
    pub agent_id: SubjectId,
}

impl DelegationKey {
    pub fn new(principal_id: impl Into<PrincipalId>, agent_id: impl Into<SubjectId>) -> Self {
        Self {
            principal_id: principal_id.into(),
            agent_id: agent_id.into(),
        }
    }
}

impl std::fmt::Display for DelegationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.principal_id, self.agent_id)
    }
}

/// A spending delegation from a principal to an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationEntry {
    pub limit: Amount,
    pub spent: Amount,
    pub active: bool,
}

impl DelegationEntry {
    fn new(limit: Amount) -> Self {
        Self {
            limit,
            spent: Amount::zero(),
            active: true,
        }
    }

    /// Headroom left under the limit
    pub fn available(&self) -> Amount {
        self.limit.saturating_sub(self.spent)
    }

    /// Capacity check for `amount`, returning the headroom on success
    pub fn check(&self, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Err(DelegationError::InvalidAmount);
        }
        if !self.active {
            return Err(DelegationError::Inactive);
        }
        let available = self.available();
        if amount > available {
            return Err(DelegationError::Exceeds {
                requested: amount,
                available,
            });
        }
        Ok(available)
    }
}

/// The delegation ledger
#[derive(Debug, Default)]
pub struct DelegationLedger {
    entries: DashMap<DelegationKey, DelegationEntry>,
}

impl DelegationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `agent_id` a spending cap on behalf of `principal_id`.
    ///
    /// Replaces any previous delegation for the pair, resetting spend to zero.
    pub fn create(
        &self,
        principal_id: impl Into<PrincipalId>,
        agent_id: impl Into<SubjectId>,
        limit: Amount,
    ) -> Result<DelegationEntry> {
        if limit.is_zero() {
            return Err(DelegationError::InvalidLimit);
        }

        let key = DelegationKey::new(principal_id, agent_id);
        let entry = DelegationEntry::new(limit);
        let previous = self.entries.insert(key.clone(), entry.clone());

        info!(
            delegation = %key,
            limit = %limit,
            replaced = previous.is_some(),
            "Delegation created"
        );
        Ok(entry)
    }

    /// Check whether `amount` fits under the delegation. Never mutates.
    ///
    /// On success returns the current headroom.
    pub fn check_capacity(
        &self,
        principal_id: &PrincipalId,
        agent_id: &SubjectId,
        amount: Amount,
    ) -> Result<Amount> {
        let key = DelegationKey::new(principal_id.clone(), agent_id.clone());
        let result = match self.entries.get(&key) {
            Some(entry) => entry.check(amount),
            None => Err(DelegationError::NotFound),
        };
        debug!(delegation = %key, amount = %amount, ok = result.is_ok(), "Capacity checked");
        result
    }

    /// Check capacity and record the spend as one atomic step.
    ///
    /// Returns the entry as it stands after the commit. On error nothing
    /// is recorded.
    pub fn commit(
        &self,
        principal_id: &PrincipalId,
        agent_id: &SubjectId,
        amount: Amount,
    ) -> Result<DelegationEntry> {
        let key = DelegationKey::new(principal_id.clone(), agent_id.clone());
        let mut entry = self
            .entries
            .get_mut(&key)
            .ok_or(DelegationError::NotFound)?;

        let available = entry.check(amount)?;
        // spent + amount, computed from the headroom so it stays within limit
        entry.spent = entry.limit.saturating_sub(available.saturating_sub(amount));

        debug!(
            delegation = %key,
            amount = %amount,
            spent = %entry.spent,
            limit = %entry.limit,
            "Spend committed"
        );
        Ok(entry.clone())
    }

    /// Deactivate a delegation. Idempotent.
    pub fn revoke(&self, principal_id: &PrincipalId, agent_id: &SubjectId) -> Result<()> {
        let key = DelegationKey::new(principal_id.clone(), agent_id.clone());
        let mut entry = self
            .entries
            .get_mut(&key)
            .ok_or(DelegationError::NotFound)?;

        if entry.active {
            entry.active = false;
            info!(delegation = %key, spent = %entry.spent, "Delegation revoked");
        }
        Ok(())
    }

    /// Snapshot of a delegation
    pub fn entry(&self, principal_id: &PrincipalId, agent_id: &SubjectId) -> Option<DelegationEntry> {
        let key = DelegationKey::new(principal_id.clone(), agent_id.clone());
        self.entries.get(&key).map(|e| e.value().clone())
    }

    /// Headroom left, or `None` if no delegation exists
    pub fn remaining(&self, principal_id: &PrincipalId, agent_id: &SubjectId) -> Option<Amount> {
        self.entry(principal_id, agent_id).map(|e| e.available())
    }

    /// All delegations granted by a principal, sorted by agent
    pub fn delegations_of(&self, principal_id: &PrincipalId) -> Vec<(SubjectId, DelegationEntry)> {
        let mut found: Vec<(SubjectId, DelegationEntry)> = self
            .entries
            .iter()
            .filter(|e| &e.key().principal_id == principal_id)
            .map(|e| (e.key().agent_id.clone(), e.value().clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
