//! Write-once replay protection.
//!
//! Two sets: the action hashes whose effect completed, and the approval
//! claims already spent on an effect. Neither set evicts; an entry, once in,
//! blocks that hash or claim forever.

use civic_types::{ActionHash, ClaimId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSet {
    actions: BTreeSet<ActionHash>,
    consumed: BTreeSet<ClaimId>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processed(&self, action: &ActionHash) -> bool {
        self.actions.contains(action)
    }

    pub fn is_consumed(&self, claim: &ClaimId) -> bool {
        self.consumed.contains(claim)
    }

    /// Mark an approval claim as spent.
    pub fn consume(&mut self, claim: ClaimId) {
        self.consumed.insert(claim);
    }

    /// Mark an action processed and its approval claim spent.
    pub fn mark(&mut self, action: ActionHash, claim: ClaimId) {
        self.actions.insert(action);
        self.consumed.insert(claim);
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }
}
