//! Capability sets: role membership keyed by account identity.
//!
//! Every privileged operation begins with a membership check against one of
//! these sets. The set itself does not know who may mutate it; the owning
//! component guards `grant`/`revoke` with its own controller check.

use crate::address::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set of identities holding one capability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    members: BTreeSet<AccountId>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Returns `true` if the set changed.
    pub fn grant(&mut self, who: AccountId) -> bool {
        self.members.insert(who)
    }

    /// Remove a member. Returns `true` if the set changed.
    pub fn revoke(&mut self, who: &AccountId) -> bool {
        self.members.remove(who)
    }

    pub fn contains(&self, who: &AccountId) -> bool {
        self.members.contains(who)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.members.iter()
    }
}

impl FromIterator<AccountId> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = AccountId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_and_revoke_report_changes() {
        let mut set = CapabilitySet::new();
        let a = AccountId::new("a");
        assert!(set.grant(a.clone()));
        assert!(!set.grant(a.clone()));
        assert!(set.contains(&a));
        assert!(set.revoke(&a));
        assert!(!set.revoke(&a));
        assert!(set.is_empty());
    }
}
