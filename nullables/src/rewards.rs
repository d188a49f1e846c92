//! Nullable reward ledger backed by a finite treasury.

use civic_gateway::RewardLedger;
use civic_types::{AccountId, TokenAmount};
use std::collections::HashMap;
use std::sync::Mutex;

struct Inner {
    treasury: TokenAmount,
    balances: HashMap<AccountId, TokenAmount>,
    transfers: usize,
}

/// Pays rewards out of a treasury and refuses once it runs dry.
pub struct NullRewardLedger {
    inner: Mutex<Inner>,
}

impl NullRewardLedger {
    pub fn new(treasury: TokenAmount) -> Self {
        Self {
            inner: Mutex::new(Inner {
                treasury,
                balances: HashMap::new(),
                transfers: 0,
            }),
        }
    }

    pub fn treasury(&self) -> TokenAmount {
        self.inner.lock().unwrap().treasury
    }

    pub fn balance(&self, who: &AccountId) -> TokenAmount {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(who)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Number of accepted transfers.
    pub fn transfer_count(&self) -> usize {
        self.inner.lock().unwrap().transfers
    }

    pub fn refill(&self, amount: TokenAmount) {
        let mut inner = self.inner.lock().unwrap();
        inner.treasury = inner.treasury.saturating_add(amount);
    }
}

impl RewardLedger for NullRewardLedger {
    fn transfer(&self, to: &AccountId, amount: TokenAmount) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let Some(rest) = inner.treasury.checked_sub(amount) else {
            return false;
        };
        inner.treasury = rest;
        let balance = inner.balances.entry(to.clone()).or_insert(TokenAmount::ZERO);
        *balance = balance.saturating_add(amount);
        inner.transfers += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_overdraft() {
        let ledger = NullRewardLedger::new(TokenAmount::new(10));
        let alice = AccountId::new("alice");
        assert!(ledger.transfer(&alice, TokenAmount::new(7)));
        assert!(!ledger.transfer(&alice, TokenAmount::new(7)));
        assert_eq!(ledger.balance(&alice), TokenAmount::new(7));
        assert_eq!(ledger.treasury(), TokenAmount::new(3));
        assert_eq!(ledger.transfer_count(), 1);

        ledger.refill(TokenAmount::new(4));
        assert!(ledger.transfer(&alice, TokenAmount::new(7)));
    }
}
