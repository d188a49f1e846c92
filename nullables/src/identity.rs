//! Nullable identity provider.

use civic_types::{AccountId, IdentityAttribute, Timestamp};
use civic_verification::{Attestation, IdentityProvider};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

struct Enrollment {
    eligible: bool,
    attributes: BTreeSet<IdentityAttribute>,
    expires_at: Timestamp,
}

/// An in-memory identity provider. Unknown actors are ineligible.
#[derive(Default)]
pub struct NullIdentityProvider {
    actors: Mutex<HashMap<AccountId, Enrollment>>,
}

impl NullIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll an eligible actor holding every attribute, attested until `expires_at`.
    pub fn register(&self, actor: &AccountId, expires_at: Timestamp) {
        self.register_with(actor, &IdentityAttribute::ALL, expires_at);
    }

    /// Enroll an eligible actor holding only `attributes`.
    pub fn register_with(
        &self,
        actor: &AccountId,
        attributes: &[IdentityAttribute],
        expires_at: Timestamp,
    ) {
        self.actors.lock().unwrap().insert(
            actor.clone(),
            Enrollment {
                eligible: true,
                attributes: attributes.iter().copied().collect(),
                expires_at,
            },
        );
    }

    /// Make an enrolled actor fail the eligibility predicate.
    pub fn revoke_eligibility(&self, actor: &AccountId) {
        if let Some(e) = self.actors.lock().unwrap().get_mut(actor) {
            e.eligible = false;
        }
    }

    /// Move an actor's attestation expiry.
    pub fn expire(&self, actor: &AccountId, at: Timestamp) {
        if let Some(e) = self.actors.lock().unwrap().get_mut(actor) {
            e.expires_at = at;
        }
    }
}

impl IdentityProvider for NullIdentityProvider {
    fn is_eligible(&self, actor: &AccountId) -> bool {
        self.actors
            .lock()
            .unwrap()
            .get(actor)
            .is_some_and(|e| e.eligible)
    }

    fn verify_attribute(&self, actor: &AccountId, attribute: IdentityAttribute) -> bool {
        self.actors
            .lock()
            .unwrap()
            .get(actor)
            .is_some_and(|e| e.attributes.contains(&attribute))
    }

    fn attestation(&self, actor: &AccountId) -> Attestation {
        self.actors
            .lock()
            .unwrap()
            .get(actor)
            .map(|e| Attestation {
                verified: true,
                expires_at: e.expires_at,
            })
            .unwrap_or(Attestation::NONE)
    }

    /// Deterministic stand-in: a hash over the actor and the disclosed attributes.
    fn issue_selective_proof(&self, actor: &AccountId, attributes: &[IdentityAttribute]) -> Vec<u8> {
        let codes: Vec<u8> = attributes.iter().map(|a| a.code()).collect();
        civic_crypto::blake2b_256_multi(&[actor.as_str().as_bytes(), &codes]).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_actor_is_ineligible() {
        let idp = NullIdentityProvider::new();
        let bob = AccountId::new("bob");
        assert!(!idp.is_eligible(&bob));
        assert_eq!(idp.attestation(&bob), Attestation::NONE);
    }

    #[test]
    fn partial_attributes() {
        let idp = NullIdentityProvider::new();
        let alice = AccountId::new("alice");
        idp.register_with(&alice, &[IdentityAttribute::Adult], Timestamp::new(10));
        assert!(idp.is_eligible(&alice));
        assert!(idp.verify_attribute(&alice, IdentityAttribute::Adult));
        assert!(!idp.verify_attribute(&alice, IdentityAttribute::Citizen));
    }

    #[test]
    fn expire_moves_the_window() {
        let idp = NullIdentityProvider::new();
        let alice = AccountId::new("alice");
        idp.register(&alice, Timestamp::new(1_000));
        idp.expire(&alice, Timestamp::new(5));
        assert!(!idp.attestation(&alice).is_valid_at(Timestamp::new(5)));
    }
}
