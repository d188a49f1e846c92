//! The identity-provider seam.
//!
//! The ledger never sees identity documents. It asks the provider yes/no
//! questions about an actor and, when exporting a proof bundle, requests an
//! opaque selective-disclosure proof.

use civic_types::{AccountId, IdentityAttribute, Timestamp};
use serde::{Deserialize, Serialize};

/// An actor's identity attestation as reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub verified: bool,
    pub expires_at: Timestamp,
}

impl Attestation {
    /// The attestation of an actor the provider has never seen.
    pub const NONE: Self = Self {
        verified: false,
        expires_at: Timestamp::EPOCH,
    };

    /// Whether the attestation is verified and `now` is inside its validity window.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.verified && now < self.expires_at
    }
}

/// External identity-attestation provider.
pub trait IdentityProvider: Send + Sync {
    /// Whether the actor passes the provider's overall eligibility predicate.
    fn is_eligible(&self, actor: &AccountId) -> bool;

    /// Whether the actor holds a specific attribute.
    fn verify_attribute(&self, actor: &AccountId, attribute: IdentityAttribute) -> bool;

    /// The actor's current attestation ([`Attestation::NONE`] if unknown).
    fn attestation(&self, actor: &AccountId) -> Attestation;

    /// Mint a selective-disclosure proof revealing only `attributes`.
    fn issue_selective_proof(&self, actor: &AccountId, attributes: &[IdentityAttribute]) -> Vec<u8>;
}
