//! Civic action records and delivery proofs.

use civic_types::{AccountId, ActionKind, ClaimId, ContextHash, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a claim. A claim with no record is implicitly non-existent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Recorded by an eligible actor, awaiting operator verification.
    Submitted,
    /// Verified by an operator. Terminal.
    Verified,
}

/// Receipt that a message reached its recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryProof {
    /// Identifier the delivery service assigned to the message.
    pub message_id: String,
    /// Opaque receipt bytes from the delivery service.
    pub proof: Vec<u8>,
    /// Identifier of the office or representative that received it.
    pub recipient_id: String,
    pub delivered_at: Timestamp,
}

impl DeliveryProof {
    /// Structural checks only; the receipt bytes are not interpreted.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.message_id.trim().is_empty() {
            return Err("empty message id");
        }
        if self.recipient_id.trim().is_empty() {
            return Err("empty recipient id");
        }
        if self.delivered_at == Timestamp::EPOCH {
            return Err("delivery time must be positive");
        }
        Ok(())
    }
}

/// The stored record of one civic action claim. Never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivicActionRecord {
    pub claim: ClaimId,
    pub actor: AccountId,
    pub kind: ActionKind,
    pub context: ContextHash,
    pub metadata: Vec<u8>,
    pub submitted_at: Timestamp,
    pub status: ClaimStatus,
    pub verified_at: Option<Timestamp>,
    pub verified_by: Option<AccountId>,
    /// Present only for kinds that require one, once verified.
    pub delivery_proof: Option<DeliveryProof>,
    /// Operator-supplied supporting evidence, stored as given.
    pub additional_proof: Vec<u8>,
}

impl CivicActionRecord {
    pub fn is_verified(&self) -> bool {
        self.status == ClaimStatus::Verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> DeliveryProof {
        DeliveryProof {
            message_id: "msg-1".into(),
            proof: vec![1, 2, 3],
            recipient_id: "house-ca-12".into(),
            delivered_at: Timestamp::new(1_000),
        }
    }

    #[test]
    fn well_formed_proof_passes() {
        assert!(proof().validate().is_ok());
    }

    #[test]
    fn missing_fields_fail() {
        let mut p = proof();
        p.message_id = " ".into();
        assert_eq!(p.validate(), Err("empty message id"));

        let mut p = proof();
        p.recipient_id = String::new();
        assert_eq!(p.validate(), Err("empty recipient id"));

        let mut p = proof();
        p.delivered_at = Timestamp::EPOCH;
        assert_eq!(p.validate(), Err("delivery time must be positive"));
    }
}
