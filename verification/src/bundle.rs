//! Portable attestation bundles for verified claims.
//!
//! A bundle is the bincode encoding of a [`BundleBody`] plus the issuer's
//! public key and an Ed25519 tag over the Blake2b-256 digest of the encoded
//! body. Downstream systems decode it and call [`ProofBundle::verify_from`]
//! with the issuer key they trust.

use crate::error::VerificationError;
use crate::record::{CivicActionRecord, DeliveryProof};
use civic_types::{AccountId, ActionKind, ClaimId, ContextHash, KeyPair, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// Current bundle format version.
pub const BUNDLE_VERSION: u8 = 1;

/// The attested content of a bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleBody {
    pub version: u8,
    pub claim: ClaimId,
    pub actor: AccountId,
    pub kind: ActionKind,
    pub context: ContextHash,
    pub submitted_at: Timestamp,
    pub verified_at: Timestamp,
    pub delivery_proof: Option<DeliveryProof>,
    /// Selective-disclosure proof minted by the identity provider.
    pub identity_proof: Vec<u8>,
    pub issued_at: Timestamp,
}

impl BundleBody {
    /// Build the body for a verified record. Returns `None` for unverified records.
    pub fn for_record(
        record: &CivicActionRecord,
        identity_proof: Vec<u8>,
        issued_at: Timestamp,
    ) -> Option<Self> {
        let verified_at = record.verified_at.filter(|_| record.is_verified())?;
        Some(Self {
            version: BUNDLE_VERSION,
            claim: record.claim,
            actor: record.actor.clone(),
            kind: record.kind,
            context: record.context,
            submitted_at: record.submitted_at,
            verified_at,
            delivery_proof: record.delivery_proof.clone(),
            identity_proof,
            issued_at,
        })
    }

    fn digest(&self) -> Result<[u8; 32], VerificationError> {
        let bytes =
            bincode::serialize(self).map_err(|e| VerificationError::Encoding(e.to_string()))?;
        Ok(civic_crypto::blake2b_256(&bytes))
    }
}

/// A signed attestation bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    pub body: BundleBody,
    pub issuer: PublicKey,
    pub tag: Signature,
}

impl ProofBundle {
    /// Sign `body` with the issuer's key.
    pub fn sign(body: BundleBody, issuer: &KeyPair) -> Result<Self, VerificationError> {
        let digest = body.digest()?;
        let tag = civic_crypto::sign_message(&digest, &issuer.private);
        Ok(Self {
            body,
            issuer: issuer.public.clone(),
            tag,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, VerificationError> {
        bincode::serialize(self).map_err(|e| VerificationError::Encoding(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, VerificationError> {
        let bundle: Self =
            bincode::deserialize(bytes).map_err(|e| VerificationError::Encoding(e.to_string()))?;
        if bundle.body.version != BUNDLE_VERSION {
            return Err(VerificationError::Encoding(format!(
                "unsupported bundle version {}",
                bundle.body.version
            )));
        }
        Ok(bundle)
    }

    /// Whether the tag is a valid signature by the embedded issuer key.
    pub fn verify(&self) -> bool {
        match self.body.digest() {
            Ok(digest) => civic_crypto::verify_signature(&digest, &self.tag, &self.issuer),
            Err(_) => false,
        }
    }

    /// Whether the bundle verifies and was issued by `trusted`.
    pub fn verify_from(&self, trusted: &PublicKey) -> bool {
        &self.issuer == trusted && self.verify()
    }
}
