//! Verification workflow: the per-claim `Submitted → Verified` state machine.

use crate::bundle::{BundleBody, ProofBundle};
use crate::error::{EligibilityFailure, VerificationError};
use crate::event::VerificationEvent;
use crate::identity::IdentityProvider;
use crate::record::{CivicActionRecord, ClaimStatus, DeliveryProof};
use civic_types::{
    AccountId, ActionKind, ApprovalSource, CapabilitySet, ClaimBinding, ClaimId, ContextHash,
    IdentityAttribute, KeyPair, ProtocolParams, PublicKey, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Owns civic action records and moves them through verification.
///
/// Every check of an operation runs before any mutation, so a failed call
/// leaves the workflow exactly as it was.
pub struct VerificationWorkflow {
    /// Identity allowed to change parameters.
    controller: AccountId,
    /// External registry identity allowed to add and remove operators.
    registry_controller: AccountId,
    operators: CapabilitySet,
    identity: Arc<dyn IdentityProvider>,
    /// Key that signs exported proof bundles.
    signer: KeyPair,
    submission_interval_secs: u64,
    required_attributes: Vec<IdentityAttribute>,
    records: HashMap<ClaimId, CivicActionRecord>,
    last_submission: HashMap<AccountId, Timestamp>,
    pending_events: Vec<VerificationEvent>,
}

impl VerificationWorkflow {
    pub fn new(
        controller: AccountId,
        registry_controller: AccountId,
        identity: Arc<dyn IdentityProvider>,
        signer: KeyPair,
        params: &ProtocolParams,
    ) -> Self {
        Self {
            controller,
            registry_controller,
            operators: CapabilitySet::new(),
            identity,
            signer,
            submission_interval_secs: params.submission_interval_secs,
            required_attributes: params.required_attributes.clone(),
            records: HashMap::new(),
            last_submission: HashMap::new(),
            pending_events: Vec::new(),
        }
    }

    /// Record a new civic action claim in the `Submitted` state.
    pub fn submit(
        &mut self,
        actor: &AccountId,
        claim: &ClaimId,
        kind: ActionKind,
        context: ContextHash,
        metadata: Vec<u8>,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if claim.is_zero() {
            return Err(VerificationError::InvalidClaim);
        }
        if self.records.contains_key(claim) {
            return Err(VerificationError::AlreadyExists(claim.to_string()));
        }
        self.check_eligibility(actor, now)
            .map_err(VerificationError::EligibilityCheckFailed)?;

        self.records.insert(
            *claim,
            CivicActionRecord {
                claim: *claim,
                actor: actor.clone(),
                kind,
                context,
                metadata,
                submitted_at: now,
                status: ClaimStatus::Submitted,
                verified_at: None,
                verified_by: None,
                delivery_proof: None,
                additional_proof: Vec::new(),
            },
        );
        self.last_submission.insert(actor.clone(), now);

        tracing::debug!(claim = %claim, actor = %actor, %kind, "claim submitted");
        self.pending_events.push(VerificationEvent::ClaimSubmitted {
            claim: *claim,
            actor: actor.clone(),
            kind,
            at: now,
        });
        Ok(())
    }

    fn check_eligibility(&self, actor: &AccountId, now: Timestamp) -> Result<(), EligibilityFailure> {
        if !self.identity.is_eligible(actor) {
            return Err(EligibilityFailure::Ineligible(actor.to_string()));
        }
        if let Some(&attribute) = self
            .required_attributes
            .iter()
            .find(|&&a| !self.identity.verify_attribute(actor, a))
        {
            return Err(EligibilityFailure::MissingAttribute {
                actor: actor.to_string(),
                attribute,
            });
        }
        if let Some(last) = self.last_submission.get(actor) {
            if !last.has_expired(self.submission_interval_secs, now) {
                return Err(EligibilityFailure::SubmissionTooSoon {
                    next_allowed: last.plus(self.submission_interval_secs),
                });
            }
        }
        Ok(())
    }

    /// Move a `Submitted` claim to `Verified` on an operator's authority.
    pub fn verify(
        &mut self,
        operator: &AccountId,
        claim: &ClaimId,
        delivery_proof: Option<DeliveryProof>,
        additional_proof: Vec<u8>,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if !self.operators.contains(operator) {
            tracing::warn!(caller = %operator, claim = %claim, "verify rejected: not an operator");
            return Err(VerificationError::Unauthorized(operator.to_string()));
        }
        let record = self
            .records
            .get(claim)
            .ok_or_else(|| VerificationError::NotFound(claim.to_string()))?;
        if record.is_verified() {
            return Err(VerificationError::AlreadyVerified(claim.to_string()));
        }
        if !self.identity.attestation(&record.actor).is_valid_at(now) {
            return Err(VerificationError::IdentityExpired(record.actor.to_string()));
        }
        let delivery_proof = if record.kind.requires_delivery_proof() {
            let proof = delivery_proof
                .ok_or(VerificationError::DeliveryProofInvalid("delivery proof required"))?;
            proof
                .validate()
                .map_err(VerificationError::DeliveryProofInvalid)?;
            Some(proof)
        } else {
            None
        };

        // All checks passed; the lookup above guarantees the record exists.
        let Some(record) = self.records.get_mut(claim) else {
            return Err(VerificationError::NotFound(claim.to_string()));
        };
        record.status = ClaimStatus::Verified;
        record.verified_at = Some(now);
        record.verified_by = Some(operator.clone());
        record.delivery_proof = delivery_proof;
        record.additional_proof = additional_proof;

        tracing::info!(claim = %claim, actor = %record.actor, operator = %operator, "claim verified");
        self.pending_events.push(VerificationEvent::ClaimVerified {
            claim: *claim,
            actor: record.actor.clone(),
            operator: operator.clone(),
            at: now,
        });
        Ok(())
    }

    /// Export a signed attestation bundle for a verified claim.
    pub fn generate_proof_bundle(
        &self,
        claim: &ClaimId,
        now: Timestamp,
    ) -> Result<Vec<u8>, VerificationError> {
        let record = self
            .records
            .get(claim)
            .filter(|r| r.is_verified())
            .ok_or_else(|| VerificationError::NotVerified(claim.to_string()))?;
        let identity_proof = self
            .identity
            .issue_selective_proof(&record.actor, &self.required_attributes);
        let body = BundleBody::for_record(record, identity_proof, now)
            .ok_or_else(|| VerificationError::NotVerified(claim.to_string()))?;
        ProofBundle::sign(body, &self.signer)?.encode()
    }

    /// Public half of the bundle signing key.
    pub fn issuer_key(&self) -> &PublicKey {
        &self.signer.public
    }

    fn require_registry(&self, caller: &AccountId) -> Result<(), VerificationError> {
        if caller != &self.registry_controller {
            tracing::warn!(caller = %caller, "rejected operator-registry call");
            return Err(VerificationError::Unauthorized(caller.to_string()));
        }
        Ok(())
    }

    pub fn add_operator(
        &mut self,
        caller: &AccountId,
        operator: AccountId,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.require_registry(caller)?;
        if self.operators.grant(operator.clone()) {
            tracing::info!(operator = %operator, "operator added");
            self.pending_events
                .push(VerificationEvent::OperatorAdded { operator, at: now });
        }
        Ok(())
    }

    pub fn remove_operator(
        &mut self,
        caller: &AccountId,
        operator: &AccountId,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.require_registry(caller)?;
        if self.operators.revoke(operator) {
            tracing::info!(operator = %operator, "operator removed");
            self.pending_events.push(VerificationEvent::OperatorRemoved {
                operator: operator.clone(),
                at: now,
            });
        }
        Ok(())
    }

    pub fn is_operator(&self, who: &AccountId) -> bool {
        self.operators.contains(who)
    }

    /// Apply the verification share of a parameter set.
    pub fn configure(
        &mut self,
        caller: &AccountId,
        params: &ProtocolParams,
    ) -> Result<(), VerificationError> {
        if caller != &self.controller {
            return Err(VerificationError::Unauthorized(caller.to_string()));
        }
        self.submission_interval_secs = params.submission_interval_secs;
        self.required_attributes = params.required_attributes.clone();
        Ok(())
    }

    pub fn controller(&self) -> &AccountId {
        &self.controller
    }

    pub fn transfer_control(
        &mut self,
        caller: &AccountId,
        new_controller: AccountId,
    ) -> Result<(), VerificationError> {
        if caller != &self.controller {
            return Err(VerificationError::Unauthorized(caller.to_string()));
        }
        tracing::info!(from = %self.controller, to = %new_controller, "verification control transferred");
        self.controller = new_controller;
        Ok(())
    }

    pub fn record(&self, claim: &ClaimId) -> Option<&CivicActionRecord> {
        self.records.get(claim)
    }

    /// `None` means the claim does not exist.
    pub fn status(&self, claim: &ClaimId) -> Option<ClaimStatus> {
        self.records.get(claim).map(|r| r.status)
    }

    pub fn is_verified(&self, claim: &ClaimId) -> bool {
        self.records.get(claim).is_some_and(|r| r.is_verified())
    }

    pub fn contains(&self, claim: &ClaimId) -> bool {
        self.records.contains_key(claim)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Drain pending events for the caller to publish.
    pub fn drain_events(&mut self) -> Vec<VerificationEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            controller: self.controller.clone(),
            registry_controller: self.registry_controller.clone(),
            operators: self.operators.clone(),
            submission_interval_secs: self.submission_interval_secs,
            required_attributes: self.required_attributes.clone(),
            records: self.records.clone(),
            last_submission: self.last_submission.clone(),
        }
    }

    /// Rebuild from a snapshot. Collaborators and the signing key are not
    /// persisted and must be supplied again.
    pub fn restore(
        snapshot: WorkflowSnapshot,
        identity: Arc<dyn IdentityProvider>,
        signer: KeyPair,
    ) -> Self {
        Self {
            controller: snapshot.controller,
            registry_controller: snapshot.registry_controller,
            operators: snapshot.operators,
            identity,
            signer,
            submission_interval_secs: snapshot.submission_interval_secs,
            required_attributes: snapshot.required_attributes,
            records: snapshot.records,
            last_submission: snapshot.last_submission,
            pending_events: Vec::new(),
        }
    }
}

impl ApprovalSource for VerificationWorkflow {
    fn is_approved(&self, claim: &ClaimId) -> bool {
        self.is_verified(claim)
    }

    /// A submitted claim belongs to its actor and the kind it was submitted as.
    fn binding(&self, claim: &ClaimId) -> Option<ClaimBinding> {
        self.records.get(claim).map(|r| ClaimBinding {
            owner: r.actor.clone(),
            kind: Some(r.kind),
        })
    }
}

/// Serializable workflow state for persistence across restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub controller: AccountId,
    pub registry_controller: AccountId,
    pub operators: CapabilitySet,
    pub submission_interval_secs: u64,
    pub required_attributes: Vec<IdentityAttribute>,
    pub records: HashMap<ClaimId, CivicActionRecord>,
    pub last_submission: HashMap<AccountId, Timestamp>,
}
