//! Approval routing between the two approval sources.
//!
//! A claim that the verification workflow holds a record for is approved only
//! once an operator verified it. Every other claim is approved by threshold
//! consensus. A workflow claim never falls through to the voting ledger, so
//! votes cannot bypass operator verification. Bindings follow the same route.

use civic_consensus::VotingLedger;
use civic_types::{ApprovalSource, ClaimBinding, ClaimId};
use civic_verification::VerificationWorkflow;

pub struct ApprovalRouter<'a> {
    voting: &'a VotingLedger,
    workflow: &'a VerificationWorkflow,
}

impl<'a> ApprovalRouter<'a> {
    pub fn new(voting: &'a VotingLedger, workflow: &'a VerificationWorkflow) -> Self {
        Self { voting, workflow }
    }
}

impl ApprovalSource for ApprovalRouter<'_> {
    fn is_approved(&self, claim: &ClaimId) -> bool {
        if self.workflow.contains(claim) {
            self.workflow.is_verified(claim)
        } else {
            self.voting.is_approved(claim)
        }
    }

    fn binding(&self, claim: &ClaimId) -> Option<ClaimBinding> {
        if self.workflow.contains(claim) {
            ApprovalSource::binding(self.workflow, claim)
        } else {
            ApprovalSource::binding(self.voting, claim)
        }
    }
}
