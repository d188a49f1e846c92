//! The narrow query seam between approval producers and the gateway.

use crate::action::ActionKind;
use crate::address::AccountId;
use crate::hash::ClaimId;

/// Who an approved claim may be spent by, and for which kind of action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimBinding {
    pub owner: AccountId,
    /// `None` when the claim does not fix an action kind.
    pub kind: Option<ActionKind>,
}

/// Anything that can answer "is this claim approved?".
///
/// Implemented by the voting ledger (threshold consensus) and the
/// verification workflow (operator verification). Implementations must be
/// pure reads.
pub trait ApprovalSource {
    fn is_approved(&self, claim: &ClaimId) -> bool;

    /// The owner the claim is bound to, if any. An unbound claim may be
    /// spent by any actor once approved.
    fn binding(&self, _claim: &ClaimId) -> Option<ClaimBinding> {
        None
    }
}
