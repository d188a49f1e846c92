//! Events emitted by the verification workflow.

use civic_types::{AccountId, ActionKind, ClaimId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationEvent {
    ClaimSubmitted {
        claim: ClaimId,
        actor: AccountId,
        kind: ActionKind,
        at: Timestamp,
    },
    ClaimVerified {
        claim: ClaimId,
        actor: AccountId,
        operator: AccountId,
        at: Timestamp,
    },
    OperatorAdded {
        operator: AccountId,
        at: Timestamp,
    },
    OperatorRemoved {
        operator: AccountId,
        at: Timestamp,
    },
}
