//! Events emitted by the action gateway.

use civic_types::{AccountId, ActionHash, ActionKind, ClaimId, TemplateHash, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    ActionProcessed {
        action: ActionHash,
        actor: AccountId,
        kind: ActionKind,
        claim: ClaimId,
        reward: TokenAmount,
        at: Timestamp,
    },
    TemplateCreated {
        template: TemplateHash,
        author: AccountId,
        claim: ClaimId,
        at: Timestamp,
    },
    ApprovalRequested {
        claim: ClaimId,
        requester: AccountId,
        at: Timestamp,
    },
}
