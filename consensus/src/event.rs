//! Events emitted by the voting ledger.

use civic_types::{AccountId, ClaimId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusEvent {
    /// An agent voted on a claim. `tally` is the count after this vote.
    VoteCast {
        claim: ClaimId,
        agent: AccountId,
        tally: u32,
        at: Timestamp,
    },
    /// The approval threshold changed.
    ThresholdChanged { old: u32, new: u32, at: Timestamp },
    /// A new consensus request was opened.
    RequestOpened {
        claim: ClaimId,
        requester: AccountId,
        at: Timestamp,
    },
    /// An identity gained the voting capability.
    AgentGranted { agent: AccountId, at: Timestamp },
    /// An identity lost the voting capability.
    AgentRevoked { agent: AccountId, at: Timestamp },
}
