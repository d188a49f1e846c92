//! Consensus requests: claims originated on behalf of a requester for agents to vote on.

use civic_types::{AccountId, ClaimId, Timestamp};
use serde::{Deserialize, Serialize};

/// A request for agent approval.
///
/// Only the payload's hash is kept; the payload itself lives with the requester.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub claim: ClaimId,
    pub requester: AccountId,
    pub description: String,
    pub payload_hash: [u8; 32],
    pub opened_at: Timestamp,
}
