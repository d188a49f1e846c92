//! External collaborators the gateway drives but does not own.

use civic_types::{AccountId, ActionKind, ClaimId, TemplateHash, TokenAmount};

/// Durable registry of processed civic actions and templates.
///
/// Writes are infallible from the gateway's point of view; a registry that can
/// fail must buffer and retry on its own side.
pub trait ActionRegistry: Send + Sync {
    fn record_action(
        &self,
        actor: &AccountId,
        kind: ActionKind,
        proof_ref: &ClaimId,
        amount: TokenAmount,
        metadata_ref: &str,
    );

    fn create_template(&self, author: &AccountId, content_ref: &str) -> TemplateHash;
}

/// The reward token's transfer surface.
pub trait RewardLedger: Send + Sync {
    /// Move `amount` from the treasury to `to`. Returns `false` if refused.
    fn transfer(&self, to: &AccountId, amount: TokenAmount) -> bool;
}
