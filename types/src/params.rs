//! Protocol parameters pushed into every component by the one-shot bootstrap.

use crate::action::IdentityAttribute;
use serde::{Deserialize, Serialize};

/// All tunable values the ledger components enforce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // ── Consensus ────────────────────────────────────────────────────────
    /// Number of distinct agent votes a claim needs to be approved.
    pub vote_threshold: u32,

    // ── Verification ─────────────────────────────────────────────────────
    /// Minimum interval (seconds) between two submissions by the same actor.
    pub submission_interval_secs: u64,

    /// Identity predicates an actor must satisfy to submit a claim.
    /// Also the attribute set disclosed in proof bundles.
    pub required_attributes: Vec<IdentityAttribute>,

    // ── Gateway ──────────────────────────────────────────────────────────
    /// Minimum interval (seconds) between two processed actions by the same actor.
    pub action_cooldown_secs: u64,

    /// Maximum processed actions per actor per day bucket.
    pub daily_action_cap: u32,
}

impl ProtocolParams {
    /// The fixed parameter set the bootstrap installs.
    pub fn civic_defaults() -> Self {
        Self {
            vote_threshold: 2,
            submission_interval_secs: 3600, // 1 hour
            required_attributes: vec![IdentityAttribute::Adult, IdentityAttribute::Citizen],
            action_cooldown_secs: 3600, // 1 hour
            daily_action_cap: 10,
        }
    }
}

/// Default is the bootstrap configuration.
impl Default for ProtocolParams {
    fn default() -> Self {
        Self::civic_defaults()
    }
}
