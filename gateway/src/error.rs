use civic_consensus::ConsensusError;
use civic_types::{ActionKind, Timestamp, TokenAmount};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("claim {0} is not approved")]
    ConsensusNotApproved(String),

    #[error("{0} has already been processed")]
    AlreadyProcessed(String),

    #[error("actor is cooling down until {retry_after}")]
    CooldownActive { retry_after: Timestamp },

    #[error("daily limit of {cap} actions reached for day {day}")]
    DailyLimitReached { day: u64, cap: u32 },

    #[error("reward transfer of {amount} to {to} was rejected")]
    RewardTransferFailed { to: String, amount: TokenAmount },

    #[error("{0} is not authorized for this operation")]
    Unauthorized(String),

    #[error("claim approves a {approved} action, not {requested}")]
    KindMismatch {
        approved: ActionKind,
        requested: ActionKind,
    },

    #[error("consensus: {0}")]
    Consensus(#[from] ConsensusError),
}

impl GatewayError {
    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConsensusNotApproved(_) => "consensus_not_approved",
            Self::AlreadyProcessed(_) => "already_processed",
            Self::CooldownActive { .. } => "cooldown_active",
            Self::DailyLimitReached { .. } => "daily_limit_reached",
            Self::RewardTransferFailed { .. } => "reward_transfer_failed",
            Self::Unauthorized(_) => "unauthorized",
            Self::KindMismatch { .. } => "kind_mismatch",
            Self::Consensus(e) => e.code(),
        }
    }

    /// Whether the same call may succeed later without any other change.
    ///
    /// Rate limits lift with time. A rejected transfer may succeed once the
    /// treasury is refilled. Replay and authorization failures never lift.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CooldownActive { .. }
                | Self::DailyLimitReached { .. }
                | Self::RewardTransferFailed { .. }
        )
    }
}
