use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("{0} is not authorized for this operation")]
    Unauthorized(String),

    #[error("agent {agent} has already voted on claim {claim}")]
    DuplicateVote { agent: String, claim: String },

    #[error("the zero claim identifier is not a valid claim")]
    InvalidClaim,

    #[error("threshold must be at least 1, got {0}")]
    InvalidThreshold(u32),

    #[error("claim {0} already exists")]
    AlreadyExists(String),
}

impl ConsensusError {
    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::DuplicateVote { .. } => "duplicate_vote",
            Self::InvalidClaim => "invalid_claim",
            Self::InvalidThreshold(_) => "invalid_threshold",
            Self::AlreadyExists(_) => "already_exists",
        }
    }
}
