use civic_types::{IdentityAttribute, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("{0} is not authorized for this operation")]
    Unauthorized(String),

    #[error("the zero claim identifier is not a valid claim")]
    InvalidClaim,

    #[error("claim {0} already exists")]
    AlreadyExists(String),

    #[error("eligibility check failed: {0}")]
    EligibilityCheckFailed(EligibilityFailure),

    #[error("claim {0} not found")]
    NotFound(String),

    #[error("claim {0} is already verified")]
    AlreadyVerified(String),

    #[error("identity attestation for {0} is missing or expired")]
    IdentityExpired(String),

    #[error("delivery proof invalid: {0}")]
    DeliveryProofInvalid(&'static str),

    #[error("claim {0} is not verified")]
    NotVerified(String),

    #[error("proof bundle encoding failed: {0}")]
    Encoding(String),
}

impl VerificationError {
    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidClaim => "invalid_claim",
            Self::AlreadyExists(_) => "already_exists",
            Self::EligibilityCheckFailed(_) => "eligibility_check_failed",
            Self::NotFound(_) => "not_found",
            Self::AlreadyVerified(_) => "already_verified",
            Self::IdentityExpired(_) => "identity_expired",
            Self::DeliveryProofInvalid(_) => "delivery_proof_invalid",
            Self::NotVerified(_) => "not_verified",
            Self::Encoding(_) => "encoding",
        }
    }
}

/// Why an actor failed the submission eligibility gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityFailure {
    #[error("identity provider reports {0} as ineligible")]
    Ineligible(String),

    #[error("{actor} lacks required attribute {attribute}")]
    MissingAttribute {
        actor: String,
        attribute: IdentityAttribute,
    },

    #[error("submission too soon, next allowed at {next_allowed}")]
    SubmissionTooSoon { next_allowed: Timestamp },
}
