//! One-shot ledger bootstrap.
//!
//! A two-state machine, `Pending → Done`. The deployer runs it exactly once:
//! the hardcoded parameter set is pushed into every component and each
//! component's controller role moves to the consensus-layer identity. After
//! that the deployer holds no privilege anywhere.

use civic_consensus::{ConsensusError, VotingLedger};
use civic_gateway::{ActionGateway, GatewayError};
use civic_types::{AccountId, ProtocolParams, Timestamp, TokenAmount};
use civic_verification::{VerificationError, VerificationWorkflow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("bootstrap has already completed")]
    AlreadyInitialized,

    #[error("{0} is not the deployer")]
    NotAuthorized(String),

    #[error("deployer no longer controls {0}")]
    PreconditionFailed(&'static str),

    #[error("bootstrap does not accept value ({0} offered)")]
    ValueRefused(TokenAmount),

    #[error("consensus: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("verification: {0}")]
    Verification(#[from] VerificationError),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
}

impl BootstrapError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "already_initialized",
            Self::NotAuthorized(_) => "not_authorized",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::ValueRefused(_) => "value_refused",
            Self::Consensus(e) => e.code(),
            Self::Verification(e) => e.code(),
            Self::Gateway(e) => e.code(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapState {
    Pending,
    Done,
}

/// Mutable borrows of the components a bootstrap configures.
pub struct Components<'a> {
    pub voting: &'a mut VotingLedger,
    pub workflow: &'a mut VerificationWorkflow,
    pub gateway: &'a mut ActionGateway,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bootstrap {
    deployer: AccountId,
    consensus_account: AccountId,
    state: BootstrapState,
    /// Parameter set applied by the one successful run.
    applied: Option<ProtocolParams>,
    completed_at: Option<Timestamp>,
}

impl Bootstrap {
    pub fn new(deployer: AccountId, consensus_account: AccountId) -> Self {
        Self {
            deployer,
            consensus_account,
            state: BootstrapState::Pending,
            applied: None,
            completed_at: None,
        }
    }

    /// Configure every component and hand control to the consensus account.
    ///
    /// All preconditions are checked before the first component is touched.
    pub fn initialize(
        &mut self,
        caller: &AccountId,
        parts: Components<'_>,
        now: Timestamp,
    ) -> Result<ProtocolParams, BootstrapError> {
        self.require_pending()?;
        if caller != &self.deployer {
            tracing::warn!(caller = %caller, "bootstrap rejected: not the deployer");
            return Err(BootstrapError::NotAuthorized(caller.to_string()));
        }
        if parts.voting.controller() != &self.deployer {
            return Err(BootstrapError::PreconditionFailed("voting ledger"));
        }
        if parts.workflow.controller() != &self.deployer {
            return Err(BootstrapError::PreconditionFailed("verification workflow"));
        }
        if parts.gateway.controller() != &self.deployer {
            return Err(BootstrapError::PreconditionFailed("action gateway"));
        }

        let params = ProtocolParams::civic_defaults();
        parts.voting.configure(&self.deployer, &params, now)?;
        parts.workflow.configure(&self.deployer, &params)?;
        parts.gateway.configure(&self.deployer, &params)?;

        parts
            .voting
            .transfer_control(&self.deployer, self.consensus_account.clone())?;
        parts
            .workflow
            .transfer_control(&self.deployer, self.consensus_account.clone())?;
        parts
            .gateway
            .transfer_control(&self.deployer, self.consensus_account.clone())?;

        self.state = BootstrapState::Done;
        self.applied = Some(params.clone());
        self.completed_at = Some(now);
        tracing::info!(consensus_account = %self.consensus_account, "bootstrap completed");
        Ok(params)
    }

    /// The bootstrap holds no funds; any offered value is refused.
    pub fn accept_value(&self, amount: TokenAmount) -> Result<(), BootstrapError> {
        self.require_pending()?;
        Err(BootstrapError::ValueRefused(amount))
    }

    fn require_pending(&self) -> Result<(), BootstrapError> {
        match self.state {
            BootstrapState::Pending => Ok(()),
            BootstrapState::Done => Err(BootstrapError::AlreadyInitialized),
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == BootstrapState::Done
    }

    pub fn applied_params(&self) -> Option<&ProtocolParams> {
        self.applied.as_ref()
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn deployer(&self) -> &AccountId {
        &self.deployer
    }

    pub fn consensus_account(&self) -> &AccountId {
        &self.consensus_account
    }
}
