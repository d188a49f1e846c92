use thiserror::Error;

use crate::bootstrap::BootstrapError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("consensus error: {0}")]
    Consensus(#[from] civic_consensus::ConsensusError),

    #[error("verification error: {0}")]
    Verification(#[from] civic_verification::VerificationError),

    #[error("gateway error: {0}")]
    Gateway(#[from] civic_gateway::GatewayError),

    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("crypto error: {0}")]
    Crypto(#[from] civic_crypto::CryptoError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("ledger not initialized")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl NodeError {
    /// Stable machine-readable error kind. Component errors keep their own code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Consensus(e) => e.code(),
            Self::Verification(e) => e.code(),
            Self::Gateway(e) => e.code(),
            Self::Bootstrap(e) => e.code(),
            Self::Crypto(_) => "crypto",
            Self::Metrics(_) => "metrics",
            Self::Config(_) => "config",
            Self::NotInitialized => "not_initialized",
            Self::Io(_) => "io",
            Self::Snapshot(_) => "snapshot",
        }
    }
}
