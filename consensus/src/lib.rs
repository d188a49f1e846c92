//! Threshold consensus over opaque claim identifiers.
//!
//! A bounded set of authorized agents each cast at most one vote per claim.
//! A claim is approved once the number of distinct voters reaches the
//! threshold. Approval is computed on read, so a threshold change applies to
//! every claim immediately and can never desynchronize a stored flag.
//!
//! ## Module overview
//!
//! - [`voting`]: the [`VotingLedger`]: agent set, vote records, tallies, threshold.
//! - [`request`]: consensus requests originated through the gateway.
//! - [`event`]: events emitted for the audit trail.
//! - [`error`]: consensus error types.

pub mod error;
pub mod event;
pub mod request;
pub mod voting;

pub use error::ConsensusError;
pub use event::ConsensusEvent;
pub use request::ApprovalRequest;
pub use voting::{VotingLedger, VotingSnapshot};
