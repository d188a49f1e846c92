//! The action gateway.
//!
//! Every irreversible effect (recording a civic action, paying its reward,
//! creating a template) passes through [`ActionGateway`]. An effect runs only
//! when its approval claim is approved and unconsumed, the actor is outside
//! its cooldown and under its daily cap, and the reward collaborator accepted
//! the transfer.
//!
//! ## Module overview
//!
//! - [`gateway`]: the [`ActionGateway`] itself.
//! - [`router`]: resolves a claim against consensus or verification.
//! - [`rate_limit`]: per-actor cooldown and day-bucketed counters.
//! - [`replay`]: the write-once processed-action set.
//! - [`collaborators`]: registry and reward-ledger seams.

pub mod collaborators;
pub mod error;
pub mod event;
pub mod gateway;
pub mod rate_limit;
pub mod replay;
pub mod router;

pub use collaborators::{ActionRegistry, RewardLedger};
pub use error::GatewayError;
pub use event::GatewayEvent;
pub use gateway::{ActionGateway, GatewaySnapshot};
pub use rate_limit::{RateLimitState, RateLimiter};
pub use replay::ProcessedSet;
pub use router::ApprovalRouter;
