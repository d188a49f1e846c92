//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Every external collaborator of the ledger (clock, identity provider,
//! action registry, reward ledger) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what was asked of them for later assertions
//!
//! Usage: swap real implementations for nullables in tests and dry runs.

pub mod clock;
pub mod identity;
pub mod registry;
pub mod rewards;

pub use clock::NullClock;
pub use identity::NullIdentityProvider;
pub use registry::{NullRegistry, RecordedAction};
pub use rewards::NullRewardLedger;
