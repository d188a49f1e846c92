//! Fundamental types for the civic action ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identities, claim and action hashes, timestamps, reward amounts,
//! action kinds, protocol parameters, capability sets, and the approval query seam.

pub mod action;
pub mod address;
pub mod amount;
pub mod approval;
pub mod capability;
pub mod hash;
pub mod keys;
pub mod params;
pub mod time;

pub use action::{ActionKind, IdentityAttribute};
pub use address::AccountId;
pub use amount::TokenAmount;
pub use approval::{ApprovalSource, ClaimBinding};
pub use capability::CapabilitySet;
pub use hash::{ActionHash, ClaimId, ContextHash, TemplateHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::ProtocolParams;
pub use time::{Clock, SystemClock, Timestamp, DAY_SECS};
