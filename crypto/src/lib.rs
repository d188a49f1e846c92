//! Cryptographic primitives for the civic action ledger.
//!
//! - **Blake2b-256** for every identifier: claim ids, action hashes, template
//!   hashes, approval-request ids and proof-bundle digests
//! - **Ed25519** for the authenticity tag on proof bundles

pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use error::CryptoError;
pub use hash::{
    blake2b_256, blake2b_256_multi, derive_action_hash, derive_claim_id, derive_request_id,
    derive_template_hash,
};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
