//! Civic action verification.
//!
//! Carries a claim from `Submitted` to `Verified`:
//! 1. **Submission**: an eligible actor records a claim about a civic action.
//!    Eligibility comes from the external identity provider; an anti-spam
//!    interval limits how often one actor may submit.
//! 2. **Verification**: an authorized operator attaches the external proof
//!    (for message deliveries, a delivery receipt) once the actor's identity
//!    attestation is still valid. `Verified` is terminal.
//!
//! Verified claims can be exported as signed [`ProofBundle`]s for downstream systems.

pub mod bundle;
pub mod error;
pub mod event;
pub mod identity;
pub mod record;
pub mod workflow;

pub use bundle::{BundleBody, ProofBundle};
pub use error::{EligibilityFailure, VerificationError};
pub use event::VerificationEvent;
pub use identity::{Attestation, IdentityProvider};
pub use record::{CivicActionRecord, ClaimStatus, DeliveryProof};
pub use workflow::{VerificationWorkflow, WorkflowSnapshot};
