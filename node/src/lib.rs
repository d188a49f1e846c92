//! Civic ledger node: the composition root.
//!
//! The node wires the components together and owns the ambient concerns:
//! - One-shot bootstrap that hands every component to the consensus account
//! - Configuration from TOML
//! - Event fan-out to subscribers and an append-only audit log
//! - Prometheus metrics
//! - Versioned snapshot persistence

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ledger;
pub mod ledger_event;
pub mod metrics;
pub mod snapshot;

pub use bootstrap::{Bootstrap, BootstrapError, BootstrapState, Components};
pub use config::LedgerConfig;
pub use error::NodeError;
pub use ledger::{CivicLedger, Collaborators};
pub use ledger_event::{AuditEntry, AuditLog, EventBus, LedgerEvent};
pub use metrics::LedgerMetrics;
pub use snapshot::{load_snapshot, save_snapshot, LedgerSnapshot, SNAPSHOT_VERSION};
