//! Versioned bincode snapshots of the whole ledger.

use crate::bootstrap::Bootstrap;
use crate::NodeError;
use civic_consensus::VotingSnapshot;
use civic_gateway::GatewaySnapshot;
use civic_verification::WorkflowSnapshot;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Every component's persistent state. Collaborators, keys, subscribers and
/// the audit log are not part of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Must stay the first field: `decode` reads it before the rest.
    pub version: u32,
    pub bootstrap: Bootstrap,
    pub voting: VotingSnapshot,
    pub workflow: WorkflowSnapshot,
    pub gateway: GatewaySnapshot,
}

impl LedgerSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, NodeError> {
        bincode::serialize(self).map_err(|e| NodeError::Snapshot(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, NodeError> {
        let version: u32 =
            bincode::deserialize(bytes).map_err(|e| NodeError::Snapshot(e.to_string()))?;
        if version != SNAPSHOT_VERSION {
            return Err(NodeError::Snapshot(format!(
                "unsupported snapshot version {version} (expected {SNAPSHOT_VERSION})"
            )));
        }
        bincode::deserialize(bytes).map_err(|e| NodeError::Snapshot(e.to_string()))
    }
}

/// Write a snapshot, creating parent directories. The file is replaced
/// atomically via a temporary sibling.
pub fn save_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<(), NodeError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, snapshot.encode()?)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<LedgerSnapshot, NodeError> {
    let bytes = std::fs::read(path)?;
    LedgerSnapshot::decode(&bytes)
}
