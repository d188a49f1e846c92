//! Ledger-level events, the subscriber bus and the append-only audit log.

use civic_consensus::ConsensusEvent;
use civic_gateway::GatewayEvent;
use civic_types::{AccountId, Timestamp};
use civic_verification::VerificationEvent;
use serde::{Deserialize, Serialize};

/// Every event a component emitted, tagged with its origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Consensus(ConsensusEvent),
    Verification(VerificationEvent),
    Gateway(GatewayEvent),
    BootstrapCompleted {
        consensus_account: AccountId,
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// Short event name for logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Consensus(e) => match e {
                ConsensusEvent::VoteCast { .. } => "vote_cast",
                ConsensusEvent::ThresholdChanged { .. } => "threshold_changed",
                ConsensusEvent::RequestOpened { .. } => "request_opened",
                ConsensusEvent::AgentGranted { .. } => "agent_granted",
                ConsensusEvent::AgentRevoked { .. } => "agent_revoked",
            },
            Self::Verification(e) => match e {
                VerificationEvent::ClaimSubmitted { .. } => "claim_submitted",
                VerificationEvent::ClaimVerified { .. } => "claim_verified",
                VerificationEvent::OperatorAdded { .. } => "operator_added",
                VerificationEvent::OperatorRemoved { .. } => "operator_removed",
            },
            Self::Gateway(e) => match e {
                GatewayEvent::ActionProcessed { .. } => "action_processed",
                GatewayEvent::TemplateCreated { .. } => "template_created",
                GatewayEvent::ApprovalRequested { .. } => "approval_requested",
            },
            Self::BootstrapCompleted { .. } => "bootstrap_completed",
        }
    }
}

impl From<ConsensusEvent> for LedgerEvent {
    fn from(e: ConsensusEvent) -> Self {
        Self::Consensus(e)
    }
}

impl From<VerificationEvent> for LedgerEvent {
    fn from(e: VerificationEvent) -> Self {
        Self::Verification(e)
    }
}

impl From<GatewayEvent> for LedgerEvent {
    fn from(e: GatewayEvent) -> Self {
        Self::Gateway(e)
    }
}

/// Synchronous fan-out event bus for ledger events.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast to
/// avoid stalling the ledger.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One audit entry. Sequence numbers start at zero and never repeat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub event: LedgerEvent,
}

/// Append-only record of every event the ledger emitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: LedgerEvent) -> u64 {
        let seq = self.entries.len() as u64;
        self.entries.push(AuditEntry { seq, event });
        seq
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries with `seq >= from`.
    pub fn since(&self, from: u64) -> &[AuditEntry] {
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(self.entries.len());
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
