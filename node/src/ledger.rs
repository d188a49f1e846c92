//! The civic ledger: composition root for every component.
//!
//! `CivicLedger` owns the bootstrap, the voting ledger, the verification
//! workflow and the action gateway, wires them to their external
//! collaborators, and serializes every operation behind `&mut self`. Each
//! operation reads `now` once from the clock.
//!
//! After an operation returns, the events its component emitted are drained,
//! appended to the audit log, fanned out to subscribers and counted.

use std::path::Path;
use std::sync::Arc;

use civic_consensus::VotingLedger;
use civic_gateway::{ActionGateway, ActionRegistry, ApprovalRouter, RateLimitState, RewardLedger};
use civic_types::{
    AccountId, ActionHash, ActionKind, ApprovalSource, ClaimId, Clock, ContextHash,
    ProtocolParams, PublicKey, TemplateHash, TokenAmount,
};
use civic_verification::{
    CivicActionRecord, ClaimStatus, DeliveryProof, IdentityProvider, VerificationError,
    VerificationWorkflow,
};

use crate::bootstrap::{Bootstrap, Components};
use crate::config::LedgerConfig;
use crate::ledger_event::{AuditLog, EventBus, LedgerEvent};
use crate::metrics::LedgerMetrics;
use crate::snapshot::{self, LedgerSnapshot, SNAPSHOT_VERSION};
use crate::NodeError;

/// The external systems a ledger talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub identity: Arc<dyn IdentityProvider>,
    pub registry: Arc<dyn ActionRegistry>,
    pub rewards: Arc<dyn RewardLedger>,
}

pub struct CivicLedger {
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
    bootstrap: Bootstrap,
    voting: VotingLedger,
    workflow: VerificationWorkflow,
    gateway: ActionGateway,
    bus: EventBus,
    audit: AuditLog,
    metrics: Option<LedgerMetrics>,
}

impl CivicLedger {
    /// A fresh, un-bootstrapped ledger. Every component starts under the
    /// deployer's control.
    pub fn new(config: LedgerConfig, collaborators: Collaborators) -> Result<Self, NodeError> {
        config.validate()?;
        let signer = config.signing_key()?;
        let deployer = config.deployer.clone();
        let params = &config.params;
        let voting = VotingLedger::new(deployer.clone(), params.vote_threshold);
        let workflow = VerificationWorkflow::new(
            deployer.clone(),
            config.operator_registry.clone(),
            collaborators.identity,
            signer,
            params,
        );
        let gateway = ActionGateway::new(
            deployer.clone(),
            collaborators.registry,
            collaborators.rewards,
            params,
        );
        let metrics = Self::build_metrics(&config)?;
        Ok(Self {
            bootstrap: Bootstrap::new(deployer, config.consensus_account.clone()),
            config,
            clock: collaborators.clock,
            voting,
            workflow,
            gateway,
            bus: EventBus::new(),
            audit: AuditLog::new(),
            metrics,
        })
    }

    /// Rebuild a ledger from a snapshot. The signing key comes from the
    /// config, so set `attestation_seed` to keep the issuer key stable.
    pub fn restore(
        config: LedgerConfig,
        collaborators: Collaborators,
        snapshot: LedgerSnapshot,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(NodeError::Snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        if snapshot.bootstrap.deployer() != &config.deployer {
            return Err(NodeError::Snapshot(format!(
                "snapshot belongs to deployer {}, config names {}",
                snapshot.bootstrap.deployer(),
                config.deployer
            )));
        }
        let signer = config.signing_key()?;
        let metrics = Self::build_metrics(&config)?;
        Ok(Self {
            config,
            clock: collaborators.clock,
            bootstrap: snapshot.bootstrap,
            voting: VotingLedger::restore(snapshot.voting),
            workflow: VerificationWorkflow::restore(
                snapshot.workflow,
                collaborators.identity,
                signer,
            ),
            gateway: ActionGateway::restore(
                snapshot.gateway,
                collaborators.registry,
                collaborators.rewards,
            ),
            bus: EventBus::new(),
            audit: AuditLog::new(),
            metrics,
        })
    }

    /// Restore from the snapshot file under `data_dir`.
    pub fn open(config: LedgerConfig, collaborators: Collaborators) -> Result<Self, NodeError> {
        let snapshot = snapshot::load_snapshot(&config.snapshot_path())?;
        Self::restore(config, collaborators, snapshot)
    }

    fn build_metrics(config: &LedgerConfig) -> Result<Option<LedgerMetrics>, NodeError> {
        Ok(if config.enable_metrics {
            Some(LedgerMetrics::new()?)
        } else {
            None
        })
    }

    // ── Bootstrap ──────────────────────────────────────────────────────

    pub fn initialize(&mut self, caller: &AccountId) -> Result<ProtocolParams, NodeError> {
        let now = self.clock.now();
        let result = self.bootstrap.initialize(
            caller,
            Components {
                voting: &mut self.voting,
                workflow: &mut self.workflow,
                gateway: &mut self.gateway,
            },
            now,
        );
        let params = self.settle(result.map_err(NodeError::from))?;
        self.publish(LedgerEvent::BootstrapCompleted {
            consensus_account: self.bootstrap.consensus_account().clone(),
            at: now,
        });
        Ok(params)
    }

    /// The ledger holds no funds; value sent to the bootstrap is refused.
    pub fn accept_value(&mut self, amount: TokenAmount) -> Result<(), NodeError> {
        let result = self.bootstrap.accept_value(amount).map_err(NodeError::from);
        self.settle(result)
    }

    pub fn is_initialized(&self) -> bool {
        self.bootstrap.is_done()
    }

    fn require_initialized(&self) -> Result<(), NodeError> {
        if !self.bootstrap.is_done() {
            return Err(NodeError::NotInitialized);
        }
        Ok(())
    }

    // ── Consensus ──────────────────────────────────────────────────────

    pub fn cast_vote(&mut self, agent: &AccountId, claim: &ClaimId) -> Result<u32, NodeError> {
        let result = self.guarded(|l, now| Ok(l.voting.cast_vote(claim, agent, now)?));
        self.settle(result)
    }

    pub fn set_threshold(&mut self, caller: &AccountId, threshold: u32) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| Ok(l.voting.set_threshold(caller, threshold, now)?));
        self.settle(result)
    }

    pub fn grant_agent(&mut self, caller: &AccountId, agent: AccountId) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| Ok(l.voting.grant_agent(caller, agent, now)?));
        self.settle(result)
    }

    pub fn revoke_agent(&mut self, caller: &AccountId, agent: &AccountId) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| Ok(l.voting.revoke_agent(caller, agent, now)?));
        self.settle(result)
    }

    // ── Verification ───────────────────────────────────────────────────

    pub fn add_operator(&mut self, caller: &AccountId, operator: AccountId) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| Ok(l.workflow.add_operator(caller, operator, now)?));
        self.settle(result)
    }

    pub fn remove_operator(
        &mut self,
        caller: &AccountId,
        operator: &AccountId,
    ) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| Ok(l.workflow.remove_operator(caller, operator, now)?));
        self.settle(result)
    }

    pub fn submit_claim(
        &mut self,
        actor: &AccountId,
        claim: &ClaimId,
        kind: ActionKind,
        context: ContextHash,
        metadata: Vec<u8>,
    ) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| {
            // A claim id already known to consensus stays with consensus.
            if l.voting.request(claim).is_some() || l.voting.tally(claim) > 0 {
                tracing::warn!(actor = %actor, claim = %claim, "submission of a consensus claim id");
                return Err(VerificationError::AlreadyExists(claim.to_string()).into());
            }
            Ok(l.workflow.submit(actor, claim, kind, context, metadata, now)?)
        });
        self.settle(result)
    }

    pub fn verify_claim(
        &mut self,
        operator: &AccountId,
        claim: &ClaimId,
        delivery_proof: Option<DeliveryProof>,
        additional_proof: Vec<u8>,
    ) -> Result<(), NodeError> {
        let result = self.guarded(|l, now| {
            Ok(l.workflow
                .verify(operator, claim, delivery_proof, additional_proof, now)?)
        });
        self.settle(result)
    }

    pub fn generate_proof_bundle(&mut self, claim: &ClaimId) -> Result<Vec<u8>, NodeError> {
        let result = self.guarded(|l, now| Ok(l.workflow.generate_proof_bundle(claim, now)?));
        self.settle(result)
    }

    // ── Gateway ────────────────────────────────────────────────────────

    pub fn request_approval(
        &mut self,
        requester: &AccountId,
        description: &str,
        payload: &[u8],
    ) -> Result<ClaimId, NodeError> {
        let result = self.guarded(|l, now| {
            Ok(l.gateway
                .request_approval(&mut l.voting, requester, description, payload, now)?)
        });
        self.settle(result)
    }

    pub fn process_action(
        &mut self,
        actor: &AccountId,
        kind: ActionKind,
        approval_proof: &ClaimId,
        reward: TokenAmount,
        metadata_ref: &str,
    ) -> Result<ActionHash, NodeError> {
        let result = self.guarded(|l, now| {
            let approvals = ApprovalRouter::new(&l.voting, &l.workflow);
            Ok(l.gateway.process_action(
                &approvals,
                actor,
                kind,
                approval_proof,
                reward,
                metadata_ref,
                now,
            )?)
        });
        self.settle(result)
    }

    pub fn can_process_action(&self, actor: &AccountId, approval_proof: &ClaimId) -> bool {
        self.is_initialized()
            && self.gateway.can_process_action(
                &self.approvals(),
                actor,
                approval_proof,
                self.clock.now(),
            )
    }

    pub fn create_template(
        &mut self,
        author: &AccountId,
        content_ref: &str,
        approval_proof: &ClaimId,
    ) -> Result<TemplateHash, NodeError> {
        let result = self.guarded(|l, now| {
            let approvals = ApprovalRouter::new(&l.voting, &l.workflow);
            Ok(l.gateway
                .create_template(&approvals, author, content_ref, approval_proof, now)?)
        });
        self.settle(result)
    }

    // ── Queries ────────────────────────────────────────────────────────

    fn approvals(&self) -> ApprovalRouter<'_> {
        ApprovalRouter::new(&self.voting, &self.workflow)
    }

    /// Whether the gateway would treat `claim` as approved.
    pub fn is_approved(&self, claim: &ClaimId) -> bool {
        self.approvals().is_approved(claim)
    }

    pub fn tally(&self, claim: &ClaimId) -> u32 {
        self.voting.tally(claim)
    }

    pub fn threshold(&self) -> u32 {
        self.voting.threshold()
    }

    pub fn claim_status(&self, claim: &ClaimId) -> Option<ClaimStatus> {
        self.workflow.status(claim)
    }

    pub fn record(&self, claim: &ClaimId) -> Option<&CivicActionRecord> {
        self.workflow.record(claim)
    }

    pub fn is_processed(&self, action: &ActionHash) -> bool {
        self.gateway.is_processed(action)
    }

    pub fn rate_limit(&self, actor: &AccountId) -> Option<&RateLimitState> {
        self.gateway.rate_limit(actor)
    }

    pub fn issuer_key(&self) -> &PublicKey {
        self.workflow.issuer_key()
    }

    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    pub fn voting(&self) -> &VotingLedger {
        &self.voting
    }

    pub fn workflow(&self) -> &VerificationWorkflow {
        &self.workflow
    }

    pub fn gateway(&self) -> &ActionGateway {
        &self.gateway
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn metrics(&self) -> Option<&LedgerMetrics> {
        self.metrics.as_ref()
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    // ── Persistence ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            bootstrap: self.bootstrap.clone(),
            voting: self.voting.snapshot(),
            workflow: self.workflow.snapshot(),
            gateway: self.gateway.snapshot(),
        }
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<(), NodeError> {
        snapshot::save_snapshot(path, &self.snapshot())
    }

    // ── Plumbing ───────────────────────────────────────────────────────

    /// Run a steady-state operation at the current clock time.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self, civic_types::Timestamp) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        self.require_initialized()?;
        let now = self.clock.now();
        op(self, now)
    }

    /// Publish drained events on success; count the rejection otherwise.
    fn settle<T>(&mut self, result: Result<T, NodeError>) -> Result<T, NodeError> {
        if let Err(e) = &result {
            tracing::debug!(code = e.code(), error = %e, "operation rejected");
            if let Some(m) = &self.metrics {
                m.reject(e.code());
            }
        }
        let events: Vec<LedgerEvent> = self
            .voting
            .drain_events()
            .into_iter()
            .map(LedgerEvent::from)
            .chain(self.workflow.drain_events().into_iter().map(LedgerEvent::from))
            .chain(self.gateway.drain_events().into_iter().map(LedgerEvent::from))
            .collect();
        for event in events {
            self.publish(event);
        }
        result
    }

    fn publish(&mut self, event: LedgerEvent) {
        if let Some(m) = &self.metrics {
            m.observe(&event);
        }
        self.bus.emit(&event);
        self.audit.append(event);
    }
}
