//! The action gateway: gate checks, then effects, then state.

use crate::collaborators::{ActionRegistry, RewardLedger};
use crate::error::GatewayError;
use crate::event::GatewayEvent;
use crate::rate_limit::{RateLimitState, RateLimiter};
use crate::replay::ProcessedSet;
use civic_consensus::VotingLedger;
use civic_types::{
    AccountId, ActionHash, ActionKind, ApprovalSource, ClaimId, ProtocolParams, TemplateHash,
    Timestamp, TokenAmount,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Gates side-effecting operations behind approval, replay protection and
/// per-actor rate limits.
///
/// `process_action` is all-or-nothing: every gate is checked first, the
/// reward transfer (the only fallible effect) runs next, and gateway state is
/// committed only once the transfer was accepted.
pub struct ActionGateway {
    controller: AccountId,
    registry: Arc<dyn ActionRegistry>,
    rewards: Arc<dyn RewardLedger>,
    limiter: RateLimiter,
    processed: ProcessedSet,
    pending_events: Vec<GatewayEvent>,
}

impl ActionGateway {
    pub fn new(
        controller: AccountId,
        registry: Arc<dyn ActionRegistry>,
        rewards: Arc<dyn RewardLedger>,
        params: &ProtocolParams,
    ) -> Self {
        Self {
            controller,
            registry,
            rewards,
            limiter: RateLimiter::from_params(params),
            processed: ProcessedSet::new(),
            pending_events: Vec::new(),
        }
    }

    /// The claim must be approved, unspent and, when bound, bound to
    /// `spender` (and to `kind` when both fix one).
    fn check_approval(
        &self,
        approvals: &dyn ApprovalSource,
        spender: &AccountId,
        kind: Option<ActionKind>,
        claim: &ClaimId,
    ) -> Result<(), GatewayError> {
        if !approvals.is_approved(claim) {
            return Err(GatewayError::ConsensusNotApproved(claim.to_string()));
        }
        if let Some(binding) = approvals.binding(claim) {
            if &binding.owner != spender {
                tracing::warn!(spender = %spender, owner = %binding.owner, claim = %claim, "claim spent by non-owner");
                return Err(GatewayError::Unauthorized(spender.to_string()));
            }
            if let (Some(approved), Some(requested)) = (binding.kind, kind) {
                if approved != requested {
                    return Err(GatewayError::KindMismatch {
                        approved,
                        requested,
                    });
                }
            }
        }
        if self.processed.is_consumed(claim) {
            return Err(GatewayError::AlreadyProcessed(claim.to_string()));
        }
        Ok(())
    }

    fn check_gates(
        &self,
        approvals: &dyn ApprovalSource,
        actor: &AccountId,
        kind: Option<ActionKind>,
        claim: &ClaimId,
        action: Option<&ActionHash>,
        now: Timestamp,
    ) -> Result<(), GatewayError> {
        self.check_approval(approvals, actor, kind, claim)?;
        if let Some(action) = action.filter(|a| self.processed.is_processed(a)) {
            return Err(GatewayError::AlreadyProcessed(action.to_string()));
        }
        self.limiter.check(actor, now)
    }

    /// Record an approved civic action and pay its reward.
    #[allow(clippy::too_many_arguments)]
    pub fn process_action(
        &mut self,
        approvals: &dyn ApprovalSource,
        actor: &AccountId,
        kind: ActionKind,
        approval_proof: &ClaimId,
        reward: TokenAmount,
        metadata_ref: &str,
        now: Timestamp,
    ) -> Result<ActionHash, GatewayError> {
        let action = civic_crypto::derive_action_hash(actor, kind, approval_proof, now);
        if let Err(e) =
            self.check_gates(approvals, actor, Some(kind), approval_proof, Some(&action), now)
        {
            tracing::debug!(actor = %actor, claim = %approval_proof, code = e.code(), "action rejected");
            return Err(e);
        }

        if !reward.is_zero() && !self.rewards.transfer(actor, reward) {
            tracing::warn!(actor = %actor, %reward, "reward transfer refused");
            return Err(GatewayError::RewardTransferFailed {
                to: actor.to_string(),
                amount: reward,
            });
        }
        self.registry
            .record_action(actor, kind, approval_proof, reward, metadata_ref);

        self.processed.mark(action, *approval_proof);
        self.limiter.record(actor, now);

        tracing::debug!(action = %action, actor = %actor, %kind, %reward, "action processed");
        self.pending_events.push(GatewayEvent::ActionProcessed {
            action,
            actor: actor.clone(),
            kind,
            claim: *approval_proof,
            reward,
            at: now,
        });
        Ok(action)
    }

    /// Whether `process_action` would pass every gate right now.
    pub fn can_process_action(
        &self,
        approvals: &dyn ApprovalSource,
        actor: &AccountId,
        approval_proof: &ClaimId,
        now: Timestamp,
    ) -> bool {
        self.check_gates(approvals, actor, None, approval_proof, None, now)
            .is_ok()
    }

    /// Open a consensus request on the voting ledger. Anyone may ask.
    pub fn request_approval(
        &mut self,
        voting: &mut VotingLedger,
        requester: &AccountId,
        description: &str,
        payload: &[u8],
        now: Timestamp,
    ) -> Result<ClaimId, GatewayError> {
        let claim = voting.open_request(requester, description, payload, now)?;
        self.pending_events.push(GatewayEvent::ApprovalRequested {
            claim,
            requester: requester.clone(),
            at: now,
        });
        Ok(claim)
    }

    /// Create a template on an approved, unspent claim. Spends the claim.
    pub fn create_template(
        &mut self,
        approvals: &dyn ApprovalSource,
        author: &AccountId,
        content_ref: &str,
        approval_proof: &ClaimId,
        now: Timestamp,
    ) -> Result<TemplateHash, GatewayError> {
        self.check_approval(approvals, author, None, approval_proof)?;

        let template = self.registry.create_template(author, content_ref);
        self.processed.consume(*approval_proof);

        tracing::debug!(template = %template, author = %author, "template created");
        self.pending_events.push(GatewayEvent::TemplateCreated {
            template,
            author: author.clone(),
            claim: *approval_proof,
            at: now,
        });
        Ok(template)
    }

    fn require_controller(&self, caller: &AccountId) -> Result<(), GatewayError> {
        if caller != &self.controller {
            tracing::warn!(caller = %caller, "rejected gateway control call");
            return Err(GatewayError::Unauthorized(caller.to_string()));
        }
        Ok(())
    }

    /// Apply the gateway share of a parameter set.
    pub fn configure(
        &mut self,
        caller: &AccountId,
        params: &ProtocolParams,
    ) -> Result<(), GatewayError> {
        self.require_controller(caller)?;
        self.limiter.configure(params);
        Ok(())
    }

    pub fn transfer_control(
        &mut self,
        caller: &AccountId,
        new_controller: AccountId,
    ) -> Result<(), GatewayError> {
        self.require_controller(caller)?;
        tracing::info!(from = %self.controller, to = %new_controller, "gateway control transferred");
        self.controller = new_controller;
        Ok(())
    }

    pub fn controller(&self) -> &AccountId {
        &self.controller
    }

    pub fn is_processed(&self, action: &ActionHash) -> bool {
        self.processed.is_processed(action)
    }

    pub fn is_consumed(&self, claim: &ClaimId) -> bool {
        self.processed.is_consumed(claim)
    }

    pub fn processed_count(&self) -> usize {
        self.processed.action_count()
    }

    pub fn rate_limit(&self, actor: &AccountId) -> Option<&RateLimitState> {
        self.limiter.state(actor)
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.limiter.cooldown_secs()
    }

    pub fn daily_cap(&self) -> u32 {
        self.limiter.daily_cap()
    }

    /// Drain pending events for the caller to publish.
    pub fn drain_events(&mut self) -> Vec<GatewayEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn snapshot(&self) -> GatewaySnapshot {
        GatewaySnapshot {
            controller: self.controller.clone(),
            cooldown_secs: self.limiter.cooldown_secs(),
            daily_cap: self.limiter.daily_cap(),
            rate_limits: self
                .limiter
                .states()
                .map(|(a, s)| (a.clone(), s.clone()))
                .collect(),
            processed: self.processed.clone(),
        }
    }

    /// Rebuild from a snapshot with fresh collaborators.
    pub fn restore(
        snapshot: GatewaySnapshot,
        registry: Arc<dyn ActionRegistry>,
        rewards: Arc<dyn RewardLedger>,
    ) -> Self {
        Self {
            controller: snapshot.controller,
            registry,
            rewards,
            limiter: RateLimiter::restore(
                snapshot.cooldown_secs,
                snapshot.daily_cap,
                snapshot.rate_limits,
            ),
            processed: snapshot.processed,
            pending_events: Vec::new(),
        }
    }
}

/// Serializable gateway state for persistence across restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    pub controller: AccountId,
    pub cooldown_secs: u64,
    pub daily_cap: u32,
    pub rate_limits: BTreeMap<AccountId, RateLimitState>,
    pub processed: ProcessedSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_types::ClaimBinding;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct Approved(HashSet<ClaimId>);

    impl ApprovalSource for Approved {
        fn is_approved(&self, claim: &ClaimId) -> bool {
            self.0.contains(claim)
        }
    }

    #[derive(Default)]
    struct Registry {
        actions: Mutex<Vec<(AccountId, ClaimId, TokenAmount)>>,
    }

    impl ActionRegistry for Registry {
        fn record_action(
            &self,
            actor: &AccountId,
            _kind: ActionKind,
            proof_ref: &ClaimId,
            amount: TokenAmount,
            _metadata_ref: &str,
        ) {
            self.actions
                .lock()
                .unwrap()
                .push((actor.clone(), *proof_ref, amount));
        }

        fn create_template(&self, author: &AccountId, content_ref: &str) -> TemplateHash {
            civic_crypto::derive_template_hash(author, content_ref)
        }
    }

    struct Rewards {
        accept: AtomicBool,
        paid: Mutex<Vec<TokenAmount>>,
    }

    impl RewardLedger for Rewards {
        fn transfer(&self, _to: &AccountId, amount: TokenAmount) -> bool {
            if !self.accept.load(Ordering::SeqCst) {
                return false;
            }
            self.paid.lock().unwrap().push(amount);
            true
        }
    }

    const T0: u64 = 1_700_000_000;

    fn claim(b: u8) -> ClaimId {
        ClaimId::new([b; 32])
    }

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn setup() -> (ActionGateway, Arc<Registry>, Arc<Rewards>) {
        let registry = Arc::new(Registry::default());
        let rewards = Arc::new(Rewards {
            accept: AtomicBool::new(true),
            paid: Mutex::new(Vec::new()),
        });
        let gw = ActionGateway::new(
            AccountId::new("admin"),
            registry.clone(),
            rewards.clone(),
            &ProtocolParams::civic_defaults(),
        );
        (gw, registry, rewards)
    }

    fn approved(claims: &[u8]) -> Approved {
        Approved(claims.iter().map(|&b| claim(b)).collect())
    }

    fn process(gw: &mut ActionGateway, approvals: &dyn ApprovalSource, c: u8, at: u64) -> Result<ActionHash, GatewayError> {
        gw.process_action(
            approvals,
            &alice(),
            ActionKind::DirectAction,
            &claim(c),
            TokenAmount::from_tokens(5),
            "ipfs://meta",
            Timestamp::new(at),
        )
    }

    #[test]
    fn unapproved_claim_rejected() {
        let (mut gw, registry, _) = setup();
        let err = process(&mut gw, &approved(&[]), 1, T0).unwrap_err();
        assert!(matches!(err, GatewayError::ConsensusNotApproved(_)));
        assert!(registry.actions.lock().unwrap().is_empty());
    }

    #[test]
    fn approved_claim_processes_once() {
        let (mut gw, registry, rewards) = setup();
        let approvals = approved(&[1]);
        let action = process(&mut gw, &approvals, 1, T0).unwrap();
        assert!(gw.is_processed(&action));
        assert!(gw.is_consumed(&claim(1)));

        // Replay beats the cooldown check.
        let err = process(&mut gw, &approvals, 1, T0 + 1).unwrap_err();
        assert!(matches!(err, GatewayError::AlreadyProcessed(_)));
        let err = process(&mut gw, &approvals, 1, T0 + 10_000).unwrap_err();
        assert!(matches!(err, GatewayError::AlreadyProcessed(_)));

        assert_eq!(registry.actions.lock().unwrap().len(), 1);
        assert_eq!(rewards.paid.lock().unwrap().len(), 1);
    }

    #[test]
    fn cooldown_then_success() {
        let (mut gw, _, _) = setup();
        let approvals = approved(&[1, 2]);
        process(&mut gw, &approvals, 1, T0).unwrap();
        assert_eq!(
            process(&mut gw, &approvals, 2, T0 + 10).unwrap_err(),
            GatewayError::CooldownActive {
                retry_after: Timestamp::new(T0 + 3600)
            }
        );
        assert!(!gw.can_process_action(&approvals, &alice(), &claim(2), Timestamp::new(T0 + 10)));
        assert!(gw.can_process_action(&approvals, &alice(), &claim(2), Timestamp::new(T0 + 3600)));
        process(&mut gw, &approvals, 2, T0 + 3600).unwrap();
    }

    #[test]
    fn rejected_reward_leaves_state_untouched() {
        let (mut gw, registry, rewards) = setup();
        rewards.accept.store(false, Ordering::SeqCst);
        let approvals = approved(&[1]);
        let err = process(&mut gw, &approvals, 1, T0).unwrap_err();
        assert!(matches!(err, GatewayError::RewardTransferFailed { .. }));
        assert!(!gw.is_consumed(&claim(1)));
        assert!(gw.rate_limit(&alice()).is_none());
        assert!(registry.actions.lock().unwrap().is_empty());
        assert!(gw.drain_events().is_empty());

        rewards.accept.store(true, Ordering::SeqCst);
        process(&mut gw, &approvals, 1, T0).unwrap();
    }

    #[test]
    fn zero_reward_skips_transfer() {
        let (mut gw, registry, rewards) = setup();
        rewards.accept.store(false, Ordering::SeqCst);
        gw.process_action(
            &approved(&[1]),
            &alice(),
            ActionKind::CommunityOrganizing,
            &claim(1),
            TokenAmount::ZERO,
            "",
            Timestamp::new(T0),
        )
        .unwrap();
        assert_eq!(registry.actions.lock().unwrap().len(), 1);
        assert!(rewards.paid.lock().unwrap().is_empty());
    }

    #[test]
    fn template_spends_its_claim() {
        let (mut gw, _, _) = setup();
        let approvals = approved(&[4]);
        let template = gw
            .create_template(&approvals, &alice(), "ipfs://tpl", &claim(4), Timestamp::new(T0))
            .unwrap();
        assert_eq!(
            template,
            civic_crypto::derive_template_hash(&alice(), "ipfs://tpl")
        );
        let err = gw
            .create_template(&approvals, &alice(), "ipfs://tpl2", &claim(4), Timestamp::new(T0))
            .unwrap_err();
        assert!(matches!(err, GatewayError::AlreadyProcessed(_)));
        // A spent claim cannot be reused for an action either.
        assert!(matches!(
            process(&mut gw, &approvals, 4, T0),
            Err(GatewayError::AlreadyProcessed(_))
        ));
    }

    #[test]
    fn request_approval_forwards_to_voting() {
        let (mut gw, _, _) = setup();
        let mut voting = VotingLedger::new(AccountId::new("admin"), 2);
        let claim = gw
            .request_approval(&mut voting, &alice(), "fund", b"payload", Timestamp::new(T0))
            .unwrap();
        assert!(voting.request(&claim).is_some());
        assert_eq!(
            gw.drain_events(),
            vec![GatewayEvent::ApprovalRequested {
                claim,
                requester: alice(),
                at: Timestamp::new(T0),
            }]
        );
    }

    #[test]
    fn configure_is_controller_only() {
        let (mut gw, _, _) = setup();
        let mut params = ProtocolParams::civic_defaults();
        params.daily_action_cap = 1;
        assert!(matches!(
            gw.configure(&alice(), &params),
            Err(GatewayError::Unauthorized(_))
        ));
        gw.configure(&AccountId::new("admin"), &params).unwrap();
        assert_eq!(gw.daily_cap(), 1);

        gw.transfer_control(&AccountId::new("admin"), AccountId::new("council"))
            .unwrap();
        assert!(gw.configure(&AccountId::new("admin"), &params).is_err());
    }

    #[test]
    fn snapshot_restore_preserves_replay_and_limits() {
        let (mut gw, registry, rewards) = setup();
        let approvals = approved(&[1, 2]);
        process(&mut gw, &approvals, 1, T0).unwrap();

        let bytes = bincode::serialize(&gw.snapshot()).unwrap();
        let snapshot: GatewaySnapshot = bincode::deserialize(&bytes).unwrap();
        let mut restored = ActionGateway::restore(snapshot, registry, rewards);

        assert!(matches!(
            process(&mut restored, &approvals, 1, T0 + 7200),
            Err(GatewayError::AlreadyProcessed(_))
        ));
        assert!(matches!(
            process(&mut restored, &approvals, 2, T0 + 5),
            Err(GatewayError::CooldownActive { .. })
        ));
    }

    struct Bound(ClaimId, ClaimBinding);

    impl ApprovalSource for Bound {
        fn is_approved(&self, claim: &ClaimId) -> bool {
            claim == &self.0
        }

        fn binding(&self, claim: &ClaimId) -> Option<ClaimBinding> {
            (claim == &self.0).then(|| self.1.clone())
        }
    }

    fn bound_to_alice(kind: Option<ActionKind>) -> Bound {
        Bound(
            claim(6),
            ClaimBinding {
                owner: alice(),
                kind,
            },
        )
    }

    #[test]
    fn bound_claim_rejects_another_actor() {
        let (mut gw, registry, rewards) = setup();
        let approvals = bound_to_alice(Some(ActionKind::DirectAction));
        let mallory = AccountId::new("mallory");

        let err = gw
            .process_action(
                &approvals,
                &mallory,
                ActionKind::DirectAction,
                &claim(6),
                TokenAmount::from_tokens(5),
                "",
                Timestamp::new(T0),
            )
            .unwrap_err();
        assert_eq!(err, GatewayError::Unauthorized("mallory".into()));
        assert!(!gw.can_process_action(&approvals, &mallory, &claim(6), Timestamp::new(T0)));
        assert!(rewards.paid.lock().unwrap().is_empty());
        assert!(!gw.is_consumed(&claim(6)));

        // The owner can still spend it.
        process(&mut gw, &approvals, 6, T0).unwrap();
        assert_eq!(registry.actions.lock().unwrap().len(), 1);
    }

    #[test]
    fn bound_claim_rejects_another_kind() {
        let (mut gw, _, rewards) = setup();
        let approvals = bound_to_alice(Some(ActionKind::PolicyAdvocacy));

        let err = process(&mut gw, &approvals, 6, T0).unwrap_err();
        assert_eq!(
            err,
            GatewayError::KindMismatch {
                approved: ActionKind::PolicyAdvocacy,
                requested: ActionKind::DirectAction,
            }
        );
        assert_eq!(err.code(), "kind_mismatch");
        assert!(rewards.paid.lock().unwrap().is_empty());
        assert!(!gw.is_consumed(&claim(6)));
    }

    #[test]
    fn bound_claim_template_needs_the_owner() {
        let (mut gw, _, _) = setup();
        let approvals = bound_to_alice(None);
        let err = gw
            .create_template(
                &approvals,
                &AccountId::new("mallory"),
                "ipfs://tpl",
                &claim(6),
                Timestamp::new(T0),
            )
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
        gw.create_template(&approvals, &alice(), "ipfs://tpl", &claim(6), Timestamp::new(T0))
            .unwrap();
        assert!(gw.is_consumed(&claim(6)));
    }
}
