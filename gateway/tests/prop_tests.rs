use proptest::prelude::*;
use std::sync::Arc;

use civic_consensus::VotingLedger;
use civic_gateway::{ActionGateway, ApprovalRouter, GatewayError};
use civic_nullables::{NullIdentityProvider, NullRegistry, NullRewardLedger};
use civic_types::{
    AccountId, ActionKind, ApprovalSource, ClaimBinding, ClaimId, ContextHash, ProtocolParams,
    Timestamp, TokenAmount, DAY_SECS,
};
use civic_verification::VerificationWorkflow;

/// Every claim is approved; isolates the rate-limit and replay gates.
struct AllApproved;

impl ApprovalSource for AllApproved {
    fn is_approved(&self, _claim: &ClaimId) -> bool {
        true
    }
}

fn gateway(cooldown: u64, cap: u32) -> (ActionGateway, Arc<NullRegistry>, Arc<NullRewardLedger>) {
    let mut params = ProtocolParams::civic_defaults();
    params.action_cooldown_secs = cooldown;
    params.daily_action_cap = cap;
    let registry = Arc::new(NullRegistry::new());
    let rewards = Arc::new(NullRewardLedger::new(TokenAmount::from_tokens(1_000_000)));
    let gw = ActionGateway::new(
        AccountId::new("admin"),
        registry.clone(),
        rewards.clone(),
        &params,
    );
    (gw, registry, rewards)
}

fn claim(i: u32) -> ClaimId {
    let mut bytes = [0xAAu8; 32];
    bytes[..4].copy_from_slice(&i.to_be_bytes());
    ClaimId::new(bytes)
}

fn act(gw: &mut ActionGateway, actor: &AccountId, c: ClaimId, at: u64) -> Result<(), GatewayError> {
    gw.process_action(
        &AllApproved,
        actor,
        ActionKind::DirectAction,
        &c,
        TokenAmount::from_tokens(1),
        "meta",
        Timestamp::new(at),
    )
    .map(|_| ())
}

proptest! {
    /// Exactly `cap` actions succeed within one day index; the next one fails
    /// with DailyLimitReached.
    #[test]
    fn daily_cap_is_exact(cap in 1u32..20, day in 1u64..10_000) {
        let (mut gw, registry, _) = gateway(0, cap);
        let actor = AccountId::new("alice");
        let start = day * DAY_SECS;
        for i in 0..cap {
            prop_assert!(act(&mut gw, &actor, claim(i), start + u64::from(i)).is_ok());
        }
        let err = act(&mut gw, &actor, claim(cap), start + u64::from(cap)).unwrap_err();
        prop_assert_eq!(err, GatewayError::DailyLimitReached { day, cap });
        prop_assert_eq!(registry.action_count(), cap as usize);
    }

    /// A second action inside the cooldown window always fails with
    /// CooldownActive, and succeeds once the window has passed.
    #[test]
    fn cooldown_window(cooldown in 1u64..100_000, gap in 0u64..200_000, at in 1u64..1_000_000_000) {
        let (mut gw, _, _) = gateway(cooldown, 1_000);
        let actor = AccountId::new("alice");
        act(&mut gw, &actor, claim(0), at).unwrap();
        let second = act(&mut gw, &actor, claim(1), at + gap);
        if gap < cooldown {
            prop_assert_eq!(second, Err(GatewayError::CooldownActive { retry_after: Timestamp::new(at + cooldown) }));
        } else {
            prop_assert!(second.is_ok());
        }
    }

    /// Replaying an approval claim never succeeds and never pays twice.
    #[test]
    fn replay_pays_once(attempts in 2usize..8, spacing in 0u64..10_000) {
        let (mut gw, _, rewards) = gateway(0, 100);
        let actor = AccountId::new("alice");
        let mut ok = 0;
        for i in 0..attempts {
            match act(&mut gw, &actor, claim(7), 1_000 + i as u64 * spacing) {
                Ok(()) => ok += 1,
                Err(e) => prop_assert!(matches!(e, GatewayError::AlreadyProcessed(_))),
            }
        }
        prop_assert_eq!(ok, 1);
        prop_assert_eq!(rewards.transfer_count(), 1);
    }
}

#[test]
fn exhausted_treasury_rejects_without_consuming() {
    let registry = Arc::new(NullRegistry::new());
    let rewards = Arc::new(NullRewardLedger::new(TokenAmount::from_tokens(1)));
    let mut gw = ActionGateway::new(
        AccountId::new("admin"),
        registry.clone(),
        rewards.clone(),
        &ProtocolParams::civic_defaults(),
    );
    let actor = AccountId::new("alice");
    let reward = TokenAmount::from_tokens(2);
    let result = gw.process_action(
        &AllApproved,
        &actor,
        ActionKind::PolicyAdvocacy,
        &claim(1),
        reward,
        "meta",
        Timestamp::new(5_000),
    );
    assert_eq!(
        result,
        Err(GatewayError::RewardTransferFailed {
            to: "alice".into(),
            amount: reward
        })
    );
    assert!(!gw.is_consumed(&claim(1)));
    assert_eq!(registry.action_count(), 0);

    rewards.refill(TokenAmount::from_tokens(5));
    assert!(gw
        .process_action(
            &AllApproved,
            &actor,
            ActionKind::PolicyAdvocacy,
            &claim(1),
            reward,
            "meta",
            Timestamp::new(5_000),
        )
        .is_ok());
    assert_eq!(rewards.balance(&actor), reward);
}

#[test]
fn router_prefers_workflow_for_its_claims() {
    let admin = AccountId::new("admin");
    let mut voting = VotingLedger::new(admin.clone(), 1);
    voting
        .grant_agent(&admin, AccountId::new("agent"), Timestamp::new(0))
        .unwrap();

    let identity = Arc::new(NullIdentityProvider::new());
    let alice = AccountId::new("alice");
    identity.register(&alice, Timestamp::new(1_000_000));
    let mut workflow = VerificationWorkflow::new(
        admin.clone(),
        AccountId::new("registry"),
        identity,
        civic_crypto::keypair_from_seed(&[3u8; 32]),
        &ProtocolParams::civic_defaults(),
    );
    workflow
        .add_operator(&AccountId::new("registry"), AccountId::new("op"), Timestamp::new(0))
        .unwrap();

    let workflow_claim = claim(1);
    let voted_claim = claim(2);
    workflow
        .submit(
            &alice,
            &workflow_claim,
            ActionKind::DirectAction,
            ContextHash::ZERO,
            Vec::new(),
            Timestamp::new(10),
        )
        .unwrap();
    // Votes on a workflow claim do not stand in for operator verification.
    voting
        .cast_vote(&workflow_claim, &AccountId::new("agent"), Timestamp::new(11))
        .unwrap();
    voting
        .cast_vote(&voted_claim, &AccountId::new("agent"), Timestamp::new(11))
        .unwrap();

    {
        let router = ApprovalRouter::new(&voting, &workflow);
        assert!(!router.is_approved(&workflow_claim));
        assert!(router.is_approved(&voted_claim));
    }

    workflow
        .verify(&AccountId::new("op"), &workflow_claim, None, Vec::new(), Timestamp::new(12))
        .unwrap();
    let router = ApprovalRouter::new(&voting, &workflow);
    assert!(router.is_approved(&workflow_claim));
    assert_eq!(
        router.binding(&workflow_claim),
        Some(ClaimBinding {
            owner: alice,
            kind: Some(ActionKind::DirectAction),
        })
    );
    assert_eq!(router.binding(&voted_claim), None);
}
