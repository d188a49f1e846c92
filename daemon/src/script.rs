//! Operation scripts for `civic-daemon replay`.
//!
//! A script is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   { "op": "initialize", "caller": "deployer" },
//!   { "op": "grant_agent", "caller": "consensus", "agent": "a1" },
//!   { "op": "request_approval", "requester": "alice", "description": "fund", "payload": "x", "bind": "req" },
//!   { "op": "cast_vote", "agent": "a1", "claim": "@req" }
//! ]
//! ```
//!
//! Claim references are resolved by [`Bindings::resolve`]: 64 hex characters
//! name a claim directly, `@name` refers to a claim bound by an earlier step,
//! and anything else is hashed into a stable claim id.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use civic_node::{CivicLedger, NodeError};
use civic_nullables::{NullClock, NullIdentityProvider};
use civic_types::{
    AccountId, ActionKind, ClaimId, Clock, ContextHash, IdentityAttribute, Timestamp, TokenAmount,
};
use civic_verification::DeliveryProof;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Initialize {
        caller: AccountId,
    },
    AcceptValue {
        amount: u128,
    },
    AdvanceClock {
        secs: u64,
    },
    RegisterIdentity {
        actor: AccountId,
        /// Attestation lifetime from the current clock time.
        valid_for_secs: u64,
        #[serde(default)]
        attributes: Option<Vec<IdentityAttribute>>,
    },
    ExpireIdentity {
        actor: AccountId,
    },
    GrantAgent {
        caller: AccountId,
        agent: AccountId,
    },
    RevokeAgent {
        caller: AccountId,
        agent: AccountId,
    },
    SetThreshold {
        caller: AccountId,
        threshold: u32,
    },
    CastVote {
        agent: AccountId,
        claim: String,
    },
    AddOperator {
        caller: AccountId,
        operator: AccountId,
    },
    RemoveOperator {
        caller: AccountId,
        operator: AccountId,
    },
    Submit {
        actor: AccountId,
        claim: String,
        kind: ActionKind,
        #[serde(default)]
        context: Option<ContextHash>,
        #[serde(default)]
        metadata: String,
    },
    Verify {
        operator: AccountId,
        claim: String,
        #[serde(default)]
        delivery: Option<DeliverySpec>,
        #[serde(default)]
        additional_proof: String,
    },
    ProofBundle {
        claim: String,
    },
    RequestApproval {
        requester: AccountId,
        description: String,
        #[serde(default)]
        payload: String,
        #[serde(default)]
        bind: Option<String>,
    },
    ProcessAction {
        actor: AccountId,
        kind: ActionKind,
        claim: String,
        /// Raw token units.
        #[serde(default)]
        reward: u128,
        #[serde(default)]
        metadata_ref: String,
    },
    CreateTemplate {
        author: AccountId,
        content_ref: String,
        claim: String,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::AcceptValue { .. } => "accept_value",
            Self::AdvanceClock { .. } => "advance_clock",
            Self::RegisterIdentity { .. } => "register_identity",
            Self::ExpireIdentity { .. } => "expire_identity",
            Self::GrantAgent { .. } => "grant_agent",
            Self::RevokeAgent { .. } => "revoke_agent",
            Self::SetThreshold { .. } => "set_threshold",
            Self::CastVote { .. } => "cast_vote",
            Self::AddOperator { .. } => "add_operator",
            Self::RemoveOperator { .. } => "remove_operator",
            Self::Submit { .. } => "submit",
            Self::Verify { .. } => "verify",
            Self::ProofBundle { .. } => "proof_bundle",
            Self::RequestApproval { .. } => "request_approval",
            Self::ProcessAction { .. } => "process_action",
            Self::CreateTemplate { .. } => "create_template",
        }
    }
}

/// Delivery receipt as written in a script. `delivered_at` defaults to now.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySpec {
    pub message_id: String,
    pub recipient_id: String,
    #[serde(default)]
    pub proof: String,
    #[serde(default)]
    pub delivered_at: Option<u64>,
}

pub fn parse(json: &str) -> anyhow::Result<Vec<Step>> {
    serde_json::from_str(json).context("script must be a JSON array of steps")
}

/// Claim names bound by earlier steps.
#[derive(Default)]
pub struct Bindings {
    names: HashMap<String, ClaimId>,
}

impl Bindings {
    pub fn resolve(&self, reference: &str) -> anyhow::Result<ClaimId> {
        if let Some(name) = reference.strip_prefix('@') {
            return self
                .names
                .get(name)
                .copied()
                .ok_or_else(|| anyhow!("unbound claim reference @{name}"));
        }
        if let Ok(claim) = reference.parse::<ClaimId>() {
            return Ok(claim);
        }
        Ok(ClaimId::new(civic_crypto::blake2b_256(reference.as_bytes())))
    }

    pub fn bind(&mut self, name: String, claim: ClaimId) {
        self.names.insert(name, claim);
    }
}

/// The replay environment: the ledger plus the nullables the script can steer.
pub struct Replay {
    pub ledger: CivicLedger,
    pub clock: std::sync::Arc<NullClock>,
    pub identity: std::sync::Arc<NullIdentityProvider>,
    pub bindings: Bindings,
}

/// Outcome of one step: a JSON result, a ledger rejection, or a script error.
pub enum StepOutcome {
    Ok(Value),
    Rejected(NodeError),
}

impl Replay {
    /// Run one step. A script error (bad claim reference) aborts the replay;
    /// a ledger rejection is reported and the replay continues.
    pub fn run(&mut self, step: Step) -> anyhow::Result<StepOutcome> {
        let now = self.clock.now();
        let result: Result<Value, NodeError> = match step {
            Step::Initialize { caller } => self
                .ledger
                .initialize(&caller)
                .map(|p| json!({ "vote_threshold": p.vote_threshold })),
            Step::AcceptValue { amount } => self
                .ledger
                .accept_value(TokenAmount::new(amount))
                .map(|_| Value::Null),
            Step::AdvanceClock { secs } => {
                self.clock.advance(secs);
                Ok(json!({ "now": self.clock.now().as_secs() }))
            }
            Step::RegisterIdentity {
                actor,
                valid_for_secs,
                attributes,
            } => {
                let expires_at = now.plus(valid_for_secs);
                match attributes {
                    Some(attrs) => self.identity.register_with(&actor, &attrs, expires_at),
                    None => self.identity.register(&actor, expires_at),
                }
                Ok(json!({ "expires_at": expires_at.as_secs() }))
            }
            Step::ExpireIdentity { actor } => {
                self.identity.expire(&actor, now);
                Ok(Value::Null)
            }
            Step::GrantAgent { caller, agent } => {
                self.ledger.grant_agent(&caller, agent).map(|_| Value::Null)
            }
            Step::RevokeAgent { caller, agent } => {
                self.ledger.revoke_agent(&caller, &agent).map(|_| Value::Null)
            }
            Step::SetThreshold { caller, threshold } => self
                .ledger
                .set_threshold(&caller, threshold)
                .map(|_| Value::Null),
            Step::CastVote { agent, claim } => {
                let claim = self.bindings.resolve(&claim)?;
                self.ledger.cast_vote(&agent, &claim).map(|tally| {
                    json!({ "tally": tally, "approved": self.ledger.is_approved(&claim) })
                })
            }
            Step::AddOperator { caller, operator } => {
                self.ledger.add_operator(&caller, operator).map(|_| Value::Null)
            }
            Step::RemoveOperator { caller, operator } => self
                .ledger
                .remove_operator(&caller, &operator)
                .map(|_| Value::Null),
            Step::Submit {
                actor,
                claim,
                kind,
                context,
                metadata,
            } => {
                let claim = self.bindings.resolve(&claim)?;
                self.ledger
                    .submit_claim(
                        &actor,
                        &claim,
                        kind,
                        context.unwrap_or_default(),
                        metadata.into_bytes(),
                    )
                    .map(|_| json!({ "claim": claim }))
            }
            Step::Verify {
                operator,
                claim,
                delivery,
                additional_proof,
            } => {
                let claim = self.bindings.resolve(&claim)?;
                let delivery = delivery.map(|d| DeliveryProof {
                    message_id: d.message_id,
                    proof: d.proof.into_bytes(),
                    recipient_id: d.recipient_id,
                    delivered_at: d.delivered_at.map(Timestamp::new).unwrap_or(now),
                });
                self.ledger
                    .verify_claim(&operator, &claim, delivery, additional_proof.into_bytes())
                    .map(|_| Value::Null)
            }
            Step::ProofBundle { claim } => {
                let claim = self.bindings.resolve(&claim)?;
                self.ledger
                    .generate_proof_bundle(&claim)
                    .map(|bytes| json!({ "len": bytes.len(), "bundle": hex::encode(&bytes) }))
            }
            Step::RequestApproval {
                requester,
                description,
                payload,
                bind,
            } => {
                let result =
                    self.ledger
                        .request_approval(&requester, &description, payload.as_bytes());
                if let (Ok(claim), Some(name)) = (&result, bind) {
                    self.bindings.bind(name, *claim);
                }
                result.map(|claim| json!({ "claim": claim }))
            }
            Step::ProcessAction {
                actor,
                kind,
                claim,
                reward,
                metadata_ref,
            } => {
                let claim = self.bindings.resolve(&claim)?;
                self.ledger
                    .process_action(&actor, kind, &claim, TokenAmount::new(reward), &metadata_ref)
                    .map(|action| json!({ "action": action }))
            }
            Step::CreateTemplate {
                author,
                content_ref,
                claim,
            } => {
                let claim = self.bindings.resolve(&claim)?;
                self.ledger
                    .create_template(&author, &content_ref, &claim)
                    .map(|template| json!({ "template": template }))
            }
        };
        Ok(match result {
            Ok(v) => StepOutcome::Ok(v),
            Err(e) => StepOutcome::Rejected(e),
        })
    }
}
