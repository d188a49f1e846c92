//! Prometheus metrics for the civic ledger.
//!
//! [`LedgerMetrics`] owns a dedicated [`Registry`]; [`LedgerMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::ledger_event::LedgerEvent;
use civic_gateway::GatewayEvent;
use civic_verification::VerificationEvent;

pub struct LedgerMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub votes_cast: IntCounter,
    pub claims_submitted: IntCounter,
    pub claims_verified: IntCounter,
    pub actions_processed: IntCounter,
    pub templates_created: IntCounter,
    /// Reward paid out, in raw token units (truncated to `u64` per action).
    pub rewards_paid: IntCounter,
    /// Rejected operations, labelled by error code.
    pub operations_rejected: IntCounterVec,
}

impl LedgerMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let votes_cast = register_int_counter_with_registry!(
            Opts::new("civic_votes_cast_total", "Total consensus votes cast"),
            registry
        )?;
        let claims_submitted = register_int_counter_with_registry!(
            Opts::new("civic_claims_submitted_total", "Total claims submitted for verification"),
            registry
        )?;
        let claims_verified = register_int_counter_with_registry!(
            Opts::new("civic_claims_verified_total", "Total claims verified by operators"),
            registry
        )?;
        let actions_processed = register_int_counter_with_registry!(
            Opts::new("civic_actions_processed_total", "Total gated actions processed"),
            registry
        )?;
        let templates_created = register_int_counter_with_registry!(
            Opts::new("civic_templates_created_total", "Total templates created"),
            registry
        )?;
        let rewards_paid = register_int_counter_with_registry!(
            Opts::new("civic_rewards_paid_raw_total", "Total reward paid in raw units"),
            registry
        )?;
        let operations_rejected = register_int_counter_vec_with_registry!(
            Opts::new("civic_operations_rejected_total", "Rejected operations by error code"),
            &["code"],
            registry
        )?;

        Ok(Self {
            registry,
            votes_cast,
            claims_submitted,
            claims_verified,
            actions_processed,
            templates_created,
            rewards_paid,
            operations_rejected,
        })
    }

    /// Update counters for one emitted event.
    pub fn observe(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Consensus(civic_consensus::ConsensusEvent::VoteCast { .. }) => {
                self.votes_cast.inc()
            }
            LedgerEvent::Verification(VerificationEvent::ClaimSubmitted { .. }) => {
                self.claims_submitted.inc()
            }
            LedgerEvent::Verification(VerificationEvent::ClaimVerified { .. }) => {
                self.claims_verified.inc()
            }
            LedgerEvent::Gateway(GatewayEvent::ActionProcessed { reward, .. }) => {
                self.actions_processed.inc();
                self.rewards_paid
                    .inc_by(u64::try_from(reward.raw()).unwrap_or(u64::MAX));
            }
            LedgerEvent::Gateway(GatewayEvent::TemplateCreated { .. }) => {
                self.templates_created.inc()
            }
            _ => {}
        }
    }

    pub fn reject(&self, code: &str) {
        self.operations_rejected.with_label_values(&[code]).inc();
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_types::{AccountId, ActionHash, ActionKind, ClaimId, Timestamp, TokenAmount};

    #[test]
    fn counters_follow_events() {
        let metrics = LedgerMetrics::new().unwrap();
        metrics.observe(&LedgerEvent::Gateway(GatewayEvent::ActionProcessed {
            action: ActionHash::new([1; 32]),
            actor: AccountId::new("alice"),
            kind: ActionKind::DirectAction,
            claim: ClaimId::new([2; 32]),
            reward: TokenAmount::new(250),
            at: Timestamp::new(1),
        }));
        metrics.reject("cooldown_active");
        metrics.reject("cooldown_active");

        assert_eq!(metrics.actions_processed.get(), 1);
        assert_eq!(metrics.rewards_paid.get(), 250);
        assert_eq!(
            metrics
                .operations_rejected
                .with_label_values(&["cooldown_active"])
                .get(),
            2
        );
    }

    #[test]
    fn encode_renders_text_format() {
        let metrics = LedgerMetrics::new().unwrap();
        metrics.votes_cast.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("civic_votes_cast_total 1"));
    }
}
