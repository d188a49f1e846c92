//! The voting ledger: per-claim vote records and derived approval.

use crate::error::ConsensusError;
use crate::event::ConsensusEvent;
use crate::request::ApprovalRequest;
use civic_types::{
    AccountId, ApprovalSource, CapabilitySet, ClaimBinding, ClaimId, ProtocolParams, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Tracks which agents voted on which claims and answers "is claim X approved?".
///
/// Votes are kept per agent per claim rather than as bare counters: a counter
/// cannot tell one agent voting twice from two agents voting once.
pub struct VotingLedger {
    /// The single identity allowed to change the threshold and the agent set.
    controller: AccountId,
    threshold: u32,
    agents: CapabilitySet,
    /// claim → distinct agents who voted on it.
    votes: HashMap<ClaimId, BTreeSet<AccountId>>,
    requests: HashMap<ClaimId, ApprovalRequest>,
    /// Monotonic counter mixed into request ids.
    request_nonce: u64,
    pending_events: Vec<ConsensusEvent>,
}

impl VotingLedger {
    pub fn new(controller: AccountId, threshold: u32) -> Self {
        Self {
            controller,
            threshold: threshold.max(1),
            agents: CapabilitySet::new(),
            votes: HashMap::new(),
            requests: HashMap::new(),
            request_nonce: 0,
            pending_events: Vec::new(),
        }
    }

    fn require_controller(&self, caller: &AccountId) -> Result<(), ConsensusError> {
        if caller != &self.controller {
            tracing::warn!(caller = %caller, "rejected privileged consensus call");
            return Err(ConsensusError::Unauthorized(caller.to_string()));
        }
        Ok(())
    }

    /// Record `agent`'s vote on `claim`.
    pub fn cast_vote(
        &mut self,
        claim: &ClaimId,
        agent: &AccountId,
        now: Timestamp,
    ) -> Result<u32, ConsensusError> {
        if !self.agents.contains(agent) {
            return Err(ConsensusError::Unauthorized(agent.to_string()));
        }
        if claim.is_zero() {
            return Err(ConsensusError::InvalidClaim);
        }
        let voters = self.votes.entry(*claim).or_default();
        if !voters.insert(agent.clone()) {
            return Err(ConsensusError::DuplicateVote {
                agent: agent.to_string(),
                claim: claim.to_string(),
            });
        }
        let tally = voters.len() as u32;
        tracing::debug!(claim = %claim, agent = %agent, tally, "vote cast");
        self.pending_events.push(ConsensusEvent::VoteCast {
            claim: *claim,
            agent: agent.clone(),
            tally,
            at: now,
        });
        Ok(tally)
    }

    /// Number of distinct agents who voted on `claim`.
    pub fn tally(&self, claim: &ClaimId) -> u32 {
        self.votes.get(claim).map_or(0, |v| v.len() as u32)
    }

    pub fn has_voted(&self, claim: &ClaimId, agent: &AccountId) -> bool {
        self.votes.get(claim).is_some_and(|v| v.contains(agent))
    }

    /// Whether `claim` has reached the current threshold.
    pub fn is_approved(&self, claim: &ClaimId) -> bool {
        self.tally(claim) >= self.threshold
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Change the approval threshold. Applies to every claim on the next read.
    pub fn set_threshold(
        &mut self,
        caller: &AccountId,
        threshold: u32,
        now: Timestamp,
    ) -> Result<(), ConsensusError> {
        self.require_controller(caller)?;
        if threshold == 0 {
            return Err(ConsensusError::InvalidThreshold(threshold));
        }
        let old = std::mem::replace(&mut self.threshold, threshold);
        tracing::info!(old, new = threshold, "vote threshold changed");
        self.pending_events.push(ConsensusEvent::ThresholdChanged {
            old,
            new: threshold,
            at: now,
        });
        Ok(())
    }

    /// Apply the consensus share of a parameter set.
    pub fn configure(
        &mut self,
        caller: &AccountId,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<(), ConsensusError> {
        self.set_threshold(caller, params.vote_threshold, now)
    }

    pub fn grant_agent(
        &mut self,
        caller: &AccountId,
        agent: AccountId,
        now: Timestamp,
    ) -> Result<(), ConsensusError> {
        self.require_controller(caller)?;
        if self.agents.grant(agent.clone()) {
            self.pending_events
                .push(ConsensusEvent::AgentGranted { agent, at: now });
        }
        Ok(())
    }

    /// Remove an agent. Votes it already cast keep counting.
    pub fn revoke_agent(
        &mut self,
        caller: &AccountId,
        agent: &AccountId,
        now: Timestamp,
    ) -> Result<(), ConsensusError> {
        self.require_controller(caller)?;
        if self.agents.revoke(agent) {
            self.pending_events.push(ConsensusEvent::AgentRevoked {
                agent: agent.clone(),
                at: now,
            });
        }
        Ok(())
    }

    pub fn is_agent(&self, who: &AccountId) -> bool {
        self.agents.contains(who)
    }

    pub fn controller(&self) -> &AccountId {
        &self.controller
    }

    /// Hand the controller role to another identity.
    pub fn transfer_control(
        &mut self,
        caller: &AccountId,
        new_controller: AccountId,
    ) -> Result<(), ConsensusError> {
        self.require_controller(caller)?;
        tracing::info!(from = %self.controller, to = %new_controller, "consensus control transferred");
        self.controller = new_controller;
        Ok(())
    }

    /// Open a new consensus request and return its claim id.
    pub fn open_request(
        &mut self,
        requester: &AccountId,
        description: &str,
        payload: &[u8],
        now: Timestamp,
    ) -> Result<ClaimId, ConsensusError> {
        let claim = civic_crypto::derive_request_id(
            requester,
            description,
            payload,
            now,
            self.request_nonce,
        );
        if self.requests.contains_key(&claim) || self.votes.contains_key(&claim) {
            return Err(ConsensusError::AlreadyExists(claim.to_string()));
        }
        self.request_nonce += 1;
        self.requests.insert(
            claim,
            ApprovalRequest {
                claim,
                requester: requester.clone(),
                description: description.to_string(),
                payload_hash: civic_crypto::blake2b_256(payload),
                opened_at: now,
            },
        );
        tracing::debug!(claim = %claim, requester = %requester, "consensus request opened");
        self.pending_events.push(ConsensusEvent::RequestOpened {
            claim,
            requester: requester.clone(),
            at: now,
        });
        Ok(claim)
    }

    pub fn request(&self, claim: &ClaimId) -> Option<&ApprovalRequest> {
        self.requests.get(claim)
    }

    /// Drain pending events for the caller to publish.
    pub fn drain_events(&mut self) -> Vec<ConsensusEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn snapshot(&self) -> VotingSnapshot {
        VotingSnapshot {
            controller: self.controller.clone(),
            threshold: self.threshold,
            agents: self.agents.clone(),
            votes: self.votes.clone(),
            requests: self.requests.clone(),
            request_nonce: self.request_nonce,
        }
    }

    pub fn restore(snapshot: VotingSnapshot) -> Self {
        Self {
            controller: snapshot.controller,
            threshold: snapshot.threshold.max(1),
            agents: snapshot.agents,
            votes: snapshot.votes,
            requests: snapshot.requests,
            request_nonce: snapshot.request_nonce,
            pending_events: Vec::new(),
        }
    }
}

impl ApprovalSource for VotingLedger {
    fn is_approved(&self, claim: &ClaimId) -> bool {
        VotingLedger::is_approved(self, claim)
    }

    /// A claim opened through a request is spendable only by its requester.
    fn binding(&self, claim: &ClaimId) -> Option<ClaimBinding> {
        self.requests.get(claim).map(|r| ClaimBinding {
            owner: r.requester.clone(),
            kind: None,
        })
    }
}

/// Serializable voting state for persistence across restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotingSnapshot {
    pub controller: AccountId,
    pub threshold: u32,
    pub agents: CapabilitySet,
    pub votes: HashMap<ClaimId, BTreeSet<AccountId>>,
    pub requests: HashMap<ClaimId, ApprovalRequest>,
    pub request_nonce: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s)
    }

    fn claim(b: u8) -> ClaimId {
        ClaimId::new([b; 32])
    }

    fn ledger_with_agents(agents: &[&str]) -> VotingLedger {
        let mut ledger = VotingLedger::new(id("admin"), 2);
        for a in agents {
            ledger.grant_agent(&id("admin"), id(a), Timestamp::new(0)).unwrap();
        }
        ledger.drain_events();
        ledger
    }

    #[test]
    fn threshold_scenario() {
        let mut ledger = ledger_with_agents(&["a1", "a2", "a3"]);
        let k = claim(7);
        let now = Timestamp::new(100);

        ledger.cast_vote(&k, &id("a1"), now).unwrap();
        assert!(!ledger.is_approved(&k));

        ledger.cast_vote(&k, &id("a2"), now).unwrap();
        assert!(ledger.is_approved(&k));

        ledger.cast_vote(&k, &id("a3"), now).unwrap();
        assert_eq!(ledger.tally(&k), 3);
        assert!(ledger.is_approved(&k));
    }

    #[test]
    fn duplicate_vote_rejected_without_changing_tally() {
        let mut ledger = ledger_with_agents(&["a1"]);
        let k = claim(1);
        ledger.cast_vote(&k, &id("a1"), Timestamp::new(1)).unwrap();
        let err = ledger.cast_vote(&k, &id("a1"), Timestamp::new(2)).unwrap_err();
        assert!(matches!(err, ConsensusError::DuplicateVote { .. }));
        assert_eq!(ledger.tally(&k), 1);
    }

    #[test]
    fn same_agent_may_vote_on_different_claims() {
        let mut ledger = ledger_with_agents(&["a1"]);
        ledger.cast_vote(&claim(1), &id("a1"), Timestamp::new(1)).unwrap();
        ledger.cast_vote(&claim(2), &id("a1"), Timestamp::new(1)).unwrap();
        assert!(ledger.has_voted(&claim(1), &id("a1")));
        assert!(ledger.has_voted(&claim(2), &id("a1")));
    }

    #[test]
    fn non_agent_cannot_vote() {
        let mut ledger = ledger_with_agents(&["a1"]);
        let err = ledger
            .cast_vote(&claim(1), &id("mallory"), Timestamp::new(1))
            .unwrap_err();
        assert_eq!(err, ConsensusError::Unauthorized("mallory".into()));
        assert_eq!(ledger.tally(&claim(1)), 0);
        assert!(ledger.drain_events().is_empty());
    }

    #[test]
    fn zero_claim_rejected() {
        let mut ledger = ledger_with_agents(&["a1"]);
        let err = ledger
            .cast_vote(&ClaimId::ZERO, &id("a1"), Timestamp::new(1))
            .unwrap_err();
        assert_eq!(err, ConsensusError::InvalidClaim);
    }

    #[test]
    fn vote_emits_event_with_running_tally() {
        let mut ledger = ledger_with_agents(&["a1", "a2"]);
        ledger.cast_vote(&claim(3), &id("a1"), Timestamp::new(5)).unwrap();
        ledger.cast_vote(&claim(3), &id("a2"), Timestamp::new(6)).unwrap();
        let events = ledger.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            ConsensusEvent::VoteCast { tally: 2, agent, .. } if agent == &id("a2")
        ));
    }

    #[test]
    fn lowering_threshold_approves_in_flight_claims() {
        let mut ledger = ledger_with_agents(&["a1"]);
        ledger.cast_vote(&claim(1), &id("a1"), Timestamp::new(1)).unwrap();
        assert!(!ledger.is_approved(&claim(1)));
        ledger.set_threshold(&id("admin"), 1, Timestamp::new(2)).unwrap();
        assert!(ledger.is_approved(&claim(1)));
    }

    #[test]
    fn raising_threshold_unapproves_on_read() {
        let mut ledger = ledger_with_agents(&["a1", "a2"]);
        ledger.cast_vote(&claim(1), &id("a1"), Timestamp::new(1)).unwrap();
        ledger.cast_vote(&claim(1), &id("a2"), Timestamp::new(1)).unwrap();
        ledger.set_threshold(&id("admin"), 3, Timestamp::new(2)).unwrap();
        assert!(!ledger.is_approved(&claim(1)));
    }

    #[test]
    fn set_threshold_requires_controller() {
        let mut ledger = ledger_with_agents(&["a1"]);
        let err = ledger
            .set_threshold(&id("a1"), 1, Timestamp::new(1))
            .unwrap_err();
        assert!(matches!(err, ConsensusError::Unauthorized(_)));
        assert_eq!(ledger.threshold(), 2);
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut ledger = ledger_with_agents(&[]);
        let err = ledger
            .set_threshold(&id("admin"), 0, Timestamp::new(1))
            .unwrap_err();
        assert_eq!(err, ConsensusError::InvalidThreshold(0));
    }

    #[test]
    fn revoked_agent_votes_still_count() {
        let mut ledger = ledger_with_agents(&["a1", "a2"]);
        ledger.cast_vote(&claim(1), &id("a1"), Timestamp::new(1)).unwrap();
        ledger.revoke_agent(&id("admin"), &id("a1"), Timestamp::new(2)).unwrap();
        ledger.cast_vote(&claim(1), &id("a2"), Timestamp::new(3)).unwrap();
        assert!(ledger.is_approved(&claim(1)));
        assert!(ledger
            .cast_vote(&claim(2), &id("a1"), Timestamp::new(4))
            .is_err());
    }

    #[test]
    fn transfer_control_moves_privilege() {
        let mut ledger = ledger_with_agents(&[]);
        ledger.transfer_control(&id("admin"), id("council")).unwrap();
        assert!(ledger.set_threshold(&id("admin"), 3, Timestamp::new(1)).is_err());
        ledger.set_threshold(&id("council"), 3, Timestamp::new(1)).unwrap();
        assert_eq!(ledger.threshold(), 3);
    }

    #[test]
    fn open_request_returns_unique_ids() {
        let mut ledger = ledger_with_agents(&[]);
        let a = ledger
            .open_request(&id("r"), "fund library", b"payload", Timestamp::new(9))
            .unwrap();
        let b = ledger
            .open_request(&id("r"), "fund library", b"payload", Timestamp::new(9))
            .unwrap();
        assert_ne!(a, b);
        let req = ledger.request(&a).unwrap();
        assert_eq!(req.requester, id("r"));
        assert_eq!(req.payload_hash, civic_crypto::blake2b_256(b"payload"));
    }

    #[test]
    fn snapshot_roundtrip_preserves_approval() {
        let mut ledger = ledger_with_agents(&["a1", "a2"]);
        ledger.cast_vote(&claim(1), &id("a1"), Timestamp::new(1)).unwrap();
        ledger.cast_vote(&claim(1), &id("a2"), Timestamp::new(1)).unwrap();

        let bytes = bincode::serialize(&ledger.snapshot()).unwrap();
        let snapshot: VotingSnapshot = bincode::deserialize(&bytes).unwrap();
        let mut restored = VotingLedger::restore(snapshot);

        assert!(restored.is_approved(&claim(1)));
        assert!(restored
            .cast_vote(&claim(1), &id("a1"), Timestamp::new(2))
            .is_err());
    }

    #[test]
    fn requested_claims_are_bound_to_the_requester() {
        let mut ledger = ledger_with_agents(&["a1"]);
        let k = ledger
            .open_request(&id("bob"), "fund", b"x", Timestamp::new(5))
            .unwrap();
        let binding = ApprovalSource::binding(&ledger, &k).unwrap();
        assert_eq!(binding.owner, id("bob"));
        assert_eq!(binding.kind, None);

        ledger.cast_vote(&claim(9), &id("a1"), Timestamp::new(6)).unwrap();
        assert!(ApprovalSource::binding(&ledger, &claim(9)).is_none());
    }
}
