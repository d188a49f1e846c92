//! Nullable action registry.

use civic_gateway::ActionRegistry;
use civic_types::{AccountId, ActionKind, ClaimId, TemplateHash, TokenAmount};
use std::sync::Mutex;

/// One `record_action` call as the registry saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedAction {
    pub actor: AccountId,
    pub kind: ActionKind,
    pub proof_ref: ClaimId,
    pub amount: TokenAmount,
    pub metadata_ref: String,
}

/// An in-memory registry that remembers every write.
#[derive(Default)]
pub struct NullRegistry {
    actions: Mutex<Vec<RecordedAction>>,
    templates: Mutex<Vec<(TemplateHash, AccountId, String)>>,
}

impl NullRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn action_count(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.lock().unwrap().len()
    }

    pub fn has_template(&self, hash: &TemplateHash) -> bool {
        self.templates.lock().unwrap().iter().any(|(h, _, _)| h == hash)
    }
}

impl ActionRegistry for NullRegistry {
    fn record_action(
        &self,
        actor: &AccountId,
        kind: ActionKind,
        proof_ref: &ClaimId,
        amount: TokenAmount,
        metadata_ref: &str,
    ) {
        self.actions.lock().unwrap().push(RecordedAction {
            actor: actor.clone(),
            kind,
            proof_ref: *proof_ref,
            amount,
            metadata_ref: metadata_ref.to_string(),
        });
    }

    fn create_template(&self, author: &AccountId, content_ref: &str) -> TemplateHash {
        let hash = civic_crypto::derive_template_hash(author, content_ref);
        self.templates
            .lock()
            .unwrap()
            .push((hash, author.clone(), content_ref.to_string()));
        hash
    }
}
