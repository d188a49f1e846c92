//! Blake2b hashing and deterministic identifier derivation.
//!
//! Every derivation starts with a distinct domain tag so that an identifier
//! of one kind can never equal an identifier of another kind built from the
//! same bytes. Variable-length fields are length-prefixed.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use civic_types::{AccountId, ActionHash, ActionKind, ClaimId, ContextHash, TemplateHash, Timestamp};

type Blake2b256 = Blake2b<U32>;

const CLAIM_DOMAIN: &[u8] = b"civic/claim/v1";
const REQUEST_DOMAIN: &[u8] = b"civic/request/v1";
const ACTION_DOMAIN: &[u8] = b"civic/action/v1";
const TEMPLATE_DOMAIN: &[u8] = b"civic/template/v1";

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    finish(hasher)
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    finish(hasher)
}

fn finish(hasher: Blake2b256) -> [u8; 32] {
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

fn update_prefixed(hasher: &mut Blake2b256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Claim id for a civic action: `H(actor ‖ kind ‖ context ‖ timestamp)`.
pub fn derive_claim_id(
    actor: &AccountId,
    kind: ActionKind,
    context: &ContextHash,
    timestamp: Timestamp,
) -> ClaimId {
    let mut hasher = Blake2b256::new();
    hasher.update(CLAIM_DOMAIN);
    update_prefixed(&mut hasher, actor.as_str().as_bytes());
    hasher.update([kind.code()]);
    hasher.update(context.as_bytes());
    hasher.update(timestamp.as_secs().to_le_bytes());
    ClaimId::new(finish(hasher))
}

/// Claim id for a consensus request. The `nonce` makes two otherwise
/// identical requests in the same second distinct.
pub fn derive_request_id(
    requester: &AccountId,
    description: &str,
    payload: &[u8],
    timestamp: Timestamp,
    nonce: u64,
) -> ClaimId {
    let mut hasher = Blake2b256::new();
    hasher.update(REQUEST_DOMAIN);
    update_prefixed(&mut hasher, requester.as_str().as_bytes());
    update_prefixed(&mut hasher, description.as_bytes());
    update_prefixed(&mut hasher, payload);
    hasher.update(timestamp.as_secs().to_le_bytes());
    hasher.update(nonce.to_le_bytes());
    ClaimId::new(finish(hasher))
}

/// Hash of one gated action: `H(actor ‖ kind ‖ approval ‖ now)`.
pub fn derive_action_hash(
    actor: &AccountId,
    kind: ActionKind,
    approval: &ClaimId,
    now: Timestamp,
) -> ActionHash {
    let mut hasher = Blake2b256::new();
    hasher.update(ACTION_DOMAIN);
    update_prefixed(&mut hasher, actor.as_str().as_bytes());
    hasher.update([kind.code()]);
    hasher.update(approval.as_bytes());
    hasher.update(now.as_secs().to_le_bytes());
    ActionHash::new(finish(hasher))
}

/// Content-addressed template hash: `H(author ‖ content_ref)`.
pub fn derive_template_hash(author: &AccountId, content_ref: &str) -> TemplateHash {
    let mut hasher = Blake2b256::new();
    hasher.update(TEMPLATE_DOMAIN);
    update_prefixed(&mut hasher, author.as_str().as_bytes());
    update_prefixed(&mut hasher, content_ref.as_bytes());
    TemplateHash::new(finish(hasher))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn claim_id_is_deterministic_and_nonzero() {
        let ctx = ContextHash::new([3u8; 32]);
        let a = derive_claim_id(&alice(), ActionKind::DirectAction, &ctx, Timestamp::new(10));
        let b = derive_claim_id(&alice(), ActionKind::DirectAction, &ctx, Timestamp::new(10));
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn claim_id_depends_on_every_field() {
        let ctx = ContextHash::new([3u8; 32]);
        let base = derive_claim_id(&alice(), ActionKind::DirectAction, &ctx, Timestamp::new(10));
        let other_actor =
            derive_claim_id(&AccountId::new("bob"), ActionKind::DirectAction, &ctx, Timestamp::new(10));
        let other_kind =
            derive_claim_id(&alice(), ActionKind::PolicyAdvocacy, &ctx, Timestamp::new(10));
        let other_ctx = derive_claim_id(
            &alice(),
            ActionKind::DirectAction,
            &ContextHash::new([4u8; 32]),
            Timestamp::new(10),
        );
        let other_time =
            derive_claim_id(&alice(), ActionKind::DirectAction, &ctx, Timestamp::new(11));
        for other in [other_actor, other_kind, other_ctx, other_time] {
            assert_ne!(base, other);
        }
    }

    #[test]
    fn request_nonce_separates_identical_requests() {
        let a = derive_request_id(&alice(), "fund", b"x", Timestamp::new(5), 0);
        let b = derive_request_id(&alice(), "fund", b"x", Timestamp::new(5), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn length_prefix_prevents_field_shifting() {
        let a = derive_request_id(&alice(), "ab", b"c", Timestamp::new(5), 0);
        let b = derive_request_id(&alice(), "a", b"bc", Timestamp::new(5), 0);
        assert_ne!(a, b);
    }

    #[test]
    fn action_hash_differs_by_time() {
        let claim = ClaimId::new([9u8; 32]);
        let a = derive_action_hash(&alice(), ActionKind::DirectAction, &claim, Timestamp::new(1));
        let b = derive_action_hash(&alice(), ActionKind::DirectAction, &claim, Timestamp::new(2));
        assert_ne!(a, b);
    }

    #[test]
    fn template_hash_is_content_addressed() {
        let a = derive_template_hash(&alice(), "ipfs://abc");
        assert_eq!(a, derive_template_hash(&alice(), "ipfs://abc"));
        assert_ne!(a, derive_template_hash(&alice(), "ipfs://abd"));
    }
}
