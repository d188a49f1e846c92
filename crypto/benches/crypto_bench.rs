use civic_types::{AccountId, ActionKind, ClaimId, ContextHash, Timestamp};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn claim_id_bench(c: &mut Criterion) {
    let actor = AccountId::new("bench_actor");
    let ctx = ContextHash::new([7u8; 32]);

    c.bench_function("derive_claim_id", |b| {
        b.iter(|| {
            civic_crypto::derive_claim_id(
                black_box(&actor),
                ActionKind::CongressionalMessage,
                &ctx,
                Timestamp::new(1_700_000_000),
            )
        })
    });
}

fn action_hash_bench(c: &mut Criterion) {
    let actor = AccountId::new("bench_actor");
    let claim = ClaimId::new([9u8; 32]);

    c.bench_function("derive_action_hash", |b| {
        b.iter(|| {
            civic_crypto::derive_action_hash(
                black_box(&actor),
                ActionKind::DirectAction,
                &claim,
                Timestamp::new(1_700_000_000),
            )
        })
    });
}

fn bundle_tag_bench(c: &mut Criterion) {
    let kp = civic_crypto::keypair_from_seed(&[42u8; 32]);
    let digest = civic_crypto::blake2b_256(&[0xABu8; 512]);
    let sig = civic_crypto::sign_message(&digest, &kp.private);

    c.bench_function("bundle_tag_sign", |b| {
        b.iter(|| civic_crypto::sign_message(black_box(&digest), &kp.private))
    });
    c.bench_function("bundle_tag_verify", |b| {
        b.iter(|| civic_crypto::verify_signature(black_box(&digest), &sig, &kp.public))
    });
}

criterion_group!(benches, claim_id_bench, action_hash_bench, bundle_tag_bench);
criterion_main!(benches);
