use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lamport_forge::forge::{Harvest, SignedMessage};
use lamport_forge::lamport::{generate_keypair, sign, verify, Message};

fn bench_keygen(c: &mut Criterion) {
    c.bench_function("Lamport Key Generation", |b| {
        b.iter(|| black_box(generate_keypair()))
    });
}

fn bench_sign(c: &mut Criterion) {
    let (secret_key, _) = generate_keypair().unwrap();
    let message = Message::from_text("benchmark");

    c.bench_function("Lamport Sign", |b| {
        b.iter(|| black_box(sign(black_box(&message), &secret_key)))
    });
}

fn bench_verify(c: &mut Criterion) {
    let (secret_key, public_key) = generate_keypair().unwrap();
    let message = Message::from_text("benchmark");
    let signature = sign(&message, &secret_key);

    c.bench_function("Lamport Verify", |b| {
        b.iter(|| black_box(verify(black_box(&message), &public_key, &signature)))
    });
}

fn bench_harvest(c: &mut Criterion) {
    let (secret_key, public_key) = generate_keypair().unwrap();
    let signed: Vec<SignedMessage> = ["one", "two", "three", "four"]
        .iter()
        .map(|text| {
            let message = Message::from_text(text);
            SignedMessage {
                message,
                signature: sign(&message, &secret_key),
            }
        })
        .collect();

    c.bench_function("Harvest 4 Signatures", |b| {
        b.iter(|| black_box(Harvest::collect(&public_key, &signed).is_ok()))
    });
}

/// One search attempt: digest a candidate and scan coverage
fn bench_candidate_check(c: &mut Criterion) {
    let (secret_key, public_key) = generate_keypair().unwrap();
    let message = Message::from_text("coverage");
    let signed = [SignedMessage {
        message,
        signature: sign(&message, &secret_key),
    }];
    let harvest = Harvest::collect(&public_key, &signed).unwrap();
    let candidate = [0x5Au8; 66];

    c.bench_function("Candidate Digest + Coverage Scan", |b| {
        b.iter(|| {
            let digest = Message::digest(black_box(&candidate));
            black_box(harvest.coverage().supports(&digest))
        })
    });
}

criterion_group!(
    benches,
    bench_keygen,
    bench_sign,
    bench_verify,
    bench_harvest,
    bench_candidate_check
);
criterion_main!(benches);
