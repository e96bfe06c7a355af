//! End-to-end forgery under a reused Lamport key
//!
//! Keys are generated, several messages are signed with the same secret key,
//! and the engine is handed only the public key and the published
//! signatures.

use lamport_forge::forge::{
    Alphabet, CancelToken, ForgeConfig, ForgeError, ForgeJob, Forger, Harvest, SignedMessage,
};
use lamport_forge::lamport::{
    generate_keypair, keyfile, sign, verify, Block, Message, SecretKey, BLOCK_SIZE, MESSAGE_BITS,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const PAYLOAD: &[u8] = b"forge-test";

fn signed(sk: &SecretKey, message: Message) -> SignedMessage {
    SignedMessage {
        message,
        signature: sign(&message, sk),
    }
}

fn random_digest(rng: &mut StdRng) -> Message {
    let mut bytes = [0u8; BLOCK_SIZE];
    rng.fill_bytes(&mut bytes);
    Message::from_bytes(bytes)
}

/// Complement of `message` except at `keep` positions, which stay equal
fn complement_except(message: &Message, keep: &[usize]) -> Message {
    let mut bytes = *message.as_bytes();
    for b in bytes.iter_mut() {
        *b = !*b;
    }
    for &i in keep {
        bytes[i / 8] ^= 1 << (7 - i % 8);
    }
    Message::from_bytes(bytes)
}

#[test]
fn test_forge_with_bounded_single_sided_positions() {
    let mut rng = StdRng::seed_from_u64(0x1a3b);
    let (sk, pk) = generate_keypair().unwrap();

    let m1 = random_digest(&mut rng);
    let keep = rand::seq::index::sample(&mut rng, MESSAGE_BITS, 12).into_vec();
    let m2 = complement_except(&m1, &keep);
    let batch = vec![
        signed(&sk, m1),
        signed(&sk, m2),
        signed(&sk, random_digest(&mut rng)),
        signed(&sk, random_digest(&mut rng)),
    ];

    let harvest = Harvest::collect(&pk, &batch).unwrap();
    assert!(harvest.coverage().single_sided_count() <= 12);
    assert!(harvest.coverage().expected_attempts() <= 4096.0);

    let forgery = Forger::new(pk.clone(), ForgeConfig::default())
        .forge(PAYLOAD, &batch)
        .unwrap();

    assert!(verify(&forgery.digest, &pk, &forgery.signature));
    assert_eq!(forgery.digest, Message::digest(&forgery.message));
    assert!(forgery.contains(PAYLOAD));
    assert!(!batch.iter().any(|s| s.message == forgery.digest));
}

/// Four independent random digests leave about 32 single-sided positions,
/// around 2^32 attempts
#[test]
#[ignore]
fn test_forge_with_four_random_signatures() {
    let mut rng = StdRng::from_entropy();
    let (sk, pk) = generate_keypair().unwrap();
    let batch: Vec<SignedMessage> = (0..4).map(|_| signed(&sk, random_digest(&mut rng))).collect();

    let harvest = Harvest::collect(&pk, &batch).unwrap();
    println!(
        "{} single-sided positions, ~{:.0} expected attempts",
        harvest.coverage().single_sided_count(),
        harvest.coverage().expected_attempts()
    );

    let forgery = Forger::new(pk.clone(), ForgeConfig::default())
        .forge(PAYLOAD, &batch)
        .unwrap();
    assert!(forgery.verify(&pk));
    assert!(forgery.contains(PAYLOAD));
}

#[test]
fn test_printable_forgery() {
    let mut rng = StdRng::seed_from_u64(7);
    let (sk, pk) = generate_keypair().unwrap();
    let m1 = random_digest(&mut rng);
    let batch = vec![signed(&sk, m1), signed(&sk, complement_except(&m1, &[0, 100, 200]))];

    let config = ForgeConfig::default().with_alphabet(Alphabet::Alphanumeric);
    let forgery = Forger::new(pk.clone(), config).forge(PAYLOAD, &batch).unwrap();

    let text = String::from_utf8(forgery.message.clone()).unwrap();
    assert!(text.contains("forge-test"));
    assert_eq!(text.len(), 27 + PAYLOAD.len() + 29);
    assert!(forgery.verify(&pk));
}

#[test]
fn test_deadline_with_single_signature() {
    let (sk, pk) = generate_keypair().unwrap();
    let batch = vec![signed(&sk, Message::from_text("only one"))];

    let config = ForgeConfig::default()
        .with_workers(2)
        .with_deadline(Duration::from_millis(200));
    let started = Instant::now();
    let result = Forger::new(pk, config).forge(PAYLOAD, &batch);

    assert!(matches!(result, Err(ForgeError::SearchAborted { .. })));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_external_cancel() {
    let (sk, pk) = generate_keypair().unwrap();
    let batch = vec![signed(&sk, Message::from_text("only one"))];
    let forger = Forger::new(pk, ForgeConfig::default().with_workers(2));

    let cancel = CancelToken::new();
    let result = std::thread::scope(|scope| {
        let handle = scope.spawn(|| forger.forge_with_cancel(PAYLOAD, &batch, &cancel));
        std::thread::sleep(Duration::from_millis(50));
        cancel.cancel();
        handle.join().unwrap()
    });

    assert!(matches!(result, Err(ForgeError::SearchAborted { .. })));
}

#[test]
fn test_coverage_error_is_distinct_from_abort() {
    let (sk, pk) = generate_keypair().unwrap();
    let mut harvest = Harvest::new();
    for i in (0..MESSAGE_BITS).step_by(2) {
        harvest.reveal(&pk, i, &sk.one_pre[i]);
    }

    let forger = Forger::new(pk, ForgeConfig::default());
    let started = Instant::now();
    match forger.forge_harvest(PAYLOAD, &harvest, &CancelToken::new()) {
        Err(ForgeError::Coverage { uncovered }) => {
            assert_eq!(uncovered.len(), MESSAGE_BITS / 2);
            assert!(uncovered.iter().all(|i| i % 2 == 1));
        }
        other => panic!("expected coverage error, got {:?}", other.err()),
    }
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_tampered_signature_is_protocol_violation() {
    let (sk, pk) = generate_keypair().unwrap();
    let mut tampered = signed(&sk, Message::from_text("b"));
    tampered.signature.preimages[200] = Block::new([0xAB; BLOCK_SIZE]);
    let batch = vec![signed(&sk, Message::from_text("a")), tampered];

    match Forger::new(pk, ForgeConfig::default()).forge(PAYLOAD, &batch) {
        Err(ForgeError::ProtocolViolation { signature, position }) => {
            assert_eq!((signature, position), (1, 200));
        }
        other => panic!("expected protocol violation, got {:?}", other.err()),
    }
}

#[test]
fn test_forge_from_key_files_and_job() {
    let dir = TempDir::new().unwrap();
    let secret_path = dir.path().join("key.sec");
    let public_path = dir.path().join("key.pub");

    let (sk, pk) = generate_keypair().unwrap();
    keyfile::write_secret_key(&secret_path, &sk).unwrap();
    keyfile::write_public_key(&public_path, &pk).unwrap();

    let sk = keyfile::read_secret_key(&secret_path).unwrap();
    let m1 = Message::from_text("pay alice 10");
    let m2 = complement_except(&m1, &[1, 2, 3, 4]);
    let job = ForgeJob {
        public_key: keyfile::read_public_key(&public_path).unwrap(),
        payload: "forge-test".into(),
        signatures: vec![signed(&sk, m1), signed(&sk, m2)],
    };
    let job_path = dir.path().join("job.json");
    fs::write(&job_path, job.to_json().unwrap()).unwrap();

    let job = ForgeJob::from_file(&job_path).unwrap();
    let forgery = Forger::new(job.public_key.clone(), ForgeConfig::default().with_workers(2))
        .forge(job.payload.as_bytes(), &job.signatures)
        .unwrap();

    assert!(forgery.verify(&pk));
    assert!(forgery.contains(b"forge-test"));
}
