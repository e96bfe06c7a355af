//! Forgery orchestration: harvest, coverage check, search, assembly
//!
//! ```ignore
//! let forger = Forger::new(public_key, ForgeConfig::default());
//! let forgery = forger.forge(b"forge-test", &signed)?;
//! assert!(verify(&forgery.digest, &public_key, &forgery.signature));
//! ```

use crate::forge::revealed::Harvest;
use crate::forge::search::{self, CancelToken, OsSeedSource, SeedSource};
use crate::forge::{config::ForgeConfig, ForgeError, Result};
use crate::lamport::{verify, Block, Message, PublicKey, Signature, MESSAGE_BITS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A message digest and the signature published for it under the target key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: Message,
    pub signature: Signature,
}

/// Everything needed to run a forgery, as read from a JSON job file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForgeJob {
    pub public_key: PublicKey,
    pub payload: String,
    pub signatures: Vec<SignedMessage>,
}

impl ForgeJob {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| ForgeError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&data).map_err(|e| ForgeError::InvalidJob(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ForgeError::InvalidJob(e.to_string()))
    }
}

/// A successful forgery
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Forgery {
    /// The forged message bytes, `prefix || payload || suffix`
    #[serde(with = "hex_bytes")]
    pub message: Vec<u8>,
    /// SHA-256 of `message`, the value the signature signs
    pub digest: Message,
    pub signature: Signature,
    pub attempts: u64,
}

impl Forgery {
    /// Check the forged signature against `public_key`
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        Message::digest(&self.message) == self.digest
            && verify(&self.digest, public_key, &self.signature)
    }

    pub fn contains(&self, payload: &[u8]) -> bool {
        payload.is_empty() || self.message.windows(payload.len()).any(|w| w == payload)
    }
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim()).map_err(de::Error::custom)
    }
}

/// Forges signatures for one public key from its reused signatures
pub struct Forger<S: SeedSource = OsSeedSource> {
    public_key: PublicKey,
    config: ForgeConfig,
    seeds: S,
}

impl Forger {
    pub fn new(public_key: PublicKey, config: ForgeConfig) -> Self {
        Self {
            public_key,
            config,
            seeds: OsSeedSource,
        }
    }
}

impl<S: SeedSource> Forger<S> {
    /// Swap the entropy source used to seed worker CSPRNGs
    pub fn with_seed_source<T: SeedSource>(self, seeds: T) -> Forger<T> {
        Forger {
            public_key: self.public_key,
            config: self.config,
            seeds,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub fn forge(&self, payload: &[u8], signed: &[SignedMessage]) -> Result<Forgery> {
        self.forge_with_cancel(payload, signed, &CancelToken::new())
    }

    /// Forge a signature over a message embedding `payload`
    ///
    /// Fails fast with `NoSignatures`, `ProtocolViolation` or `Coverage`
    /// before any search work starts. The assembled signature is verified
    /// before it is returned.
    pub fn forge_with_cancel(
        &self,
        payload: &[u8],
        signed: &[SignedMessage],
        cancel: &CancelToken,
    ) -> Result<Forgery> {
        self.config.validate()?;
        let harvest = Harvest::collect(&self.public_key, signed)?;
        log::info!("harvested {} signatures", signed.len());
        self.forge_harvest(payload, &harvest, cancel)
    }

    /// Search and assemble from an existing harvest
    pub fn forge_harvest(
        &self,
        payload: &[u8],
        harvest: &Harvest,
        cancel: &CancelToken,
    ) -> Result<Forgery> {
        self.config.validate()?;
        harvest.ensure_covered()?;

        let coverage = harvest.coverage();
        log::info!(
            "coverage: {} positions both sides, {} single side, ~{:.0} expected attempts",
            coverage.both_sided_count(),
            coverage.single_sided_count(),
            coverage.expected_attempts()
        );

        let outcome = search::run(coverage, payload, &self.config, cancel, &self.seeds)?;
        let digest = outcome.winner.digest;
        let signature = assemble(harvest, &digest)?;

        if !verify(&digest, &self.public_key, &signature) {
            return Err(ForgeError::InvariantViolation(
                "assembled signature does not verify".into(),
            ));
        }

        Ok(Forgery {
            message: outcome.winner.message,
            digest,
            signature,
            attempts: outcome.attempts,
        })
    }
}

/// Pick the harvested preimage for each bit of `digest`
fn assemble(harvest: &Harvest, digest: &Message) -> Result<Signature> {
    let mut preimages = [Block::ZERO; MESSAGE_BITS];
    for (position, bit) in digest.bits().enumerate() {
        let preimage = harvest.preimage(position, bit).ok_or_else(|| {
            ForgeError::InvariantViolation(format!(
                "winner needs unrevealed side {} at position {}",
                bit, position
            ))
        })?;
        preimages[position] = *preimage;
    }
    Ok(Signature::new(preimages))
}

/// Forge with the default configuration
pub fn forge(public_key: &PublicKey, payload: &[u8], signed: &[SignedMessage]) -> Result<Forgery> {
    Forger::new(public_key.clone(), ForgeConfig::default()).forge(payload, signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lamport::{generate_keypair, sign, SecretKey};
    use tempfile::TempDir;

    fn signed(sk: &SecretKey, message: Message) -> SignedMessage {
        SignedMessage {
            message,
            signature: sign(&message, sk),
        }
    }

    fn complement(message: &Message) -> Message {
        let mut bytes = *message.as_bytes();
        for b in bytes.iter_mut() {
            *b = !*b;
        }
        Message::from_bytes(bytes)
    }

    #[test]
    fn test_forge_with_complementary_pair() {
        let (sk, pk) = generate_keypair().unwrap();
        let m1 = Message::digest(b"first");
        let batch = vec![signed(&sk, m1), signed(&sk, complement(&m1))];

        let forgery = forge(&pk, b"forge-test", &batch).unwrap();
        assert!(forgery.verify(&pk));
        assert!(forgery.contains(b"forge-test"));
        assert!(forgery.attempts >= 1);
    }

    #[test]
    fn test_assemble_reveals_the_right_side() {
        let (sk, pk) = generate_keypair().unwrap();
        let m1 = Message::digest(b"a");
        let batch = vec![signed(&sk, m1), signed(&sk, complement(&m1))];
        let harvest = Harvest::collect(&pk, &batch).unwrap();

        let target = Message::digest(b"target");
        let signature = assemble(&harvest, &target).unwrap();
        assert_eq!(signature, sign(&target, &sk));
    }

    #[test]
    fn test_assemble_rejects_unsupported_digest() {
        let (sk, pk) = generate_keypair().unwrap();
        let m1 = Message::digest(b"only");
        let harvest = Harvest::collect(&pk, &[signed(&sk, m1)]).unwrap();

        let result = assemble(&harvest, &complement(&m1));
        assert!(matches!(result, Err(ForgeError::InvariantViolation(_))));
    }

    #[test]
    fn test_no_signatures() {
        let (_, pk) = generate_keypair().unwrap();
        assert!(matches!(forge(&pk, b"x", &[]), Err(ForgeError::NoSignatures)));
    }

    #[test]
    fn test_uncovered_harvest_fails_before_search() {
        let (sk, pk) = generate_keypair().unwrap();
        let mut harvest = Harvest::new();
        for i in 0..MESSAGE_BITS - 1 {
            harvest.reveal(&pk, i, &sk.zero_pre[i]);
        }

        let forger = Forger::new(pk, ForgeConfig::default().with_workers(1));
        match forger.forge_harvest(b"x", &harvest, &CancelToken::new()) {
            Err(ForgeError::Coverage { uncovered }) => assert_eq!(uncovered, vec![MESSAGE_BITS - 1]),
            other => panic!("expected coverage error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_cancelled_forge_aborts() {
        let (sk, pk) = generate_keypair().unwrap();
        let m = Message::digest(b"m");
        let forger = Forger::new(pk, ForgeConfig::default().with_workers(1));
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            forger.forge_with_cancel(b"x", &[signed(&sk, m)], &cancel),
            Err(ForgeError::SearchAborted { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (sk, pk) = generate_keypair().unwrap();
        let m = Message::digest(b"m");
        let forger = Forger::new(pk, ForgeConfig::default().with_workers(0));
        assert!(matches!(
            forger.forge(b"x", &[signed(&sk, m)]),
            Err(ForgeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_job_file_roundtrip() {
        let (sk, pk) = generate_keypair().unwrap();
        let m = Message::digest(b"job");
        let job = ForgeJob {
            public_key: pk,
            payload: "forge-test".into(),
            signatures: vec![signed(&sk, m)],
        };

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, job.to_json().unwrap()).unwrap();

        let loaded = ForgeJob::from_file(&path).unwrap();
        assert_eq!(loaded.public_key, job.public_key);
        assert_eq!(loaded.payload, "forge-test");
        assert_eq!(loaded.signatures, job.signatures);
    }

    #[test]
    fn test_job_file_rejects_bad_hex() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{"public_key":"zz","payload":"p","signatures":[]}"#).unwrap();
        assert!(matches!(ForgeJob::from_file(&path), Err(ForgeError::InvalidJob(_))));
        assert!(matches!(
            ForgeJob::from_file(dir.path().join("missing.json")),
            Err(ForgeError::Io(_))
        ));
    }

    #[test]
    fn test_forgery_json() {
        let (sk, pk) = generate_keypair().unwrap();
        let m1 = Message::digest(b"json");
        let batch = vec![signed(&sk, m1), signed(&sk, complement(&m1))];
        let forgery = Forger::new(pk.clone(), ForgeConfig::default().with_workers(1))
            .forge(b"payload", &batch)
            .unwrap();

        let json = serde_json::to_string(&forgery).unwrap();
        let back: Forgery = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, forgery.message);
        assert!(back.verify(&pk));
    }
}
