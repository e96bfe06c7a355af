//! Signature forgery from Lamport key reuse
//!
//! Given several signatures under one public key, every position where two
//! signed digests differ has both preimages exposed. The engine:
//!
//! 1. Harvests the preimages and classifies each position (see [`revealed`])
//! 2. Refuses to search if any position has no preimage at all
//! 3. Races worker threads to find `prefix || payload || suffix` whose
//!    digest only needs exposed preimages (see [`search`])
//! 4. Assembles and re-verifies the forged signature
//!
//! Expected search cost is `2^k` candidates where `k` is the number of
//! positions with only one side exposed.

pub mod revealed;
pub mod config;
pub mod search;
pub mod engine;

use crate::lamport::MESSAGE_BITS;
use thiserror::Error;

pub use config::{Alphabet, ForgeConfig};
pub use engine::{forge, ForgeJob, Forger, Forgery, SignedMessage};
pub use revealed::{Harvest, Revealed, RevealedSet};
pub use search::{CancelToken, Candidate, OsSeedSource, SeedSource};

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("No signatures supplied")]
    NoSignatures,

    #[error("Signature {signature} reveals a preimage at position {position} matching neither commitment")]
    ProtocolViolation { signature: usize, position: usize },

    #[error("{} of {} positions have no revealed preimage", .uncovered.len(), MESSAGE_BITS)]
    Coverage { uncovered: Vec<usize> },

    #[error("Search aborted after {attempts} attempts")]
    SearchAborted { attempts: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid job file: {0}")]
    InvalidJob(String),

    #[error("Forged signature failed verification: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
