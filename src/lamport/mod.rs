//! Lamport one-time signatures over SHA-256
//!
//! - 256-bit message digests, one pair of secret preimages per bit
//! - Public key commits to every preimage with SHA-256
//! - A signature reveals exactly one preimage of each pair
//!
//! Each key pair must sign at most one message. Revealing two signatures
//! under one key leaks both preimages wherever the digests differ; the
//! [`crate::forge`] module turns that leak into a forgery.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Serialize a type as its hex string and parse it back through `from_hex`
macro_rules! impl_hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                <$ty>::from_hex(s.trim()).map_err(de::Error::custom)
            }
        }
    };
}

pub mod params;
pub mod block;
pub mod keygen;
pub mod sign;
pub mod verify;
pub mod keyfile;

pub use params::*;
pub use block::{hash_data, Block, Message};
pub use keygen::{generate_keypair, Keypair, PublicKey, SecretKey};
pub use sign::{sign, Signature};
pub use verify::verify;

impl_hex_serde!(Block);
impl_hex_serde!(Message);
impl_hex_serde!(PublicKey);
impl_hex_serde!(Signature);

#[derive(Error, Debug)]
pub enum LamportError {
    #[error("Randomness source failed: {0}")]
    Randomness(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("IO error: {0}")]
    Io(String),
}

/// Malformed hex input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{what} string is {actual} characters, expected {expected}")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} contains invalid hex: {reason}")]
    InvalidHex { what: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, LamportError>;
