//! Lamport Key Generation

use crate::lamport::{block::*, params::*, LamportError, Result};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Lamport secret key: two rows of 256 random preimages
///
/// # One-time use
///
/// A signature reveals `zero_pre[i]` or `one_pre[i]` for every position i.
/// Signing two different digests with the same key reveals BOTH preimages
/// wherever the digests differ, and a handful of signatures is enough to
/// forge a signature on a new message (see [`crate::forge`]).
/// Nothing in this type prevents reuse; callers must.
///
/// Contents are zeroized on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    pub zero_pre: [Block; MESSAGE_BITS],
    pub one_pre: [Block; MESSAGE_BITS],
}

impl SecretKey {
    /// Recompute the public commitments for this key
    pub fn public_key(&self) -> PublicKey {
        let mut public_key = PublicKey {
            zero_hash: [Block::ZERO; MESSAGE_BITS],
            one_hash: [Block::ZERO; MESSAGE_BITS],
        };
        for i in 0..MESSAGE_BITS {
            public_key.zero_hash[i] = self.zero_pre[i].hash();
            public_key.one_hash[i] = self.one_pre[i].hash();
        }
        public_key
    }

    /// Hex encoding for key files: `zero_pre[0..255]` then `one_pre[0..255]`
    pub fn to_hex(&self) -> String {
        encode_blocks(self.zero_pre.iter().chain(self.one_pre.iter()))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut blocks = decode_blocks(s, "secret key", 2 * MESSAGE_BITS)?;
        let key = Self {
            zero_pre: to_row(&blocks[..MESSAGE_BITS]),
            one_pre: to_row(&blocks[MESSAGE_BITS..]),
        };
        blocks.zeroize();
        Ok(key)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Lamport public key: `zero_hash[i] = H(zero_pre[i])`, `one_hash[i] = H(one_pre[i])`
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub zero_hash: [Block; MESSAGE_BITS],
    pub one_hash: [Block; MESSAGE_BITS],
}

impl PublicKey {
    /// Commitment for position `i` on side `bit`
    #[inline]
    pub fn commitment(&self, i: usize, bit: u8) -> &Block {
        if bit == 1 {
            &self.one_hash[i]
        } else {
            &self.zero_hash[i]
        }
    }

    /// `zero_hash[0..255]` then `one_hash[0..255]`, 32768 hex characters
    pub fn to_hex(&self) -> String {
        encode_blocks(self.zero_hash.iter().chain(self.one_hash.iter()))
    }

    /// Parse the output of [`PublicKey::to_hex`]
    ///
    /// Wrong length or non-hex content is an `Encoding` error.
    pub fn from_hex(s: &str) -> Result<Self> {
        let blocks = decode_blocks(s, "public key", 2 * MESSAGE_BITS)?;
        Ok(Self {
            zero_hash: to_row(&blocks[..MESSAGE_BITS]),
            one_hash: to_row(&blocks[MESSAGE_BITS..]),
        })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("zero_hash[0]", &self.zero_hash[0])
            .field("one_hash[0]", &self.one_hash[0])
            .finish_non_exhaustive()
    }
}

pub struct Keypair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a key pair from the operating system's CSPRNG
    pub fn generate() -> Result<Self> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a key pair from any cryptographically secure RNG
    ///
    /// Draws 512 independent 32-byte values. If the RNG fails at any point the
    /// partially filled key is zeroized and `Randomness` is returned.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut secret_key = SecretKey {
            zero_pre: [Block::ZERO; MESSAGE_BITS],
            one_pre: [Block::ZERO; MESSAGE_BITS],
        };

        for i in 0..MESSAGE_BITS {
            rng.try_fill_bytes(&mut secret_key.zero_pre[i].0)
                .map_err(|e| LamportError::Randomness(e.to_string()))?;
            rng.try_fill_bytes(&mut secret_key.one_pre[i].0)
                .map_err(|e| LamportError::Randomness(e.to_string()))?;
        }

        let public_key = secret_key.public_key();
        Ok(Self { secret_key, public_key })
    }

    pub fn into_parts(self) -> (SecretKey, PublicKey) {
        (self.secret_key, self.public_key)
    }
}

/// Generate a `(SecretKey, PublicKey)` pair from the OS CSPRNG
pub fn generate_keypair() -> Result<(SecretKey, PublicKey)> {
    Keypair::generate().map(Keypair::into_parts)
}
