//! Lamport Signing

use crate::lamport::{block::*, keygen::SecretKey, params::*, Result};
use std::fmt;

/// Lamport signature: one revealed preimage per message bit
///
/// Position i holds `zero_pre[i]` if bit i of the signed digest is 0 and
/// `one_pre[i]` otherwise. A signature does not say which side it revealed;
/// the digest (or the public key) tells.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    pub preimages: [Block; MESSAGE_BITS],
}

impl Signature {
    pub fn new(preimages: [Block; MESSAGE_BITS]) -> Self {
        Self { preimages }
    }

    /// `preimage[0..255]`, 16384 hex characters
    pub fn to_hex(&self) -> String {
        encode_blocks(self.preimages.iter())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let blocks = decode_blocks(s, "signature", MESSAGE_BITS)?;
        Ok(Self {
            preimages: to_row(&blocks),
        })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("preimages[0]", &self.preimages[0])
            .finish_non_exhaustive()
    }
}

/// Sign a message digest
///
/// Deterministic and non-consuming. Calling it twice with one key on two
/// different digests is exactly the key reuse the forgery engine exploits.
pub fn sign(message: &Message, secret_key: &SecretKey) -> Signature {
    let mut preimages = [Block::ZERO; MESSAGE_BITS];

    for (i, bit) in message.bits().enumerate() {
        preimages[i] = if bit == 1 {
            secret_key.one_pre[i]
        } else {
            secret_key.zero_pre[i]
        };
    }

    Signature { preimages }
}
