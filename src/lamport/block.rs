//! Blocks, message digests and the SHA-256 hash primitive
//!
//! Every piece of key, digest and signature material is a 32-byte [`Block`].
//! Bits are numbered big-endian: bit 0 is the most significant bit of byte 0,
//! bit 255 the least significant bit of byte 31.

use crate::lamport::{params::*, EncodingError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroize;

/// Fixed-size 32-byte value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Zeroize)]
pub struct Block(pub [u8; BLOCK_SIZE]);

impl Block {
    /// All-zero block
    pub const ZERO: Block = Block([0u8; BLOCK_SIZE]);

    pub fn new(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    /// SHA-256 of the block's 32 bytes
    pub fn hash(&self) -> Block {
        hash_data(&self.0)
    }

    /// True if `H(self) == commitment`
    ///
    /// If `Y = X.hash()` then `X.is_preimage_of(&Y)` holds and
    /// `Y.is_preimage_of(&X)` (almost surely) does not.
    pub fn is_preimage_of(&self, commitment: &Block) -> bool {
        self.hash() == *commitment
    }

    /// Bit `i` of the block: `(byte[i / 8] >> (7 - i % 8)) & 1`
    #[inline]
    pub fn bit(&self, i: usize) -> u8 {
        (self.0[i / 8] >> (7 - (i % 8))) & 1
    }

    /// 64 lowercase hex characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let blocks = decode_blocks(s, "block", 1)?;
        Ok(blocks[0])
    }

    fn from_chunk(chunk: &[u8]) -> Self {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes.copy_from_slice(chunk);
        Self(bytes)
    }
}

impl From<[u8; BLOCK_SIZE]> for Block {
    fn from(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.to_hex())
    }
}

/// SHA-256 digest of arbitrary data
pub fn hash_data(data: &[u8]) -> Block {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Block(hasher.finalize().into())
}

/// A 256-bit message digest, the value that actually gets signed
///
/// Raw input is reduced with [`Message::digest`] before signing, forging or
/// verifying; the bit rule of [`Block::bit`] applies to the digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Message(Block);

impl Message {
    /// Digest arbitrary input data into the signing domain
    pub fn digest(data: &[u8]) -> Self {
        Self(hash_data(data))
    }

    /// Digest of a UTF-8 string's bytes
    pub fn from_text(text: &str) -> Self {
        Self::digest(text.as_bytes())
    }

    /// Wrap an already-computed 32-byte digest
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(Block(bytes))
    }

    pub fn from_block(block: Block) -> Self {
        Self(block)
    }

    pub fn as_block(&self) -> &Block {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0 .0
    }

    #[inline]
    pub fn bit(&self, i: usize) -> u8 {
        self.0.bit(i)
    }

    /// All 256 bits, position 0 first
    pub fn bits(&self) -> impl Iterator<Item = u8> + '_ {
        (0..MESSAGE_BITS).map(move |i| self.bit(i))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let blocks = decode_blocks(s, "message", 1)?;
        Ok(Self(blocks[0]))
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({})", self.to_hex())
    }
}

/// Concatenate the hex encodings of `blocks`
pub(crate) fn encode_blocks<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> String {
    let mut s = String::new();
    for block in blocks {
        s.push_str(&block.to_hex());
    }
    s
}

/// Decode exactly `count` concatenated hex blocks
///
/// Length is checked before content, so a wrong-sized string never reaches
/// the hex decoder.
pub(crate) fn decode_blocks(s: &str, what: &'static str, count: usize) -> Result<Vec<Block>> {
    let expected = count * BLOCK_HEX_LEN;
    if s.len() != expected {
        return Err(EncodingError::Length {
            what,
            expected,
            actual: s.len(),
        }
        .into());
    }

    let bytes = hex::decode(s).map_err(|e| EncodingError::InvalidHex {
        what,
        reason: e.to_string(),
    })?;

    Ok(bytes.chunks_exact(BLOCK_SIZE).map(Block::from_chunk).collect())
}

/// Copy decoded blocks into a fixed 256-entry row
pub(crate) fn to_row(blocks: &[Block]) -> [Block; MESSAGE_BITS] {
    let mut row = [Block::ZERO; MESSAGE_BITS];
    row.copy_from_slice(&blocks[..MESSAGE_BITS]);
    row
}
