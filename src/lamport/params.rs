//! Lamport parameters

/// Hash function output size (SHA-256)
pub const BLOCK_SIZE: usize = 32;

/// Number of bits in a message digest, one key pair slot per bit
pub const MESSAGE_BITS: usize = BLOCK_SIZE * 8;

/// Hex characters per block
pub const BLOCK_HEX_LEN: usize = BLOCK_SIZE * 2;

/// Public key text size: 256 zero-side commitments, then 256 one-side commitments
pub const PUBLIC_KEY_HEX_LEN: usize = 2 * MESSAGE_BITS * BLOCK_HEX_LEN;

/// Secret key text size (same layout as the public key)
pub const SECRET_KEY_HEX_LEN: usize = 2 * MESSAGE_BITS * BLOCK_HEX_LEN;

/// Signature text size: one revealed preimage per bit
pub const SIGNATURE_HEX_LEN: usize = MESSAGE_BITS * BLOCK_HEX_LEN;

/// Random bytes drawn during key generation (512 blocks)
pub const KEYGEN_ENTROPY_BYTES: usize = 2 * MESSAGE_BITS * BLOCK_SIZE;
