//! Lamport Verification

use crate::lamport::{block::Message, keygen::PublicKey, params::*, sign::Signature};

/// Check a signature against a public key and message digest
///
/// For every position i, `H(preimage[i])` must equal `one_hash[i]` when bit i
/// of the digest is 1 and `zero_hash[i]` otherwise. Returns `false` at the
/// first mismatch; a failed check is an ordinary outcome, not an error.
pub fn verify(message: &Message, public_key: &PublicKey, signature: &Signature) -> bool {
    for i in 0..MESSAGE_BITS {
        let expected = public_key.commitment(i, message.bit(i));
        if !signature.preimages[i].is_preimage_of(expected) {
            return false;
        }
    }
    true
}
