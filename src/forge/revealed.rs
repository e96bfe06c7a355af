//! Harvest of leaked preimages and per-position coverage
//!
//! Every signature under a key reveals one preimage per position. Across
//! several signatures a position may end up with its zero side, its one
//! side, or both sides known. [`RevealedSet`] records that classification as
//! a fixed array so the coverage check is one linear scan.

use crate::forge::{engine::SignedMessage, ForgeError, Result};
use crate::lamport::{Block, Message, PublicKey, MESSAGE_BITS};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Which commitment sides of one position have a known preimage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Revealed {
    #[default]
    None,
    Zero,
    One,
    Both,
}

impl Revealed {
    /// Add the side selected by `bit`
    pub fn with_side(self, bit: u8) -> Self {
        let side = if bit == 0 { Revealed::Zero } else { Revealed::One };
        match self {
            Revealed::None => side,
            current if current == side => current,
            _ => Revealed::Both,
        }
    }

    /// True if a digest with `bit` at this position can be signed
    #[inline]
    pub fn supports(self, bit: u8) -> bool {
        match self {
            Revealed::Both => true,
            Revealed::Zero => bit == 0,
            Revealed::One => bit == 1,
            Revealed::None => false,
        }
    }

    pub fn is_covered(self) -> bool {
        self != Revealed::None
    }
}

/// Per-position classification, immutable once built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealedSet {
    slots: [Revealed; MESSAGE_BITS],
}

impl Default for RevealedSet {
    fn default() -> Self {
        Self {
            slots: [Revealed::None; MESSAGE_BITS],
        }
    }
}

impl From<[Revealed; MESSAGE_BITS]> for RevealedSet {
    fn from(slots: [Revealed; MESSAGE_BITS]) -> Self {
        Self { slots }
    }
}

impl RevealedSet {
    /// Classification of `position`; `Revealed::None` past the last bit
    pub fn get(&self, position: usize) -> Revealed {
        self.slots.get(position).copied().unwrap_or_default()
    }

    /// Positions with neither side revealed
    pub fn uncovered_positions(&self) -> Vec<usize> {
        (0..MESSAGE_BITS)
            .filter(|&i| !self.slots[i].is_covered())
            .collect()
    }

    pub fn is_fully_covered(&self) -> bool {
        self.slots.iter().all(|s| s.is_covered())
    }

    /// Positions where exactly one side is known
    pub fn single_sided_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Revealed::Zero | Revealed::One))
            .count()
    }

    pub fn both_sided_count(&self) -> usize {
        self.slots.iter().filter(|&&s| s == Revealed::Both).count()
    }

    /// Expected random candidates per winner, `2^k` for k single-sided positions
    ///
    /// Infinite when some position is uncovered.
    pub fn expected_attempts(&self) -> f64 {
        if !self.is_fully_covered() {
            return f64::INFINITY;
        }
        2f64.powi(self.single_sided_count() as i32)
    }

    /// First position whose digest bit cannot be signed, if any
    #[inline]
    pub fn first_unsupported(&self, message: &Message) -> Option<usize> {
        (0..MESSAGE_BITS).find(|&i| !self.slots[i].supports(message.bit(i)))
    }

    #[inline]
    pub fn supports(&self, message: &Message) -> bool {
        self.first_unsupported(message).is_none()
    }
}

/// Partial secret key recovered from prior signatures
///
/// `zero_pre[i]` / `one_pre[i]` are only meaningful where `coverage` says the
/// side was revealed. Zeroized on drop like a real secret key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Harvest {
    #[zeroize(skip)]
    coverage: RevealedSet,
    zero_pre: [Block; MESSAGE_BITS],
    one_pre: [Block; MESSAGE_BITS],
}

impl Default for Harvest {
    fn default() -> Self {
        Self::new()
    }
}

impl Harvest {
    /// Classify every revealed preimage of every signature against the
    /// public key's commitments
    ///
    /// A preimage matching neither commitment is a `ProtocolViolation`: the
    /// input was not produced under this key. Coverage is scoped to exactly
    /// the signatures passed here.
    pub fn collect(public_key: &PublicKey, signed: &[SignedMessage]) -> Result<Self> {
        if signed.is_empty() {
            return Err(ForgeError::NoSignatures);
        }

        let mut harvest = Self::new();

        for (index, item) in signed.iter().enumerate() {
            let mut disagreements = 0usize;

            for (position, preimage) in item.signature.preimages.iter().enumerate() {
                let side = harvest
                    .reveal(public_key, position, preimage)
                    .ok_or(ForgeError::ProtocolViolation {
                        signature: index,
                        position,
                    })?;
                if side != item.message.bit(position) {
                    disagreements += 1;
                }
            }

            if disagreements > 0 {
                log::warn!(
                    "signature {} reveals {} preimages that disagree with its message digest",
                    index,
                    disagreements
                );
            } else {
                log::debug!("harvested signature {}", index);
            }
        }

        Ok(harvest)
    }

    /// An empty harvest with nothing revealed
    pub fn new() -> Self {
        Self {
            coverage: RevealedSet::default(),
            zero_pre: [Block::ZERO; MESSAGE_BITS],
            one_pre: [Block::ZERO; MESSAGE_BITS],
        }
    }

    /// Record a single leaked preimage for `position`
    ///
    /// Returns the side it opens, or `None` (recording nothing) if it hashes
    /// to neither commitment or `position` is out of range.
    pub fn reveal(&mut self, public_key: &PublicKey, position: usize, preimage: &Block) -> Option<u8> {
        if position >= MESSAGE_BITS {
            return None;
        }
        let side = match preimage.hash() {
            c if c == *public_key.commitment(position, 0) => 0,
            c if c == *public_key.commitment(position, 1) => 1,
            _ => return None,
        };
        if side == 1 {
            self.one_pre[position] = *preimage;
        } else {
            self.zero_pre[position] = *preimage;
        }
        self.coverage.slots[position] = self.coverage.slots[position].with_side(side);
        Some(side)
    }

    pub fn coverage(&self) -> &RevealedSet {
        &self.coverage
    }

    /// Harvested preimage for `position` on side `bit`, if revealed
    pub fn preimage(&self, position: usize, bit: u8) -> Option<&Block> {
        if !self.coverage.get(position).supports(bit) {
            return None;
        }
        Some(if bit == 1 {
            &self.one_pre[position]
        } else {
            &self.zero_pre[position]
        })
    }

    /// Fail with `Coverage` if any position has no side revealed
    pub fn ensure_covered(&self) -> Result<()> {
        let uncovered = self.coverage.uncovered_positions();
        if uncovered.is_empty() {
            Ok(())
        } else {
            Err(ForgeError::Coverage { uncovered })
        }
    }
}
