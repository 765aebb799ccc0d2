//! Membership vectors place nodes in the trie of level lists.
//!
//! The level-0 list holds every node. A list at level $i$ is split into two
//! children at level $i + 1$ by bit $i$ of each member's membership vector, so
//! the list a node occupies at level $i$ is addressed by the first $i$ bits of
//! its vector.
//!
//! Vectors are extended lazily: a bit is only drawn from a [`BitSource`] the
//! first time it is needed, and is cached afterwards.

pub mod random;

use std::fmt;

pub use random::RandomBits;

// ////////////////////////////////////////////////////////////////////////////
// Bit Source
// ////////////////////////////////////////////////////////////////////////////

/// A source of fresh membership-vector bits.
pub trait BitSource {
    /// Produce the next bit.
    #[must_use]
    fn next_bit(&mut self) -> bool;
}

// ////////////////////////////////////////////////////////////////////////////
// Membership Vector
// ////////////////////////////////////////////////////////////////////////////

/// A lazily extended bit string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MembershipVector {
    bits: Vec<bool>,
}

impl MembershipVector {
    /// Create an empty membership vector.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        MembershipVector { bits: Vec::new() }
    }

    /// Number of bits drawn so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if no bit has been drawn yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit `i`, if it has already been drawn.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<bool> {
        self.bits.get(i).copied()
    }

    /// The bits drawn so far.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Bit `i`, drawing any missing bits up to and including `i` from `src`.
    pub fn bit(&mut self, i: usize, src: &mut impl BitSource) -> bool {
        self.extend_to(i, src);
        self.bits[i]
    }

    /// Overwrite bit `i`, drawing any missing bits before it from `src`.
    pub fn set(&mut self, i: usize, bit: bool, src: &mut impl BitSource) {
        self.extend_to(i, src);
        self.bits[i] = bit;
    }

    /// Remove bit `i`, shifting every later bit one position down.
    pub fn remove(&mut self, i: usize) -> Option<bool> {
        (i < self.bits.len()).then(|| self.bits.remove(i))
    }

    /// Keep only the first `len` bits.
    pub fn truncate(&mut self, len: usize) {
        self.bits.truncate(len);
    }

    /// Replace the whole vector.
    pub fn reset_to(&mut self, bits: &[bool]) {
        self.bits.clear();
        self.bits.extend_from_slice(bits);
    }

    /// Returns `true` if the first `prefix.len()` bits equal `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &[bool]) -> bool {
        self.bits.starts_with(prefix)
    }

    fn extend_to(&mut self, i: usize, src: &mut impl BitSource) {
        while self.bits.len() <= i {
            self.bits.push(src.next_bit());
        }
    }
}

impl From<Vec<bool>> for MembershipVector {
    #[inline]
    fn from(bits: Vec<bool>) -> Self {
        MembershipVector { bits }
    }
}

impl From<&[bool]> for MembershipVector {
    #[inline]
    fn from(bits: &[bool]) -> Self {
        MembershipVector {
            bits: bits.to_vec(),
        }
    }
}

impl FromIterator<bool> for MembershipVector {
    #[inline]
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        MembershipVector {
            bits: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for MembershipVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{BitSource, MembershipVector};

    /// Produces `true, false, true, false, ...`.
    struct Alternating(bool);

    impl BitSource for Alternating {
        fn next_bit(&mut self) -> bool {
            self.0 = !self.0;
            self.0
        }
    }

    #[test]
    fn lazy_bits_are_cached() {
        let mut src = Alternating(false);
        let mut vector = MembershipVector::new();
        assert!(vector.is_empty());
        assert_eq!(vector.get(2), None);

        assert!(vector.bit(2, &mut src));
        assert_eq!(vector.as_slice(), &[true, false, true]);
        // Already drawn, so the source is not consulted again.
        assert!(!vector.bit(1, &mut src));
        assert_eq!(vector.len(), 3);
    }

    #[test]
    fn set_remove_truncate() {
        let mut src = Alternating(true);
        let mut vector = MembershipVector::from(vec![true, true]);
        vector.set(3, true, &mut src);
        assert_eq!(vector.to_string(), "1101");

        assert_eq!(vector.remove(1), Some(true));
        assert_eq!(vector.to_string(), "101");
        assert_eq!(vector.remove(7), None);

        vector.truncate(1);
        assert_eq!(vector.to_string(), "1");
        assert!(vector.starts_with(&[true]));
        assert!(!vector.starts_with(&[false]));
    }

    #[test]
    fn reset_to() {
        let mut vector: MembershipVector = [false, true, true].into_iter().collect();
        vector.reset_to(&[true]);
        assert_eq!(vector, MembershipVector::from(&[true][..]));
    }
}
