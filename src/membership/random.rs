//! Uniformly random membership bits.

use rand::prelude::*;

use crate::membership::BitSource;

/// A [`BitSource`] producing independent fair coin flips.
///
/// This is the source used by [`SkipGraph`][crate::SkipGraph] to draw the
/// membership vectors of inserted nodes.
#[derive(Debug, Clone)]
pub struct RandomBits {
    /// The random number generator.
    rng: SmallRng,
}

impl RandomBits {
    /// Create a bit source seeded from the thread-local generator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        RandomBits {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    /// Create a reproducible bit source.
    #[inline]
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        RandomBits {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomBits {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl BitSource for RandomBits {
    #[inline]
    fn next_bit(&mut self) -> bool {
        self.rng.random()
    }
}
