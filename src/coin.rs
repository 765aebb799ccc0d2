//! Probability gate shared by the probabilistic restructuring policies.

use rand::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors that can occur when creating a [`Coin`].
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum CoinError {
    /// The probability `$p$` must be in the range `$[0, 1]$`.
    #[error("p must be in [0, 1].")]
    InvalidProbability,
}

/// A biased coin that lands heads with probability `$p$`.
///
/// A probability of 1 always lands heads and a probability of 0 never does, so
/// policies built with those values behave deterministically.
#[derive(Debug, Clone)]
pub struct Coin {
    /// The probability of heads.
    p: f64,
    /// The random number generator.
    rng: SmallRng,
}

impl Coin {
    /// Create a coin landing heads with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn new(p: f64) -> Result<Self, CoinError> {
        Self::build(p, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Create a reproducible coin landing heads with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, CoinError> {
        Self::build(p, SmallRng::seed_from_u64(seed))
    }

    /// A coin that always lands heads.
    #[inline]
    #[must_use]
    pub fn always() -> Self {
        Coin {
            p: 1.0,
            rng: SmallRng::seed_from_u64(0),
        }
    }

    fn build(p: f64, rng: SmallRng) -> Result<Self, CoinError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(CoinError::InvalidProbability);
        }
        Ok(Coin { p, rng })
    }

    /// The probability of heads.
    #[inline]
    #[must_use]
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Flip the coin, returning `true` on heads.
    #[inline]
    pub fn flip(&mut self) -> bool {
        self.rng.random_bool(self.p)
    }
}

impl Default for Coin {
    #[inline]
    fn default() -> Self {
        Self::always()
    }
}
