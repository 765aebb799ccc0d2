//! Tree swapping with a coin toss before every step.

use crate::{
    arena::{ListId, NodeId},
    coin::{Coin, CoinError},
    error::SkipGraphError,
    policy::{Restructure, tree_swap},
    skipgraph::SkipGraph,
};

/// [`TreeSwap`][crate::policy::TreeSwap] whose coin is tossed again before
/// each swap, so a search may pull the two nodes only part of the way
/// together.
///
/// With `$p = 1$` this converges exactly like tree swapping.
#[derive(Debug, Clone, Default)]
pub struct Braided {
    coin: Coin,
}

impl Braided {
    /// Create a policy taking each step with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn new(p: f64) -> Result<Self, CoinError> {
        Ok(Braided {
            coin: Coin::new(p)?,
        })
    }

    /// Create a reproducible policy taking each step with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, CoinError> {
        Ok(Braided {
            coin: Coin::with_seed(p, seed)?,
        })
    }
}

impl<K: Ord> Restructure<K> for Braided {
    #[inline]
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError> {
        let coin = &mut self.coin;
        tree_swap::converge(graph, searcher, target, lowest, || coin.flip())
    }
}
