//! Subtree swapping until the searcher and the target meet.

use tracing::debug;

use crate::{
    arena::{ListId, NodeId},
    coin::{Coin, CoinError},
    error::SkipGraphError,
    policy::Restructure,
    skipgraph::SkipGraph,
};

/// Swaps subtrees below the lowest common list until the searcher and the
/// target share a length-2 list.
///
/// Each step takes the part of the searcher's side that does not lead to the
/// searcher and trades it for the part of the target's side that does lead to
/// the target, which pulls the lowest common list one level down. The coin is
/// tossed once per search; on heads the swaps run to convergence.
#[derive(Debug, Clone, Default)]
pub struct TreeSwap {
    coin: Coin,
}

impl TreeSwap {
    /// Create a policy restructuring with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn new(p: f64) -> Result<Self, CoinError> {
        Ok(TreeSwap {
            coin: Coin::new(p)?,
        })
    }

    /// Create a reproducible policy restructuring with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, CoinError> {
        Ok(TreeSwap {
            coin: Coin::with_seed(p, seed)?,
        })
    }
}

/// Perform one swap bringing `u` and `v` closer, with `lowest` their lowest
/// common list. Returns `false` if they already share a length-2 list.
pub(crate) fn swap_step<K: Ord>(
    graph: &mut SkipGraph<K>,
    u: NodeId,
    v: NodeId,
    lowest: ListId,
) -> bool {
    let (Some(cu), Some(cv)) = (graph.child_toward(lowest, u), graph.child_toward(lowest, v))
    else {
        return false;
    };
    let leaf = |list: ListId| graph.list_ref(list).is_leaf();
    let toward = |list: ListId, node: NodeId| match graph.child_toward(list, node) {
        Some(child) => child,
        None => unreachable!("{node:?} is below {list:?}"),
    };
    let sibling = |list: ListId| match graph.sibling(list) {
        Some(sibling) => sibling,
        None => unreachable!("{list:?} has a sibling"),
    };

    let (a, b) = match (leaf(cu), leaf(cv)) {
        (true, true) => return false,
        // `u` is alone below `lowest`: it joins `v`'s side instead.
        (true, false) => (cu, sibling(toward(cv, v))),
        (false, true) => (sibling(toward(cu, u)), cv),
        (false, false) => (sibling(toward(cu, u)), toward(cv, v)),
    };
    debug!(a = ?a, b = ?b, "tree swap step");
    graph.swap_subtrees(a, b, lowest);
    true
}

/// Run swap steps while `gate` allows, then fix up the membership vectors
/// below `lowest`.
pub(crate) fn converge<K: Ord>(
    graph: &mut SkipGraph<K>,
    u: NodeId,
    v: NodeId,
    lowest: ListId,
    mut gate: impl FnMut() -> bool,
) -> Result<(), SkipGraphError> {
    let mut steps = 0_usize;
    let mut current = lowest;
    while gate() && swap_step(graph, u, v, current) {
        steps += 1;
        current = graph.lowest_common_list(u, v)?;
    }
    if steps > 0 {
        debug!(steps, "tree swap converged");
        graph.sync_membership(lowest);
    }
    Ok(())
}

impl<K: Ord> Restructure<K> for TreeSwap {
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError> {
        if !self.coin.flip() {
            return Ok(());
        }
        converge(graph, searcher, target, lowest, || true)
    }
}
