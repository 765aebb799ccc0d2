//! Adaptive adjacency followed by merges of small subtrees hanging off the
//! search path.

use tracing::debug;

use crate::{
    arena::{ListId, NodeId},
    coin::{Coin, CoinError},
    error::SkipGraphError,
    policy::{AdaptiveLru, Restructure},
    skipgraph::SkipGraph,
};

/// [`AdaptiveLru`] followed by a rebalancing pass along both nodes' paths.
///
/// The subtrees hanging off a path, from the leaf up to the lowest common
/// list, are taken two at a time. The deeper of a pair is pulled out of its
/// parent and joined with the shallower one under a new list, provided the
/// two together are smaller than the path subtree they leave behind. Each
/// merge happens with probability `$p$`. The target's path is scanned bottom
/// up, then the searcher's top down.
#[derive(Debug, Clone, Default)]
pub struct BottomUpMerge {
    adaptive: AdaptiveLru,
    coin: Coin,
}

impl BottomUpMerge {
    /// Create a policy merging with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn new(p: f64) -> Result<Self, CoinError> {
        Ok(BottomUpMerge {
            adaptive: AdaptiveLru::new(),
            coin: Coin::new(p)?,
        })
    }

    /// Create a reproducible policy merging with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, CoinError> {
        Ok(BottomUpMerge {
            adaptive: AdaptiveLru::new(),
            coin: Coin::with_seed(p, seed)?,
        })
    }

    /// The access history driving the adaptive moves.
    #[inline]
    pub fn adaptive(&self) -> &AdaptiveLru {
        &self.adaptive
    }

    fn merge_along<K: Ord>(
        &mut self,
        graph: &mut SkipGraph<K>,
        node: NodeId,
        lowest: ListId,
        bottom_up: bool,
    ) {
        // The sibling of the leaf is the node's partner and stays put.
        let mut hanging: Vec<ListId> = graph
            .lists_between(graph.leaf_of(node), lowest)
            .into_iter()
            .skip(1)
            .filter_map(|list| graph.sibling(list))
            .collect();
        if !bottom_up {
            hanging.reverse();
        }
        for pair in hanging.chunks_exact(2) {
            let (lower, upper) = if bottom_up {
                (pair[0], pair[1])
            } else {
                (pair[1], pair[0])
            };
            let Some(between) = graph.parent(lower) else {
                continue;
            };
            if between == upper || graph.parent(between) != graph.parent(upper) {
                continue;
            }
            let Some(cousin) = graph.sibling(lower) else {
                continue;
            };
            let size = |list: ListId| graph.list_ref(list).len();
            if size(lower) + size(upper) >= size(cousin) || !self.coin.flip() {
                continue;
            }
            debug!(upper = ?upper, lower = ?lower, "merging hanging subtrees");
            graph.merge_subtrees(upper, lower);
        }
    }
}

impl<K: Ord> Restructure<K> for BottomUpMerge {
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError> {
        self.adaptive.adjust(graph, searcher, target, lowest);
        self.merge_along(graph, target, lowest, true);
        self.merge_along(graph, searcher, lowest, false);
        Ok(())
    }

    #[inline]
    fn forget(&mut self, node: NodeId) {
        <AdaptiveLru as Restructure<K>>::forget(&mut self.adaptive, node);
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::BottomUpMerge;
    use crate::{
        policy::{SelfAdjusting, tests::id},
        skipgraph::SkipGraph,
    };

    #[rstest]
    #[case::merging(1.0, 2)]
    #[case::never(0.0, 1)]
    fn merges_small_subtrees_along_path(#[case] p: f64, #[case] depth: usize) -> Result<()> {
        let mut graph =
            SelfAdjusting::with_graph(SkipGraph::spine(0..6)?, BottomUpMerge::with_seed(p, 9)?);
        let (zero, one, two, five) = (
            id(graph.graph(), 0),
            id(graph.graph(), 1),
            id(graph.graph(), 2),
            id(graph.graph(), 5),
        );

        graph.search(&0, five)?;
        graph.graph().check()?;
        assert!(graph.graph().shares_pair_list(zero, five));
        assert_eq!(graph.graph().depth(one)?, depth);
        assert_eq!(graph.graph().depth(two)?, 2);
        Ok(())
    }

    #[test]
    fn hot_pair_cost_never_grows() -> Result<()> {
        let mut graph =
            SelfAdjusting::with_graph(SkipGraph::balanced(0..16)?, BottomUpMerge::with_seed(1.0, 4)?);
        let (u, v) = (id(graph.graph(), 0), id(graph.graph(), 15));
        let before = graph.graph().search_cost(u, v)?;
        let mut previous = before;
        for _ in 0..10 {
            graph.search(&15, u)?;
            let cost = graph.graph().search_cost(u, v)?;
            assert!(cost <= previous);
            previous = cost;
        }
        assert!(previous < before);
        assert_eq!(previous, 1);
        Ok(())
    }

    #[rstest]
    fn mixed_workload_keeps_trie_well_formed(#[values(0.3, 1.0)] p: f64) -> Result<()> {
        let mut graph =
            SelfAdjusting::with_graph(SkipGraph::balanced(0..32)?, BottomUpMerge::with_seed(p, 8)?);
        let requests = [(0, 31), (4, 27), (31, 16), (9, 0), (22, 23), (0, 31), (13, 2)];
        for (from, to) in requests {
            let u = id(graph.graph(), from);
            let v = graph.search(&to, u)?;
            graph.graph().check()?;
            assert!(graph.graph().shares_pair_list(u, v));
        }
        assert_eq!(graph.graph().all_members().count(), 32);
        Ok(())
    }
}
