//! Adaptive adjacency with probabilistic demotion of the previous partner.

use tracing::debug;

use crate::{
    arena::{ListId, NodeId},
    coin::{Coin, CoinError},
    error::SkipGraphError,
    policy::{AdaptiveLru, Restructure},
    skipgraph::SkipGraph,
};

/// [`AdaptiveLru`] which, with probability `$p$`, also evicts the node the
/// searcher used to share a length-2 list with.
///
/// The evicted node, the outcast, has the bit of its membership vector that
/// selected the old pair list flipped, and is reinserted from the root. Bits
/// past the flipped one are drawn afresh.
#[derive(Debug, Clone)]
pub struct ProbDemote {
    adaptive: AdaptiveLru,
    coin: Coin,
}

impl ProbDemote {
    /// Create a policy demoting with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn new(p: f64) -> Result<Self, CoinError> {
        Ok(Self::with_coin(Coin::new(p)?))
    }

    /// Create a reproducible policy demoting with probability `p`.
    ///
    /// # Errors
    ///
    /// `p` must be within `$[0, 1]$`.
    #[inline]
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, CoinError> {
        Ok(Self::with_coin(Coin::with_seed(p, seed)?))
    }

    fn with_coin(coin: Coin) -> Self {
        ProbDemote {
            adaptive: AdaptiveLru::new(),
            coin,
        }
    }

    /// The access history driving the adaptive moves.
    #[inline]
    pub fn adaptive(&self) -> &AdaptiveLru {
        &self.adaptive
    }
}

impl<K: Ord> SkipGraph<K> {
    /// The node sharing a length-2 list with `node`, with that list's level.
    fn pair_partner(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let leaf = self.node(node)?.leaf_list()?;
        let pair = self.parent(leaf)?;
        let list = self.list(pair)?;
        if list.len() != 2 {
            return None;
        }
        let partner = self.sibling(leaf).and_then(|l| self.list(l)?.head())?;
        Some((partner, list.level()))
    }

    /// Flip the bit that put `node` in a level-`level` list and reinsert it.
    fn demote(&mut self, node: NodeId, level: usize) {
        let Some(current) = self.node(node) else {
            return;
        };
        let mut bits = current.membership().as_slice().to_vec();
        let Some(flip) = level.min(bits.len()).checked_sub(1) else {
            return;
        };
        bits.truncate(flip + 1);
        bits[flip] = !bits[flip];
        debug!(node = ?node, bit = flip, "demoting outcast");
        self.relocate(node, &bits);
    }
}

impl<K: Ord> Restructure<K> for ProbDemote {
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError> {
        let outcast = graph
            .pair_partner(searcher)
            .filter(|&(partner, _)| partner != target);
        self.adaptive.adjust(graph, searcher, target, lowest);
        if let Some((outcast, level)) = outcast {
            if self.coin.flip() {
                graph.demote(outcast, level);
            }
        }
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

    use super::ProbDemote;
    use crate::{
        coin::CoinError,
        policy::{SelfAdjusting, tests::id},
        skipgraph::SkipGraph,
    };

    #[test]
    fn invalid_p() {
        assert_eq!(ProbDemote::new(2.0).err(), Some(CoinError::InvalidProbability));
    }

    #[test]
    fn outcast_leaves_the_pair() -> Result<()> {
        let graph = SkipGraph::balanced(0..8)?;
        let mut graph = SelfAdjusting::with_graph(graph, ProbDemote::with_seed(1.0, 11)?);
        let (zero, four, seven) = (
            id(graph.graph(), 0),
            id(graph.graph(), 4),
            id(graph.graph(), 7),
        );
        assert!(graph.graph().shares_pair_list(zero, four));

        graph.search(&7, zero)?;
        graph.graph().check()?;
        assert!(graph.graph().shares_pair_list(zero, seven));
        assert!(!graph.graph().shares_pair_list(zero, four));
        assert_eq!(graph.graph().len(), 8);
        Ok(())
    }

    #[test]
    fn never_demote_matches_adaptive() -> Result<()> {
        let mut demote = SelfAdjusting::with_graph(
            SkipGraph::balanced(0..8)?,
            ProbDemote::with_seed(0.0, 5)?,
        );
        let u = id(demote.graph(), 1);
        demote.search(&6, u)?;
        let v = id(demote.graph(), 6);
        assert!(demote.graph().shares_pair_list(u, v));
        demote.graph().check()?;
        Ok(())
    }

    #[rstest]
    fn random_workload_keeps_trie_well_formed(#[values(0.0, 0.5, 1.0)] p: f64) -> Result<()> {
        let mut graph = SelfAdjusting::with_graph(
            SkipGraph::balanced(0..16)?,
            ProbDemote::with_seed(p, 3)?,
        );
        let requests = [(0, 15), (15, 3), (3, 8), (8, 0), (7, 1), (1, 15), (12, 13), (0, 3)];
        for (from, to) in requests {
            let u = id(graph.graph(), from);
            let v = graph.search(&to, u)?;
            assert_eq!(graph.graph().key(v), Some(&to));
            graph.graph().check()?;
        }
        assert_eq!(graph.graph().all_members().count(), 16);
        Ok(())
    }
}
