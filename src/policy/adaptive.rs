//! Least-recently-used adjacency.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    arena::{ListId, NodeId},
    error::SkipGraphError,
    policy::Restructure,
    skipgraph::SkipGraph,
};

/// Moves the less recently used of the searcher and the target next to the
/// other, so the two end up alone in a length-2 list.
///
/// Only lists below the lowest common list are touched. Nodes never seen
/// before count as least recently used; between two such nodes the target
/// moves.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveLru {
    /// Logical time of the latest access.
    clock: u64,
    /// Time of each node's latest access.
    touched: HashMap<NodeId, u64>,
}

impl AdaptiveLru {
    /// Create a policy with no access history.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the node's latest access; 0 if never accessed.
    #[inline]
    #[must_use]
    pub fn last_access(&self, node: NodeId) -> u64 {
        self.touched.get(&node).copied().unwrap_or(0)
    }

    /// Choose which of `u` and `v` moves, returning `(mover, stay)`, and
    /// record the access to both.
    fn choose(&mut self, u: NodeId, v: NodeId) -> (NodeId, NodeId) {
        let choice = if self.last_access(u) < self.last_access(v) {
            (u, v)
        } else {
            (v, u)
        };
        self.clock += 1;
        self.touched.insert(u, self.clock);
        self.touched.insert(v, self.clock);
        choice
    }

    /// Pair `u` and `v` below `lowest`, their lowest common list.
    pub(crate) fn adjust<K: Ord>(
        &mut self,
        graph: &mut SkipGraph<K>,
        u: NodeId,
        v: NodeId,
        lowest: ListId,
    ) {
        let (mover, stay) = self.choose(u, v);
        if u == v || graph.shares_pair_list(u, v) {
            return;
        }
        debug!(mover = ?mover, stay = ?stay, "adaptive move");
        graph.move_beside(mover, stay, lowest);
    }
}

impl<K: Ord> Restructure<K> for AdaptiveLru {
    #[inline]
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError> {
        self.adjust(graph, searcher, target, lowest);
        Ok(())
    }

    #[inline]
    fn forget(&mut self, node: NodeId) {
        self.touched.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::AdaptiveLru;
    use crate::{
        error::SkipGraphError,
        policy::{SelfAdjusting, tests::id},
        skipgraph::SkipGraph,
    };

    #[rstest]
    #[case::depth_3(SkipGraph::balanced(0..8), 0, 7)]
    #[case::depth_3_neighbours(SkipGraph::balanced(0..8), 3, 2)]
    #[case::depth_5(SkipGraph::balanced(0..32), 31, 0)]
    #[case::spine(SkipGraph::spine(0..6), 5, 0)]
    fn searcher_and_target_become_adjacent(
        #[case] graph: Result<SkipGraph<i32>, SkipGraphError>,
        #[case] from: i32,
        #[case] to: i32,
    ) -> Result<()> {
        let mut graph = SelfAdjusting::with_graph(graph?, AdaptiveLru::new());
        let u = id(graph.graph(), from);
        let v = graph.search(&to, u)?;
        graph.graph().check()?;
        assert!(graph.graph().shares_pair_list(u, v));
        assert_eq!(graph.graph().search_cost(u, v)?, 1);
        assert_eq!(graph.graph().all_members().count(), graph.graph().len());
        Ok(())
    }

    #[test]
    fn least_recently_used_moves() -> Result<()> {
        let mut graph = SelfAdjusting::with_graph(SkipGraph::balanced(0..8)?, AdaptiveLru::new());
        let (zero, three, five) = (
            id(graph.graph(), 0),
            id(graph.graph(), 3),
            id(graph.graph(), 5),
        );
        graph.search(&3, zero)?;
        assert!(graph.graph().shares_pair_list(zero, three));

        // 5 has never been used, so it moves next to 3.
        graph.search(&3, five)?;
        assert!(graph.graph().shares_pair_list(three, five));
        assert!(graph.policy().last_access(five) > graph.policy().last_access(zero));
        Ok(())
    }

    #[test]
    fn repeated_search_is_stable() -> Result<()> {
        let mut graph = SelfAdjusting::with_graph(SkipGraph::balanced(0..16)?, AdaptiveLru::new());
        let u = id(graph.graph(), 4);
        graph.search(&11, u)?;
        let layout = graph.graph().to_string();
        for _ in 0..5 {
            graph.search(&11, u)?;
        }
        assert_eq!(graph.graph().to_string(), layout);
        Ok(())
    }

    #[test]
    fn delete_forgets_history() -> Result<()> {
        let mut graph = SelfAdjusting::with_graph(SkipGraph::balanced(0..8)?, AdaptiveLru::new());
        let (u, v) = (id(graph.graph(), 1), id(graph.graph(), 6));
        graph.search(&6, u)?;
        assert!(graph.policy().last_access(v) > 0);
        graph.delete(v)?;
        assert_eq!(graph.policy().last_access(v), 0);
        graph.graph().check()?;
        Ok(())
    }
}
