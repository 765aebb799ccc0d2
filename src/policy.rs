//! Self-adjusting skip graphs.
//!
//! A restructuring policy reshapes the trie after every successful search so
//! that nodes which talk to each other end up close together. The policies
//! differ in how aggressively they move things:
//!
//! - [`AdaptiveLru`] moves the less recently used of the two nodes next to the
//!   other.
//! - [`ProbDemote`] does the same, and with probability `$p$` pushes the
//!   searcher's previous partner one level away.
//! - [`TreeSwap`] swaps subtrees below the lowest common list until the two
//!   nodes meet; [`Braided`] re-checks its coin before every swap.
//! - [`BottomUpMerge`] follows [`AdaptiveLru`] with merges of small sibling
//!   subtrees along both search paths.
//! - [`Splay`] rotates the target up to the lowest common list and then down
//!   next to the searcher.
//!
//! Each policy implements [`Restructure`], and [`SelfAdjusting`] wires a
//! policy to a [`SkipGraph`].

pub mod adaptive;
pub mod braided;
pub mod demote;
pub mod merge;
pub mod splay;
pub mod tree_swap;

use tracing::trace;

pub use adaptive::AdaptiveLru;
pub use braided::Braided;
pub use demote::ProbDemote;
pub use merge::BottomUpMerge;
pub use splay::Splay;
pub use tree_swap::TreeSwap;

use crate::{
    arena::{ListId, NodeId},
    error::SkipGraphError,
    membership::MembershipVector,
    skipgraph::SkipGraph,
};

// ////////////////////////////////////////////////////////////////////////////
// Restructure
// ////////////////////////////////////////////////////////////////////////////

/// A rule for reshaping a skip graph after `searcher` found `target`.
pub trait Restructure<K> {
    /// Reshape `graph` after a search from `searcher` found `target`, with
    /// `lowest` being the lowest common list of the two nodes.
    ///
    /// Implementations must leave the trie well formed.
    ///
    /// # Errors
    ///
    /// Surfaces any error met while inspecting the graph; a well-behaved
    /// policy only fails if the graph was already corrupt.
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError>;

    /// Drop any state kept about a node that is being deleted.
    #[inline]
    fn forget(&mut self, _node: NodeId) {}
}

// ////////////////////////////////////////////////////////////////////////////
// Self-adjusting skip graph
// ////////////////////////////////////////////////////////////////////////////

/// A skip graph that restructures itself after every search.
#[derive(Debug)]
pub struct SelfAdjusting<K, P> {
    graph: SkipGraph<K>,
    policy: P,
}

/// Skip graph using [`AdaptiveLru`].
pub type AdaptiveSkipGraph<K> = SelfAdjusting<K, AdaptiveLru>;
/// Skip graph using [`ProbDemote`].
pub type DemoteSkipGraph<K> = SelfAdjusting<K, ProbDemote>;
/// Skip graph using [`TreeSwap`].
pub type TreeSwapSkipGraph<K> = SelfAdjusting<K, TreeSwap>;
/// Skip graph using [`Braided`].
pub type BraidedSkipGraph<K> = SelfAdjusting<K, Braided>;
/// Skip graph using [`BottomUpMerge`].
pub type MergeSkipGraph<K> = SelfAdjusting<K, BottomUpMerge>;
/// Skip graph using [`Splay`].
pub type SplaySkipGraph<K> = SelfAdjusting<K, Splay>;

impl<K, P> SelfAdjusting<K, P> {
    /// Create an empty self-adjusting skip graph.
    #[inline]
    #[must_use]
    pub fn new(policy: P) -> Self {
        Self::with_graph(SkipGraph::new(), policy)
    }

    /// Put an existing skip graph under `policy`.
    #[inline]
    #[must_use]
    pub fn with_graph(graph: SkipGraph<K>, policy: P) -> Self {
        SelfAdjusting { graph, policy }
    }

    /// The underlying skip graph, for read-only inspection.
    #[inline]
    pub fn graph(&self) -> &SkipGraph<K> {
        &self.graph
    }

    /// The restructuring policy.
    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The restructuring policy, mutably.
    #[inline]
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Split into the skip graph and the policy.
    #[inline]
    pub fn into_parts(self) -> (SkipGraph<K>, P) {
        (self.graph, self.policy)
    }
}

impl<K: Ord, P: Restructure<K>> SelfAdjusting<K, P> {
    /// Search for `key` starting from `from`, then restructure.
    ///
    /// In debug builds the trie is checked after every restructuring.
    ///
    /// # Errors
    ///
    /// Fails like [`SkipGraph::locate`], in which case nothing is
    /// restructured, or with
    /// [`InvariantViolation`][SkipGraphError::InvariantViolation] if the
    /// policy corrupted the trie.
    pub fn search(&mut self, key: &K, from: NodeId) -> Result<NodeId, SkipGraphError> {
        let located = self.graph.locate(key, from)?;
        if located.node != from {
            trace!(from = ?from, target = ?located.node, "restructuring");
            self.policy.restructure(
                &mut self.graph,
                from,
                located.node,
                located.lowest_common_list,
            )?;
            if cfg!(debug_assertions) {
                self.graph.check()?;
            }
        }
        Ok(located.node)
    }

    /// Look up the node holding `key` without restructuring.
    #[inline]
    pub fn find(&self, key: &K) -> Option<NodeId> {
        self.graph.find(key)
    }

    /// Insert `key`.
    ///
    /// # Errors
    ///
    /// See [`SkipGraph::insert`].
    #[inline]
    pub fn insert(&mut self, key: K) -> Result<NodeId, SkipGraphError> {
        self.graph.insert(key)
    }

    /// Insert `key` with an explicit start of its membership vector.
    ///
    /// # Errors
    ///
    /// See [`SkipGraph::insert_with_membership`].
    #[inline]
    pub fn insert_with_membership(
        &mut self,
        key: K,
        membership: MembershipVector,
    ) -> Result<NodeId, SkipGraphError> {
        self.graph.insert_with_membership(key, membership)
    }

    /// Delete a node, returning its key.
    ///
    /// # Errors
    ///
    /// See [`SkipGraph::delete`].
    pub fn delete(&mut self, node: NodeId) -> Result<K, SkipGraphError> {
        let key = self.graph.delete(node)?;
        self.policy.forget(node);
        Ok(key)
    }
}

impl<K, P: Default> Default for SelfAdjusting<K, P> {
    #[inline]
    fn default() -> Self {
        Self::new(P::default())
    }
}
