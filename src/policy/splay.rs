//! Splaying the target's list up to the lowest common list and back down
//! beside the searcher.
//!
//! A rotation in the trie mirrors a rotation in a binary search tree. For a
//! list `x` sitting on side `b` of its parent `p`:
//!
//! ```text
//!         g                 g
//!         |                 |
//!         p                 x
//!       b/ \              b/ \
//!       x   c     =>     a    p
//!     b/ \                  b/ \
//!     a   i                 i   c
//! ```
//!
//! `x` takes the place of `p`, `p` becomes the child of `x` away from `b` and
//! the inner subtree `i` moves across to `p`. Every list keeps two children.
//! Leaf lists are never rotated; the list holding the target's leaf is turned
//! beforehand so the leaf sits on the outer side and travels with it.
//!
//! Rotations only rewire child and parent links. Contents, levels, routing
//! tables and membership vectors of the affected subtree are rebuilt in one
//! pass once the target is in place.

use tracing::debug;

use crate::{
    arena::{ListId, NodeId},
    error::SkipGraphError,
    policy::Restructure,
    skipgraph::SkipGraph,
};

/// Splays the list holding the target's leaf up to the position of the
/// lowest common list, then rotates it down towards the searcher until the
/// two nodes share a length-2 list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Splay;

impl Splay {
    /// Create the policy.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Splay
    }
}

impl<K> SkipGraph<K> {
    /// Rotate `x` above its parent.
    ///
    /// # Panics
    ///
    /// Panics if `x` is the root or a leaf list.
    fn tree_rotate(&mut self, x: ListId) {
        let (Some(p), Some(b)) = (self.parent(x), self.which_child(x)) else {
            panic!("cannot rotate the root list");
        };
        let g = self.parent(p);
        let slot = self.which_child(p);
        let inner = self.list_ref(x).child(!b);
        assert!(inner.is_some(), "cannot rotate a leaf list");

        self.list_mut(p).set_child(b, inner);
        if let Some(inner) = inner {
            self.list_mut(inner).set_parent(Some(p));
        }
        self.list_mut(x).set_child(!b, Some(p));
        self.list_mut(p).set_parent(Some(x));
        self.list_mut(x).set_parent(g);
        match (g, slot) {
            (Some(g), Some(slot)) => self.list_mut(g).set_child(slot, Some(x)),
            _ => self.set_root(x),
        }
    }

    /// Swap the children of `list` if needed so `keep` is on `side`.
    fn orient(&mut self, list: ListId, keep: ListId, side: bool) {
        if self.list_ref(list).child(side) != Some(keep) {
            let [zero, one] = self.list_ref(list).children();
            self.list_mut(list).set_children([one, zero]);
        }
    }

    /// Rotate `x` above its parent without losing its child `keep`.
    fn rotate_keeping(&mut self, x: ListId, keep: ListId) {
        if let Some(side) = self.which_child(x) {
            self.orient(x, keep, side);
        }
        self.tree_rotate(x);
    }

    fn zig(&mut self, x: ListId, leaf: ListId) {
        self.rotate_keeping(x, leaf);
    }

    fn zig_zig(&mut self, x: ListId, p: ListId, leaf: ListId) {
        self.tree_rotate(p);
        self.rotate_keeping(x, leaf);
    }

    fn zig_zag(&mut self, x: ListId, leaf: ListId) {
        self.rotate_keeping(x, leaf);
        self.rotate_keeping(x, leaf);
    }

    /// Rotate `x`, which holds the leaf list `leaf` as a child, up until its
    /// parent is `top`.
    fn splay(&mut self, x: ListId, leaf: ListId, top: Option<ListId>) {
        while let Some(p) = self.parent(x).filter(|&p| Some(p) != top) {
            let g = self.parent(p);
            if g == top {
                self.zig(x, leaf);
            } else if self.which_child(x) == self.which_child(p) {
                self.zig_zig(x, p, leaf);
            } else {
                self.zig_zag(x, leaf);
            }
        }
    }

    /// Rotate the other child of `x` above `x` until that child is `dest`, so
    /// `leaf` and `dest` end up the two children of `x`.
    ///
    /// `dest` must be a leaf list below `x`.
    fn reverse_splay(&mut self, x: ListId, leaf: ListId, dest: NodeId) {
        loop {
            let Some(side) = self.which_child(leaf) else {
                return;
            };
            let Some(other) = self.list_ref(x).child(!side) else {
                return;
            };
            if self.list_ref(other).is_leaf() {
                return;
            }
            let Some(toward) = self.child_toward(other, dest) else {
                unreachable!("{dest:?} is below {other:?}");
            };
            self.orient(other, toward, side);
            self.tree_rotate(other);
        }
    }
}

impl<K: Ord> Restructure<K> for Splay {
    fn restructure(
        &mut self,
        graph: &mut SkipGraph<K>,
        searcher: NodeId,
        target: NodeId,
        lowest: ListId,
    ) -> Result<(), SkipGraphError> {
        if graph.list_ref(lowest).len() <= 2 {
            return Ok(());
        }
        let top = graph.parent(lowest);
        let slot = graph.which_child(lowest);
        let leaf = graph.leaf_of(target);
        let Some(x) = graph.parent(leaf) else {
            return Err(SkipGraphError::InvariantViolation(format!(
                "leaf list of {target:?} has no parent"
            )));
        };

        debug!(x = ?x, lowest = ?lowest, "splaying");
        graph.splay(x, leaf, top);
        graph.reverse_splay(x, leaf, searcher);

        let subtree = match (top, slot) {
            (Some(top), Some(slot)) => graph.list_ref(top).child(slot),
            _ => Some(graph.root_list()),
        };
        let Some(subtree) = subtree else {
            return Err(SkipGraphError::InvariantViolation(
                "splayed subtree lost its slot".to_owned(),
            ));
        };
        graph.rebuild_subtree(subtree);
        Ok(())
    }
}
