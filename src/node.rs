//! Nodes of a skip graph.
//!
//! A node carries a key, its membership vector and one pair of neighbour links
//! for every level list it belongs to. Nodes never own one another: links are
//! [`NodeId`] handles into the skip graph's node arena.

use std::collections::BTreeMap;

use crate::{
    arena::{Arena, ListId, NodeId},
    membership::MembershipVector,
};

/// Arena holding every node of a skip graph.
pub(crate) type Nodes<K> = Arena<NodeId, Node<K>>;

/// The left and right neighbours of a node within one level list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    /// The neighbour with the next smaller key.
    pub left: Option<NodeId>,
    /// The neighbour with the next larger key.
    pub right: Option<NodeId>,
}

/// A key-bearing member of a skip graph.
///
/// The node's routing table has an entry for level `$L$` exactly when the node
/// belongs to the level-`$L$` list on its path, and its leaf list is the
/// deepest of those lists.
#[derive(Debug, Clone)]
pub struct Node<K> {
    key: K,
    membership: MembershipVector,
    neighbors: BTreeMap<usize, Links>,
    leaf_list: Option<ListId>,
}

// ////////////////////////////////////////////////////////////////////////////
// Inherent methods
// ////////////////////////////////////////////////////////////////////////////

impl<K> Node<K> {
    pub(crate) fn new(key: K, membership: MembershipVector) -> Self {
        Node {
            key,
            membership,
            neighbors: BTreeMap::new(),
            leaf_list: None,
        }
    }

    /// The node's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn into_key(self) -> K {
        self.key
    }

    /// The node's membership vector.
    #[inline]
    pub fn membership(&self) -> &MembershipVector {
        &self.membership
    }

    #[inline]
    pub(crate) fn membership_mut(&mut self) -> &mut MembershipVector {
        &mut self.membership
    }

    /// The deepest list the node belongs to, where it is the only member.
    #[inline]
    pub fn leaf_list(&self) -> Option<ListId> {
        self.leaf_list
    }

    #[inline]
    pub(crate) fn set_leaf_list(&mut self, list: Option<ListId>) {
        self.leaf_list = list;
    }

    /// The node's neighbours at `level`, if it belongs to a list at that level.
    #[inline]
    pub fn links(&self, level: usize) -> Option<Links> {
        self.neighbors.get(&level).copied()
    }

    /// The left neighbour at `level`.
    #[inline]
    pub fn left(&self, level: usize) -> Option<NodeId> {
        self.neighbors.get(&level).and_then(|links| links.left)
    }

    /// The right neighbour at `level`.
    #[inline]
    pub fn right(&self, level: usize) -> Option<NodeId> {
        self.neighbors.get(&level).and_then(|links| links.right)
    }

    /// The levels at which the node has a routing table entry, lowest first.
    pub fn levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.keys().copied()
    }

    /// Height of the node's routing table.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub(crate) fn set_left(&mut self, level: usize, left: Option<NodeId>) {
        self.neighbors.entry(level).or_default().left = left;
    }

    #[inline]
    pub(crate) fn set_right(&mut self, level: usize, right: Option<NodeId>) {
        self.neighbors.entry(level).or_default().right = right;
    }

    #[inline]
    pub(crate) fn set_links(&mut self, level: usize, links: Links) {
        self.neighbors.insert(level, links);
    }

    /// Drop the routing table entry at `level`, returning it.
    #[inline]
    pub(crate) fn clear_level(&mut self, level: usize) -> Option<Links> {
        self.neighbors.remove(&level)
    }

    /// Drop every routing table entry at `level` or above.
    pub(crate) fn clear_from(&mut self, level: usize) {
        drop(self.neighbors.split_off(&level));
    }

    /// Move the routing table entry at `from` to `to`, overwriting whatever
    /// was there.
    pub(crate) fn move_level(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        if let Some(links) = self.neighbors.remove(&from) {
            self.neighbors.insert(to, links);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Links, Node};
    use crate::{
        arena::{Arena, NodeId},
        membership::MembershipVector,
    };

    #[test]
    fn routing_table() {
        let mut ids: Arena<NodeId, ()> = Arena::new();
        let a = ids.insert(());
        let b = ids.insert(());

        let mut node = Node::new(5, MembershipVector::new());
        assert_eq!(*node.key(), 5);
        assert_eq!(node.height(), 0);

        node.set_right(0, Some(a));
        node.set_left(1, Some(b));
        assert_eq!(
            node.links(0),
            Some(Links {
                left: None,
                right: Some(a)
            })
        );
        assert_eq!(node.left(1), Some(b));
        assert_eq!(node.right(1), None);
        assert_eq!(node.levels().collect::<Vec<_>>(), vec![0, 1]);

        node.move_level(1, 3);
        assert_eq!(node.levels().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(node.left(3), Some(b));

        node.clear_from(1);
        assert_eq!(node.levels().collect::<Vec<_>>(), vec![0]);
        assert!(node.clear_level(0).is_some());
        assert_eq!(node.height(), 0);
    }
}
