//! Sorted doubly-linked lists, one per node of the skip graph's trie.
//!
//! A level list stores no nodes of its own: it keeps a handle to its first
//! member and the list is traversed through the members' routing table entries
//! at the list's level. Because every node is in exactly one list per level,
//! those entries are unambiguous.

use std::{cmp::Ordering, iter::FusedIterator};

use crate::{
    arena::{ListId, NodeId},
    node::{Links, Nodes},
};

/// Where a key sits in a level list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The key belongs to this member.
    Present(NodeId),
    /// The key is absent and would be inserted between these members.
    Between(Option<NodeId>, Option<NodeId>),
}

/// The outcome of walking a level list towards a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Walk {
    /// Whether the walk ended on the key.
    pub found: bool,
    /// The member the walk ended on: the match, or the member closest to the
    /// key from the side the walk started on.
    pub last: NodeId,
    /// Number of links followed.
    pub hops: usize,
}

/// One list of the trie.
#[derive(Debug, Clone)]
pub struct LevelList {
    level: usize,
    head: Option<NodeId>,
    len: usize,
    children: [Option<ListId>; 2],
    parent: Option<ListId>,
}

// ////////////////////////////////////////////////////////////////////////////
// Inherent methods
// ////////////////////////////////////////////////////////////////////////////

impl LevelList {
    /// Create an empty list at `level`.
    pub(crate) fn new(level: usize, parent: Option<ListId>) -> Self {
        LevelList {
            level,
            head: None,
            len: 0,
            children: [None, None],
            parent,
        }
    }

    /// Depth of the list in the trie; the root list is at level 0.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The member with the smallest key.
    #[inline]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// The parent list, absent for the root.
    #[inline]
    pub fn parent(&self) -> Option<ListId> {
        self.parent
    }

    /// The child lists for bit 0 and bit 1.
    #[inline]
    pub fn children(&self) -> [Option<ListId>; 2] {
        self.children
    }

    /// The child list for `bit`.
    #[inline]
    pub fn child(&self, bit: bool) -> Option<ListId> {
        self.children[usize::from(bit)]
    }

    /// Returns `true` if the list has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children == [None, None]
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<ListId>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn set_child(&mut self, bit: bool, child: Option<ListId>) {
        self.children[usize::from(bit)] = child;
    }

    #[inline]
    pub(crate) fn set_children(&mut self, children: [Option<ListId>; 2]) {
        self.children = children;
    }

    #[inline]
    pub(crate) fn set_level(&mut self, level: usize) {
        self.level = level;
    }

    /// Walk from `start` towards `key`, stopping on the key or on the last
    /// member before the walk would overshoot it.
    ///
    /// `start` must be a member of this list.
    pub(crate) fn walk<K: Ord>(&self, key: &K, start: NodeId, nodes: &Nodes<K>) -> Walk {
        let mut current = start;
        let mut hops = 0;
        loop {
            let node = &nodes[current];
            let next = match node.key().cmp(key) {
                Ordering::Equal => {
                    return Walk {
                        found: true,
                        last: current,
                        hops,
                    };
                }
                Ordering::Less => node
                    .right(self.level)
                    .filter(|&next| nodes[next].key() <= key),
                Ordering::Greater => node
                    .left(self.level)
                    .filter(|&next| nodes[next].key() >= key),
            };
            match next {
                Some(next) => {
                    current = next;
                    hops += 1;
                }
                None => {
                    return Walk {
                        found: false,
                        last: current,
                        hops,
                    };
                }
            }
        }
    }

    /// Locate `key` by walking from the head.
    pub(crate) fn probe<K: Ord>(&self, key: &K, nodes: &Nodes<K>) -> Probe {
        let Some(head) = self.head else {
            return Probe::Between(None, None);
        };
        let walk = self.walk(key, head, nodes);
        if walk.found {
            Probe::Present(walk.last)
        } else if nodes[walk.last].key() > key {
            Probe::Between(None, Some(walk.last))
        } else {
            Probe::Between(Some(walk.last), nodes[walk.last].right(self.level))
        }
    }

    /// Returns `true` if a member has `key`.
    pub(crate) fn contains<K: Ord>(&self, key: &K, nodes: &Nodes<K>) -> bool {
        matches!(self.probe(key, nodes), Probe::Present(_))
    }

    /// Splice `id` into the list in key order.
    ///
    /// Returns `false` without modifying anything if a member already has the
    /// same key.
    pub(crate) fn insert<K: Ord>(&mut self, id: NodeId, nodes: &mut Nodes<K>) -> bool {
        let (left, right) = match self.probe(nodes[id].key(), nodes) {
            Probe::Present(_) => return false,
            Probe::Between(left, right) => (left, right),
        };
        let level = self.level;
        nodes[id].set_links(level, Links { left, right });
        match left {
            Some(left) => nodes[left].set_right(level, Some(id)),
            None => self.head = Some(id),
        }
        if let Some(right) = right {
            nodes[right].set_left(level, Some(id));
        }
        self.len += 1;
        true
    }

    /// Unlink the member with `key`, returning it.
    pub(crate) fn delete<K: Ord>(&mut self, key: &K, nodes: &mut Nodes<K>) -> Option<NodeId> {
        match self.probe(key, nodes) {
            Probe::Present(id) => {
                self.unlink(id, nodes);
                Some(id)
            }
            Probe::Between(..) => None,
        }
    }

    /// Unlink member `id`.
    ///
    /// The node must belong to this list; its routing table entry at this
    /// list's level is dropped.
    pub(crate) fn unlink<K>(&mut self, id: NodeId, nodes: &mut Nodes<K>) {
        let level = self.level;
        let Some(Links { left, right }) = nodes[id].clear_level(level) else {
            return;
        };
        match left {
            Some(left) => nodes[left].set_right(level, right),
            None => self.head = right,
        }
        if let Some(right) = right {
            nodes[right].set_left(level, left);
        }
        self.len -= 1;
    }

    /// Iterate over the members in key order.
    ///
    /// Each call walks the links afresh.
    pub(crate) fn members<'a, K>(&self, nodes: &'a Nodes<K>) -> Members<'a, K> {
        Members {
            nodes,
            level: self.level,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Relabel every member's routing table entry, and the list itself, from
    /// `level` to `level + delta`.
    ///
    /// When shifting a whole subtree, deeper lists must be shifted first for a
    /// positive `delta` and last for a negative one, so no entry is overwritten
    /// before it has been moved.
    pub(crate) fn change_level<K>(&mut self, delta: isize, nodes: &mut Nodes<K>) {
        let Some(level) = self.level.checked_add_signed(delta) else {
            panic!("cannot shift a level-{} list by {delta}", self.level);
        };
        let ids: Vec<NodeId> = self.members(nodes).collect();
        for id in ids {
            nodes[id].move_level(self.level, level);
        }
        self.level = level;
    }

    /// Rebuild the list from scratch so it holds exactly `sorted`, which must
    /// be in increasing key order.
    pub(crate) fn relink<K>(&mut self, sorted: &[NodeId], nodes: &mut Nodes<K>) {
        for (i, &id) in sorted.iter().enumerate() {
            let left = i.checked_sub(1).map(|j| sorted[j]);
            let right = sorted.get(i + 1).copied();
            nodes[id].set_links(self.level, Links { left, right });
        }
        self.head = sorted.first().copied();
        self.len = sorted.len();
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Iterator
// ////////////////////////////////////////////////////////////////////////////

/// Iterator over the members of a [`LevelList`], in key order.
pub(crate) struct Members<'a, K> {
    nodes: &'a Nodes<K>,
    level: usize,
    next: Option<NodeId>,
    remaining: usize,
}

impl<K> Iterator for Members<'_, K> {
    type Item = NodeId;

    #[inline]
    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.nodes[current].right(self.level);
        self.remaining = self.remaining.saturating_sub(1);
        Some(current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Members<'_, K> {}
impl<K> FusedIterator for Members<'_, K> {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{LevelList, Probe};
    use crate::{
        arena::{Arena, NodeId},
        membership::MembershipVector,
        node::{Node, Nodes},
    };

    fn list_of(keys: &[i32]) -> (LevelList, Nodes<i32>, Vec<NodeId>) {
        let mut nodes: Nodes<i32> = Arena::new();
        let mut list = LevelList::new(0, None);
        let ids: Vec<NodeId> = keys
            .iter()
            .map(|&k| nodes.insert(Node::new(k, MembershipVector::new())))
            .collect();
        for &id in &ids {
            assert!(list.insert(id, &mut nodes));
        }
        (list, nodes, ids)
    }

    fn keys(list: &LevelList, nodes: &Nodes<i32>) -> Vec<i32> {
        list.members(nodes).map(|id| *nodes[id].key()).collect()
    }

    #[test]
    fn insert_keeps_order() {
        let (list, nodes, _) = list_of(&[5, 1, 9, 3, 7]);
        assert_eq!(keys(&list, &nodes), vec![1, 3, 5, 7, 9]);
        assert_eq!(list.len(), 5);
        assert_eq!(list.members(&nodes).len(), 5);
    }

    #[test]
    fn insert_duplicate_is_rejected() {
        let (mut list, mut nodes, _) = list_of(&[1, 2]);
        let dup = nodes.insert(Node::new(2, MembershipVector::new()));
        assert!(!list.insert(dup, &mut nodes));
        assert_eq!(list.len(), 2);
        assert_eq!(nodes[dup].height(), 0);
    }

    #[test]
    fn delete() {
        let (mut list, mut nodes, ids) = list_of(&[1, 2, 3]);
        assert_eq!(list.delete(&2, &mut nodes), Some(ids[1]));
        assert_eq!(list.delete(&2, &mut nodes), None);
        assert_eq!(keys(&list, &nodes), vec![1, 3]);
        assert_eq!(nodes[ids[1]].height(), 0);

        assert_eq!(list.delete(&1, &mut nodes), Some(ids[0]));
        assert_eq!(list.head(), Some(ids[2]));
        assert_eq!(nodes[ids[2]].left(0), None);
    }

    #[rstest]
    #[case(10, 2, 2, 2)]
    #[case(10, 6, 10, 0)]
    #[case(15, 5, 10, 3)]
    #[case(1, 20, 20, 7)]
    #[case(4, 4, 4, 0)]
    fn walk(
        #[case] from: i32,
        #[case] key: i32,
        #[case] ends_on: i32,
        #[case] hops: usize,
    ) {
        let (list, nodes, ids) = list_of(&[1, 2, 4, 10, 11, 12, 15, 20]);
        let start = ids.iter().copied().find(|&id| *nodes[id].key() == from);
        let Some(start) = start else {
            panic!("no member {from}");
        };
        let walk = list.walk(&key, start, &nodes);
        assert_eq!(*nodes[walk.last].key(), ends_on);
        assert_eq!(walk.found, ends_on == key);
        assert_eq!(walk.hops, hops);
    }

    #[test]
    fn probe() {
        let (list, nodes, ids) = list_of(&[2, 4, 6]);
        assert_eq!(list.probe(&4, &nodes), Probe::Present(ids[1]));
        assert_eq!(list.probe(&1, &nodes), Probe::Between(None, Some(ids[0])));
        assert_eq!(
            list.probe(&5, &nodes),
            Probe::Between(Some(ids[1]), Some(ids[2]))
        );
        assert_eq!(list.probe(&9, &nodes), Probe::Between(Some(ids[2]), None));
        assert!(list.contains(&6, &nodes));
        assert!(!list.contains(&3, &nodes));
    }

    #[test]
    fn change_level_moves_entries() {
        let (mut list, mut nodes, ids) = list_of(&[1, 2, 3]);
        list.change_level(2, &mut nodes);
        assert_eq!(list.level(), 2);
        assert_eq!(keys(&list, &nodes), vec![1, 2, 3]);
        assert_eq!(nodes[ids[0]].levels().collect::<Vec<_>>(), vec![2]);

        list.change_level(-1, &mut nodes);
        assert_eq!(list.level(), 1);
        assert_eq!(nodes[ids[1]].right(1), Some(ids[2]));
    }

    #[test]
    fn relink_drops_missing_members() {
        let (mut list, mut nodes, ids) = list_of(&[1, 2, 3]);
        list.relink(&[ids[0], ids[2]], &mut nodes);
        assert_eq!(keys(&list, &nodes), vec![1, 3]);
        assert_eq!(list.len(), 2);
        assert_eq!(nodes[ids[0]].right(0), Some(ids[2]));
        assert_eq!(nodes[ids[2]].left(0), Some(ids[0]));
    }
}
