//! A skip graph is a binary trie of sorted linked lists.
//!
//! Conceptually, a skip graph holding the keys `0..8` resembles:
//!
//! ```text
//! level 3: [0] [4] [2] [6] [1] [5] [3] [7]
//! level 2: [0 4] [2 6] [1 5] [3 7]
//! level 1: [0 2 4 6] [1 3 5 7]
//! level 0: [0 1 2 3 4 5 6 7]
//! ```
//!
//! The level-0 list holds every node. Each list with at least two members has
//! exactly two children which split its members by the next bit of their
//! membership vectors, and a list with a single member is the leaf list of
//! that member. A search starts at the leaf list of the searching node, walks
//! each list towards the key and climbs to the parent list whenever the key
//! cannot be found at the current level. The first list on the way up that
//! contains the target is the lowest common list of the two nodes.

mod check;
mod surgery;

use std::fmt;

use tracing::trace;

use crate::{
    arena::{Arena, ListId, NodeId},
    error::SkipGraphError,
    level_list::{LevelList, Probe},
    membership::{MembershipVector, RandomBits},
    node::{Node, Nodes},
};

/// The outcome of a successful search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    /// The node holding the key.
    pub node: NodeId,
    /// The list in which the search found the key; the shallowest list the
    /// searching node and the target share.
    pub lowest_common_list: ListId,
    /// Number of neighbour links followed.
    pub hops: usize,
}

/// A skip graph over the keys `K`.
///
/// Nodes are referred to by [`NodeId`] handles which remain valid until the
/// node is deleted, however much the trie is restructured in between. Use
/// [`find`][SkipGraph::find] to turn a key into a handle.
pub struct SkipGraph<K> {
    nodes: Nodes<K>,
    lists: Arena<ListId, LevelList>,
    root: ListId,
    bits: RandomBits,
}

// ////////////////////////////////////////////////////////////////////////////
// Inherent methods
// ////////////////////////////////////////////////////////////////////////////

impl<K> SkipGraph<K> {
    /// Create an empty skip graph drawing membership bits from entropy.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_bits(RandomBits::new())
    }

    /// Create an empty skip graph whose membership bits are reproducible.
    #[inline]
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_bits(RandomBits::seeded(seed))
    }

    fn with_bits(bits: RandomBits) -> Self {
        let mut lists = Arena::new();
        let root = lists.insert(LevelList::new(0, None));
        SkipGraph {
            nodes: Arena::new(),
            lists,
            root,
            bits,
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the skip graph holds no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// The level-0 list, which contains every node.
    #[inline]
    pub fn root_list(&self) -> ListId {
        self.root
    }

    /// The list behind a handle, if it is still part of the trie.
    #[inline]
    pub fn list(&self, list: ListId) -> Option<&LevelList> {
        self.lists.get(list)
    }

    /// The bit-0 and bit-1 children of a list.
    ///
    /// Leaf lists and dead handles have no children.
    pub fn children(&self, list: ListId) -> [Option<ListId>; 2] {
        self.lists
            .get(list)
            .map_or([None, None], LevelList::children)
    }

    /// The parent of a list; `None` for the root and for dead handles.
    pub fn parent(&self, list: ListId) -> Option<ListId> {
        self.lists.get(list).and_then(LevelList::parent)
    }

    /// The keys of a list's members, in increasing order.
    ///
    /// A dead handle has no members.
    pub fn members(&self, list: ListId) -> impl Iterator<Item = &K> + '_ {
        self.lists
            .get(list)
            .into_iter()
            .flat_map(|list| list.members(&self.nodes))
            .map(|id| self.nodes[id].key())
    }

    /// Every key in the skip graph, in increasing order.
    pub fn all_members(&self) -> impl Iterator<Item = &K> + '_ {
        self.members(self.root)
    }

    /// The node behind a handle, if it is still a member.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id)
    }

    /// The key of a node.
    #[inline]
    pub fn key(&self, id: NodeId) -> Option<&K> {
        self.nodes.get(id).map(Node::key)
    }

    /// The lists containing `node`, from its leaf list up to the root.
    ///
    /// # Errors
    ///
    /// Fails with [`NotAMember`][SkipGraphError::NotAMember] if the node has
    /// been deleted.
    pub fn path(&self, node: NodeId) -> Result<Vec<ListId>, SkipGraphError> {
        let leaf = self
            .nodes
            .get(node)
            .and_then(Node::leaf_list)
            .ok_or(SkipGraphError::NotAMember)?;
        Ok(self.ancestors(leaf).collect())
    }

    /// Level of a node's leaf list.
    ///
    /// # Errors
    ///
    /// Fails with [`NotAMember`][SkipGraphError::NotAMember] if the node has
    /// been deleted.
    pub fn depth(&self, node: NodeId) -> Result<usize, SkipGraphError> {
        let leaf = self
            .nodes
            .get(node)
            .and_then(Node::leaf_list)
            .ok_or(SkipGraphError::NotAMember)?;
        Ok(self.lists[leaf].level())
    }

    /// The deepest list containing both `u` and `v`.
    ///
    /// # Errors
    ///
    /// Fails with [`NotAMember`][SkipGraphError::NotAMember] if either node has
    /// been deleted.
    pub fn lowest_common_list(&self, u: NodeId, v: NodeId) -> Result<ListId, SkipGraphError> {
        let pu = self.path(u)?;
        let pv = self.path(v)?;
        let mut lowest = self.root;
        for (a, b) in pu.iter().rev().zip(pv.iter().rev()) {
            if a != b {
                break;
            }
            lowest = *a;
        }
        Ok(lowest)
    }

    /// Returns `true` if `u` and `v` are the two members of a length-2 list,
    /// which makes them one hop apart.
    pub fn shares_pair_list(&self, u: NodeId, v: NodeId) -> bool {
        u != v
            && self
                .lowest_common_list(u, v)
                .is_ok_and(|list| self.lists[list].len() == 2)
    }

    /// Iterate from `list` up to the root.
    pub(crate) fn ancestors(&self, list: ListId) -> impl Iterator<Item = ListId> + '_ {
        std::iter::successors(Some(list), |&list| self.lists[list].parent())
    }

    /// Which slot of its parent a list occupies; `None` for the root.
    pub(crate) fn which_child(&self, list: ListId) -> Option<bool> {
        let parent = self.lists[list].parent()?;
        Some(self.lists[parent].child(true) == Some(list))
    }

    /// The other child of a list's parent.
    pub(crate) fn sibling(&self, list: ListId) -> Option<ListId> {
        let parent = self.lists[list].parent()?;
        let bit = self.which_child(list)?;
        self.lists[parent].child(!bit)
    }

    /// Handles of a list's members, in key order.
    pub(crate) fn member_ids(&self, list: ListId) -> Vec<NodeId> {
        self.lists[list].members(&self.nodes).collect()
    }

    /// The child of `ancestor` on the path of `node`.
    pub(crate) fn child_toward(&self, ancestor: ListId, node: NodeId) -> Option<ListId> {
        let leaf = self.nodes.get(node)?.leaf_list()?;
        self.ancestors(leaf)
            .find(|&list| self.lists[list].parent() == Some(ancestor))
    }

    /// The leaf list of a live node.
    pub(crate) fn leaf_of(&self, node: NodeId) -> ListId {
        match self.nodes[node].leaf_list() {
            Some(leaf) => leaf,
            None => panic!("node {node:?} is detached"),
        }
    }

    pub(crate) fn list_ref(&self, list: ListId) -> &LevelList {
        &self.lists[list]
    }

    pub(crate) fn list_mut(&mut self, list: ListId) -> &mut LevelList {
        &mut self.lists[list]
    }

    pub(crate) fn set_root(&mut self, list: ListId) {
        self.root = list;
    }
}

impl<K: Ord> SkipGraph<K> {
    /// Build a skip graph from keys and explicit membership vectors.
    ///
    /// Bits the vectors do not provide are drawn at random. Where every member
    /// of a list agrees on the next bit the bit is dropped, so no list with a
    /// single child is ever built.
    ///
    /// # Errors
    ///
    /// Fails with [`DuplicateKey`][SkipGraphError::DuplicateKey] if a key
    /// appears twice.
    pub fn from_membership(
        entries: impl IntoIterator<Item = (K, MembershipVector)>,
    ) -> Result<Self, SkipGraphError> {
        let mut graph = Self::new();
        let mut entries: Vec<(K, MembershipVector)> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        if entries.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(SkipGraphError::DuplicateKey);
        }
        let ids: Vec<NodeId> = entries
            .into_iter()
            .map(|(key, membership)| graph.nodes.insert(Node::new(key, membership)))
            .collect();
        if !ids.is_empty() {
            let root = graph.root;
            graph.build(root, &ids);
        }
        Ok(graph)
    }

    /// Build a perfectly balanced skip graph.
    ///
    /// The `i`-th smallest key gets the binary digits of `i`, least significant
    /// first, as its membership vector, so every level halves the lists above
    /// it.
    ///
    /// # Errors
    ///
    /// Fails with [`DuplicateKey`][SkipGraphError::DuplicateKey] if a key
    /// appears twice.
    pub fn balanced(keys: impl IntoIterator<Item = K>) -> Result<Self, SkipGraphError> {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort();
        let width = usize::BITS - keys.len().saturating_sub(1).leading_zeros();
        Self::from_membership(keys.into_iter().enumerate().map(|(i, key)| {
            let membership = (0..width).map(|bit| (i >> bit) & 1 == 1).collect();
            (key, membership)
        }))
    }

    /// Build a maximally unbalanced skip graph.
    ///
    /// Every level splits off the smallest remaining key, so the largest key
    /// sits at the bottom of a spine as deep as the graph is large.
    ///
    /// # Errors
    ///
    /// Fails with [`DuplicateKey`][SkipGraphError::DuplicateKey] if a key
    /// appears twice.
    pub fn spine(keys: impl IntoIterator<Item = K>) -> Result<Self, SkipGraphError> {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort();
        let last = keys.len().saturating_sub(1);
        Self::from_membership(keys.into_iter().enumerate().map(|(i, key)| {
            let mut membership = vec![true; i.min(last)];
            if i < last {
                membership.push(false);
            }
            (key, MembershipVector::from(membership))
        }))
    }

    fn build(&mut self, list: ListId, sorted: &[NodeId]) {
        self.lists[list].relink(sorted, &mut self.nodes);
        if let [only] = sorted {
            self.nodes[*only].set_leaf_list(Some(list));
            return;
        }
        let level = self.lists[list].level();
        let (zeros, ones) = loop {
            let (ones, zeros): (Vec<NodeId>, Vec<NodeId>) = sorted
                .iter()
                .partition(|&&id| self.nodes[id].membership_mut().bit(level, &mut self.bits));
            if !zeros.is_empty() && !ones.is_empty() {
                break (zeros, ones);
            }
            for &id in sorted {
                self.nodes[id].membership_mut().remove(level);
            }
        };
        for (bit, part) in [(false, zeros), (true, ones)] {
            let child = self.lists.insert(LevelList::new(level + 1, Some(list)));
            self.lists[list].set_child(bit, Some(child));
            self.build(child, &part);
        }
    }

    /// Look up the node holding `key`.
    pub fn find(&self, key: &K) -> Option<NodeId> {
        match self.lists[self.root].probe(key, &self.nodes) {
            Probe::Present(id) => Some(id),
            Probe::Between(..) => None,
        }
    }

    /// Returns `true` if the skip graph holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.lists[self.root].contains(key, &self.nodes)
    }

    /// Search for `key` starting from the node `from`, reporting where the
    /// search ended and how far it travelled.
    ///
    /// # Errors
    ///
    /// Fails with [`InvalidStartNode`][SkipGraphError::InvalidStartNode] if
    /// `from` is not a member, and with
    /// [`KeyNotFound`][SkipGraphError::KeyNotFound] if no node holds `key`.
    pub fn locate(&self, key: &K, from: NodeId) -> Result<Located, SkipGraphError> {
        let mut list = self
            .nodes
            .get(from)
            .and_then(Node::leaf_list)
            .ok_or(SkipGraphError::InvalidStartNode)?;
        let mut current = from;
        let mut hops = 0;
        loop {
            let walk = self.lists[list].walk(key, current, &self.nodes);
            hops += walk.hops;
            if walk.found {
                trace!(from = ?from, node = ?walk.last, hops, "search hit");
                return Ok(Located {
                    node: walk.last,
                    lowest_common_list: list,
                    hops,
                });
            }
            current = walk.last;
            list = self.lists[list]
                .parent()
                .ok_or(SkipGraphError::KeyNotFound)?;
        }
    }

    /// Search for `key` starting from the node `from`.
    ///
    /// # Errors
    ///
    /// See [`locate`][SkipGraph::locate].
    #[inline]
    pub fn search(&self, key: &K, from: NodeId) -> Result<NodeId, SkipGraphError> {
        self.locate(key, from).map(|located| located.node)
    }

    /// Number of links a search for `v` started at `u` follows.
    ///
    /// # Errors
    ///
    /// Fails with [`InvalidStartNode`][SkipGraphError::InvalidStartNode] if
    /// `u` is not a member and with [`NotAMember`][SkipGraphError::NotAMember]
    /// if `v` is not.
    pub fn search_cost(&self, u: NodeId, v: NodeId) -> Result<usize, SkipGraphError> {
        let key = self.key(v).ok_or(SkipGraphError::NotAMember)?;
        self.locate(key, u).map(|located| located.hops)
    }

    /// Insert `key` with a fresh random membership vector.
    ///
    /// # Errors
    ///
    /// Fails with [`DuplicateKey`][SkipGraphError::DuplicateKey], leaving the
    /// skip graph untouched, if `key` is already present.
    pub fn insert(&mut self, key: K) -> Result<NodeId, SkipGraphError> {
        self.insert_with_membership(key, MembershipVector::new())
    }

    /// Insert `key` using `membership` as the start of its membership vector.
    ///
    /// If the new node ends up sharing a leaf list with a node whose bit at
    /// that level agrees with its own, the new node takes the complement.
    ///
    /// # Errors
    ///
    /// Fails with [`DuplicateKey`][SkipGraphError::DuplicateKey], leaving the
    /// skip graph untouched, if `key` is already present.
    pub fn insert_with_membership(
        &mut self,
        key: K,
        membership: MembershipVector,
    ) -> Result<NodeId, SkipGraphError> {
        if self.contains(&key) {
            return Err(SkipGraphError::DuplicateKey);
        }
        let id = self.nodes.insert(Node::new(key, membership));
        self.attach(id);
        trace!(node = ?id, depth = self.lists[self.leaf_of(id)].level(), "inserted");
        Ok(id)
    }

    /// Delete a node, returning its key.
    ///
    /// # Errors
    ///
    /// Fails with [`NotAMember`][SkipGraphError::NotAMember] if the node has
    /// already been deleted.
    pub fn delete(&mut self, node: NodeId) -> Result<K, SkipGraphError> {
        if self.nodes.get(node).and_then(Node::leaf_list).is_none() {
            return Err(SkipGraphError::NotAMember);
        }
        self.detach(node);
        trace!(node = ?node, "deleted");
        self.nodes
            .remove(node)
            .map(Node::into_key)
            .ok_or(SkipGraphError::NotAMember)
    }

    /// Delete the node holding `key`, returning the key.
    ///
    /// # Errors
    ///
    /// Fails with [`KeyNotFound`][SkipGraphError::KeyNotFound] if no node
    /// holds `key`.
    pub fn remove(&mut self, key: &K) -> Result<K, SkipGraphError> {
        let root = self.root;
        let id = self.lists[root]
            .delete(key, &mut self.nodes)
            .ok_or(SkipGraphError::KeyNotFound)?;
        // The rest of the path is unlinked on detaching.
        self.detach(id);
        trace!(node = ?id, "removed");
        self.nodes
            .remove(id)
            .map(Node::into_key)
            .ok_or(SkipGraphError::NotAMember)
    }

    /// Insert a detached node along the path its membership vector selects.
    pub(crate) fn attach(&mut self, id: NodeId) {
        let mut current = self.root;
        loop {
            let before = self.lists[current].len();
            let inserted = self.lists[current].insert(id, &mut self.nodes);
            assert!(inserted, "attached a duplicate key");
            match before {
                0 => {
                    self.nodes[id].set_leaf_list(Some(current));
                    return;
                }
                1 => {
                    self.split_leaf(current, id);
                    return;
                }
                _ => {
                    let level = self.lists[current].level();
                    let bit = self.nodes[id].membership_mut().bit(level, &mut self.bits);
                    let Some(next) = self.lists[current].child(bit) else {
                        unreachable!("level-{level} list with {before} members lacks a child");
                    };
                    current = next;
                }
            }
        }
    }

    /// Unlink a node from every list on its path and repair the trie. The
    /// node stays in the arena with its membership vector intact.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let leaf = self.leaf_of(id);
        let path: Vec<ListId> = self.ancestors(leaf).collect();
        for list in path {
            self.lists[list].unlink(id, &mut self.nodes);
        }
        self.nodes[id].set_leaf_list(None);
        if let Some(parent) = self.prune_leaf(leaf) {
            self.collapse(parent);
        }
    }

    /// Move a node to the position a new membership vector selects.
    pub(crate) fn relocate(&mut self, id: NodeId, membership: &[bool]) {
        self.detach(id);
        self.nodes[id].membership_mut().reset_to(membership);
        self.attach(id);
    }
}

impl<K> Default for SkipGraph<K> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Trait implementation
// ////////////////////////////////////////////////////////////////////////////

impl<K: Ord> FromIterator<K> for SkipGraph<K> {
    /// Duplicate keys are skipped.
    #[inline]
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

impl<K: Ord> Extend<K> for SkipGraph<K> {
    /// Duplicate keys are skipped.
    #[inline]
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            // A duplicate is the only possible failure.
            let _ = self.insert(key);
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for SkipGraph<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipGraph")
            .field("root", &self.root)
            .field("lists", &self.lists)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

impl<K: fmt::Display> fmt::Display for SkipGraph<K> {
    /// One line per level, deepest first; each list is printed as
    /// `[k1 k2 ...]` in breadth-first order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut levels: Vec<Vec<ListId>> = Vec::new();
        let mut frontier = vec![self.root];
        while !frontier.is_empty() {
            let next = frontier
                .iter()
                .flat_map(|&list| self.lists[list].children())
                .flatten()
                .collect();
            levels.push(frontier);
            frontier = next;
        }
        for (level, lists) in levels.iter().enumerate().rev() {
            write!(f, "level {level}:")?;
            for &list in lists {
                f.write_str(" [")?;
                for (i, id) in self.lists[list].members(&self.nodes).enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", self.nodes[id].key())?;
                }
                f.write_str("]")?;
            }
            if level > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::SkipGraph;
    use crate::{error::SkipGraphError, membership::MembershipVector};

    fn keys(graph: &SkipGraph<i32>) -> Vec<i32> {
        graph.all_members().copied().collect()
    }

    /// Every key is found from every node, and the trie is well formed.
    fn assert_searchable(graph: &SkipGraph<i32>) -> Result<()> {
        graph.check()?;
        for &from in &keys(graph) {
            let Some(u) = graph.find(&from) else {
                panic!("missing {from}");
            };
            for &to in &keys(graph) {
                let v = graph.search(&to, u)?;
                assert_eq!(graph.key(v), Some(&to));
            }
        }
        Ok(())
    }

    #[test]
    fn new() {
        let graph: SkipGraph<i32> = SkipGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert_eq!(keys(&graph), Vec::<i32>::new());
        assert_eq!(graph.children(graph.root_list()), [None, None]);
        assert_eq!(graph.parent(graph.root_list()), None);
        assert!(graph.check().is_ok());
    }

    #[test]
    fn insert_keeps_level_zero_sorted() -> Result<()> {
        let mut graph = SkipGraph::with_seed(1);
        for key in [5, 1, 9, 3] {
            graph.insert(key)?;
        }
        assert_eq!(keys(&graph), vec![1, 3, 5, 9]);
        assert_eq!(graph.len(), 4);
        assert_searchable(&graph)
    }

    #[rstest]
    fn random_inserts(#[values(0, 1, 2, 3)] seed: u64) -> Result<()> {
        let mut graph = SkipGraph::with_seed(seed);
        for key in [17, 4, 12, 0, 33, 8, 25, 19, 2, 40, 11, 6] {
            graph.insert(key)?;
        }
        assert_eq!(graph.len(), 12);
        assert_searchable(&graph)
    }

    #[test]
    fn insert_duplicate() -> Result<()> {
        let mut graph = SkipGraph::with_seed(7);
        graph.insert(1)?;
        graph.insert(2)?;
        let before = graph.to_string();
        assert_eq!(graph.insert(2), Err(SkipGraphError::DuplicateKey));
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.to_string(), before);
        Ok(())
    }

    #[test]
    fn search_miss() -> Result<()> {
        let graph = SkipGraph::balanced(0..8)?;
        let Some(u) = graph.find(&3) else {
            panic!("missing 3");
        };
        assert_eq!(graph.search(&42, u), Err(SkipGraphError::KeyNotFound));
        assert_eq!(graph.search(&-1, u), Err(SkipGraphError::KeyNotFound));
        Ok(())
    }

    #[test]
    fn search_from_deleted_node() -> Result<()> {
        let mut graph = SkipGraph::balanced(0..4)?;
        let Some(u) = graph.find(&1) else {
            panic!("missing 1");
        };
        assert_eq!(graph.delete(u)?, 1);
        assert_eq!(graph.search(&2, u), Err(SkipGraphError::InvalidStartNode));
        assert_eq!(graph.delete(u), Err(SkipGraphError::NotAMember));
        Ok(())
    }

    #[test]
    fn delete_repairs_trie() -> Result<()> {
        let mut graph = SkipGraph::balanced(0..8)?;
        for key in [3, 0, 6, 5] {
            assert_eq!(graph.remove(&key)?, key);
            assert_searchable(&graph)?;
        }
        assert_eq!(keys(&graph), vec![1, 2, 4, 7]);
        assert_eq!(graph.remove(&3), Err(SkipGraphError::KeyNotFound));
        Ok(())
    }

    #[test]
    fn delete_everything() -> Result<()> {
        let mut graph: SkipGraph<i32> = (0..10).collect();
        for key in 0..10 {
            graph.remove(&key)?;
            graph.check()?;
        }
        assert!(graph.is_empty());
        graph.insert(4)?;
        assert_searchable(&graph)
    }

    #[rstest]
    fn insert_then_delete_is_identity(#[values(0, 5, 100)] key: i32) -> Result<()> {
        let mut graph = SkipGraph::balanced([1, 2, 3, 4, 6, 7, 8, 9, 10, 11])?;
        let before = graph.to_string();
        let pairs: Vec<_> = keys(&graph)
            .into_iter()
            .filter_map(|k| graph.find(&k))
            .collect();
        let costs: Vec<usize> = pairs
            .iter()
            .flat_map(|&u| pairs.iter().map(move |&v| (u, v)))
            .map(|(u, v)| graph.search_cost(u, v))
            .collect::<Result<_, _>>()?;

        let id = graph.insert(key)?;
        graph.check()?;
        graph.delete(id)?;
        graph.check()?;

        assert_eq!(graph.to_string(), before);
        let after: Vec<usize> = pairs
            .iter()
            .flat_map(|&u| pairs.iter().map(move |&v| (u, v)))
            .map(|(u, v)| graph.search_cost(u, v))
            .collect::<Result<_, _>>()?;
        assert_eq!(after, costs);
        Ok(())
    }

    #[test]
    fn balanced_layout() -> Result<()> {
        let graph = SkipGraph::balanced(0..8)?;
        graph.check()?;
        assert_snapshot!(graph.to_string(), @r"
        level 3: [0] [4] [2] [6] [1] [5] [3] [7]
        level 2: [0 4] [2 6] [1 5] [3 7]
        level 1: [0 2 4 6] [1 3 5 7]
        level 0: [0 1 2 3 4 5 6 7]
        ");
        Ok(())
    }

    #[test]
    fn spine_layout() -> Result<()> {
        let graph = SkipGraph::spine(0..4)?;
        graph.check()?;
        assert_snapshot!(graph.to_string(), @r"
        level 3: [2] [3]
        level 2: [1] [2 3]
        level 1: [0] [1 2 3]
        level 0: [0 1 2 3]
        ");
        let Some(deepest) = graph.find(&3) else {
            panic!("missing 3");
        };
        assert_eq!(graph.depth(deepest)?, 3);
        Ok(())
    }

    #[test]
    fn from_membership_compresses_shared_bits() -> Result<()> {
        let graph = SkipGraph::from_membership([
            (1, MembershipVector::from(vec![true, false])),
            (2, MembershipVector::from(vec![true, true])),
        ])?;
        graph.check()?;
        assert_snapshot!(graph.to_string(), @r"
        level 1: [1] [2]
        level 0: [1 2]
        ");
        let Some(one) = graph.find(&1) else {
            panic!("missing 1");
        };
        assert_eq!(
            graph.node(one).map(|node| node.membership().to_string()),
            Some("0".to_owned())
        );
        Ok(())
    }

    #[test]
    fn from_membership_duplicate() {
        let built = SkipGraph::from_membership([
            (1, MembershipVector::new()),
            (1, MembershipVector::new()),
        ]);
        assert_eq!(built.err(), Some(SkipGraphError::DuplicateKey));
    }

    #[test]
    fn explicit_membership_insert() -> Result<()> {
        let mut graph = SkipGraph::with_seed(3);
        graph.insert_with_membership(10, MembershipVector::from(vec![false, false]))?;
        graph.insert_with_membership(20, MembershipVector::from(vec![true]))?;
        graph.insert_with_membership(30, MembershipVector::from(vec![false, true]))?;
        graph.check()?;
        assert_snapshot!(graph.to_string(), @r"
        level 2: [10] [30]
        level 1: [10 30] [20]
        level 0: [10 20 30]
        ");
        Ok(())
    }

    #[test]
    fn agreeing_newcomer_takes_complement() -> Result<()> {
        let mut graph = SkipGraph::with_seed(3);
        let a = graph.insert_with_membership(1, MembershipVector::from(vec![true]))?;
        let b = graph.insert_with_membership(2, MembershipVector::from(vec![true]))?;
        graph.check()?;
        let bits = |id| graph.node(id).map(|node| node.membership().to_string());
        assert_eq!(bits(a), Some("1".to_owned()));
        assert_eq!(bits(b), Some("0".to_owned()));
        Ok(())
    }

    #[test]
    fn paths_and_costs() -> Result<()> {
        let graph = SkipGraph::balanced(0..8)?;
        let find = |key: i32| match graph.find(&key) {
            Some(id) => id,
            None => panic!("missing {key}"),
        };
        let (zero, four, seven) = (find(0), find(4), find(7));

        assert_eq!(graph.path(zero)?.len(), 4);
        assert_eq!(graph.path(zero)?.last(), Some(&graph.root_list()));
        assert_eq!(graph.lowest_common_list(zero, seven)?, graph.root_list());
        assert!(graph.shares_pair_list(zero, four));
        assert!(!graph.shares_pair_list(zero, seven));
        assert!(!graph.shares_pair_list(zero, zero));

        assert_eq!(graph.search_cost(zero, four)?, 1);
        assert_eq!(graph.search_cost(zero, zero)?, 0);
        // 0 -> 4 at level 2, 4 -> 6 at level 1, 6 -> 7 at level 0.
        assert_eq!(graph.search_cost(zero, seven)?, 3);

        let located = graph.locate(&7, zero)?;
        assert_eq!(located.node, seven);
        assert_eq!(located.lowest_common_list, graph.root_list());
        Ok(())
    }

    #[test]
    fn introspection() -> Result<()> {
        let graph = SkipGraph::balanced(0..4)?;
        let root = graph.root_list();
        let [Some(left), Some(right)] = graph.children(root) else {
            panic!("root should have two children");
        };
        assert_eq!(graph.members(left).copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(graph.members(right).copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(graph.parent(left), Some(root));
        assert_eq!(graph.list(left).map(|list| list.level()), Some(1));
        Ok(())
    }

    #[test]
    fn from_iterator_skips_duplicates() -> Result<()> {
        let mut graph: SkipGraph<i32> = [3, 1, 3, 2].into_iter().collect();
        graph.extend([2, 4]);
        assert_eq!(keys(&graph), vec![1, 2, 3, 4]);
        assert_searchable(&graph)
    }
}
