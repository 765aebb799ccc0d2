//! Trie surgery shared by deletion and the restructuring policies.
//!
//! Every primitive here leaves the trie well formed when given a well formed
//! trie, except where noted. Membership vectors are brought back in line with
//! the trie by [`SkipGraph::sync_membership`] once a policy has finished.

use std::cmp::Ordering;

use tracing::debug;

use crate::{
    arena::{ListId, NodeId},
    level_list::LevelList,
    skipgraph::SkipGraph,
};

impl<K> SkipGraph<K> {
    /// Returns `true` if `ancestor` lies on the path from `list` to the root.
    pub(crate) fn is_ancestor(&self, ancestor: ListId, list: ListId) -> bool {
        self.ancestors(list).any(|l| l == ancestor)
    }

    /// The lists from `from` up to, but excluding, `stop`.
    ///
    /// `stop` must be an ancestor of `from` (or `from` itself).
    pub(crate) fn lists_between(&self, from: ListId, stop: ListId) -> Vec<ListId> {
        let mut lists = Vec::new();
        for list in self.ancestors(from) {
            if list == stop {
                return lists;
            }
            lists.push(list);
        }
        panic!("{stop:?} is not an ancestor of {from:?}");
    }

    /// Relabel a whole subtree by `delta` levels.
    ///
    /// The members' routing table entries between the subtree's old and new
    /// levels must already be free.
    pub(crate) fn shift_subtree(&mut self, list: ListId, delta: isize) {
        if delta == 0 {
            return;
        }
        let children = self.lists[list].children();
        if delta < 0 {
            self.lists[list].change_level(delta, &mut self.nodes);
        }
        for child in children.into_iter().flatten() {
            self.shift_subtree(child, delta);
        }
        if delta > 0 {
            self.lists[list].change_level(delta, &mut self.nodes);
        }
    }

    /// Remove an empty list from its parent, returning the parent.
    ///
    /// The root is never removed. The parent is left with a single child,
    /// which the caller must repair.
    pub(crate) fn prune_leaf(&mut self, leaf: ListId) -> Option<ListId> {
        debug_assert!(self.lists[leaf].is_empty(), "pruning a non-empty list");
        let parent = self.lists[leaf].parent()?;
        let bit = self.which_child(leaf)?;
        self.lists[parent].set_child(bit, None);
        self.lists.remove(leaf);
        Some(parent)
    }

    /// Absorb the only child of a redundant list.
    ///
    /// The list must have the same members as its child. The list keeps its
    /// handle; the child's handle dies and the child's subtree moves one level
    /// up. Lists with zero or two children are left alone.
    pub(crate) fn collapse(&mut self, list: ListId) {
        let child = match self.lists[list].children() {
            [Some(child), None] | [None, Some(child)] => child,
            _ => return,
        };
        let level = self.lists[list].level();
        debug!(list = ?list, child = ?child, level, "collapsing redundant list");
        debug_assert_eq!(
            self.lists[list].len(),
            self.lists[child].len(),
            "collapsed list and child differ"
        );

        let ids = self.member_ids(child);
        let Some(absorbed) = self.lists.remove(child) else {
            return;
        };
        for &id in &ids {
            self.nodes[id].clear_level(level + 1);
            self.nodes[id].membership_mut().remove(level);
        }
        let grandchildren = absorbed.children();
        self.lists[list].set_children(grandchildren);
        for grandchild in grandchildren.into_iter().flatten() {
            self.lists[grandchild].set_parent(Some(list));
            self.shift_subtree(grandchild, -1);
        }
        if absorbed.is_leaf() {
            for id in ids {
                self.nodes[id].set_leaf_list(Some(list));
            }
        }
    }

    /// The bits selecting `list` from the root.
    pub(crate) fn prefix(&self, list: ListId) -> Vec<bool> {
        let mut bits: Vec<bool> = self
            .ancestors(list)
            .filter_map(|l| self.which_child(l))
            .collect();
        bits.reverse();
        bits
    }

    /// Rewrite the membership vector of every node below `list` to be exactly
    /// the bits of its path through the trie.
    pub(crate) fn sync_membership(&mut self, list: ListId) {
        let mut prefix = self.prefix(list);
        self.sync_below(list, &mut prefix);
    }

    fn sync_below(&mut self, list: ListId, prefix: &mut Vec<bool>) {
        let (head, children) = {
            let list = &self.lists[list];
            (list.head(), list.children())
        };
        if children == [None, None] {
            if let Some(id) = head {
                self.nodes[id].membership_mut().reset_to(prefix);
            }
            return;
        }
        for (bit, child) in [false, true].into_iter().zip(children) {
            if let Some(child) = child {
                prefix.push(bit);
                self.sync_below(child, prefix);
                prefix.pop();
            }
        }
    }
}

impl<K: Ord> SkipGraph<K> {
    /// Turn a leaf list that has just received a second member into the
    /// parent of two leaf lists.
    ///
    /// The resident member keeps its bit at the list's level, drawing it if
    /// needed; the newcomer is given the complement.
    pub(crate) fn split_leaf(&mut self, list: ListId, newcomer: NodeId) {
        let level = self.lists[list].level();
        let resident = self.lists[list]
            .members(&self.nodes)
            .find(|&id| id != newcomer);
        let Some(resident) = resident else {
            unreachable!("split of a list without a resident");
        };
        let bit = self.nodes[resident]
            .membership_mut()
            .bit(level, &mut self.bits);
        self.nodes[newcomer]
            .membership_mut()
            .set(level, !bit, &mut self.bits);
        for (id, side) in [(resident, bit), (newcomer, !bit)] {
            let mut leaf = LevelList::new(level + 1, Some(list));
            leaf.insert(id, &mut self.nodes);
            let leaf = self.lists.insert(leaf);
            self.lists[list].set_child(side, Some(leaf));
            self.nodes[id].set_leaf_list(Some(leaf));
        }
    }

    /// Exchange two disjoint subtrees below `lowest`, their lowest common
    /// list.
    ///
    /// Members leave every list strictly between their old parent and
    /// `lowest`, are relabelled to their new depth and join every list
    /// strictly between their new parent and `lowest`.
    ///
    /// # Panics
    ///
    /// Panics if either subtree is the root or contains the other.
    pub(crate) fn swap_subtrees(&mut self, a: ListId, b: ListId, lowest: ListId) {
        assert!(
            a != self.root && b != self.root,
            "cannot swap the root list"
        );
        assert!(
            !self.is_ancestor(a, b) && !self.is_ancestor(b, a),
            "cannot swap nested subtrees"
        );
        debug!(a = ?a, b = ?b, lowest = ?lowest, "swapping subtrees");

        let (Some(pa), Some(sa)) = (self.lists[a].parent(), self.which_child(a)) else {
            unreachable!("non-root list without parent");
        };
        let (Some(pb), Some(sb)) = (self.lists[b].parent(), self.which_child(b)) else {
            unreachable!("non-root list without parent");
        };
        let members_a = self.member_ids(a);
        let members_b = self.member_ids(b);
        let above_a = self.lists_between(pa, lowest);
        let above_b = self.lists_between(pb, lowest);

        for &list in &above_a {
            for &id in &members_a {
                self.lists[list].unlink(id, &mut self.nodes);
            }
        }
        for &list in &above_b {
            for &id in &members_b {
                self.lists[list].unlink(id, &mut self.nodes);
            }
        }

        self.lists[pa].set_child(sa, Some(b));
        self.lists[pb].set_child(sb, Some(a));
        self.lists[a].set_parent(Some(pb));
        self.lists[b].set_parent(Some(pa));
        self.shift_subtree(a, depth_change(self.lists[pb].level(), self.lists[a].level()));
        self.shift_subtree(b, depth_change(self.lists[pa].level(), self.lists[b].level()));

        for &list in &above_b {
            for &id in &members_a {
                self.lists[list].insert(id, &mut self.nodes);
            }
        }
        for &list in &above_a {
            for &id in &members_b {
                self.lists[list].insert(id, &mut self.nodes);
            }
        }
    }

    /// Make `upper` and `lower` siblings under a new list.
    ///
    /// `upper` must be a child of some list `base` and `lower` a grandchild of
    /// `base` through `upper`'s sibling. The list between `base` and `lower`
    /// becomes redundant and is collapsed; `upper` moves one level down.
    ///
    /// # Panics
    ///
    /// Panics if the subtrees are not positioned as described.
    pub(crate) fn merge_subtrees(&mut self, upper: ListId, lower: ListId) {
        let base = self.lists[upper].parent();
        let between = self.lists[lower].parent();
        let (Some(base), Some(between)) = (base, between) else {
            panic!("cannot merge the root list");
        };
        assert!(
            between != upper && self.lists[between].parent() == Some(base),
            "merged subtrees must be cousins"
        );
        debug!(upper = ?upper, lower = ?lower, "merging subtrees");

        let (Some(slot), Some(lower_slot)) = (self.which_child(upper), self.which_child(lower))
        else {
            unreachable!("non-root list without parent");
        };
        let moved = self.member_ids(lower);
        for &id in &moved {
            self.lists[between].unlink(id, &mut self.nodes);
        }
        self.lists[between].set_child(lower_slot, None);
        self.collapse(between);

        self.shift_subtree(upper, 1);
        let level = self.lists[base].level() + 1;
        let mut joined = LevelList::new(level, Some(base));
        joined.set_child(slot, Some(upper));
        joined.set_child(!slot, Some(lower));
        let joined = self.lists.insert(joined);
        self.lists[base].set_child(slot, Some(joined));
        self.lists[upper].set_parent(Some(joined));
        self.lists[lower].set_parent(Some(joined));
        for id in self.member_ids(upper).into_iter().chain(moved) {
            self.lists[joined].insert(id, &mut self.nodes);
        }
        self.sync_membership(base);
    }

    /// Move `mover` next to `stay` so the two form a length-2 list.
    ///
    /// Only lists strictly below `lowest`, the lowest common list of the two
    /// nodes, are touched.
    pub(crate) fn move_beside(&mut self, mover: NodeId, stay: NodeId, lowest: ListId) {
        debug!(mover = ?mover, stay = ?stay, lowest = ?lowest, "moving node");
        let old = self.lists_between(self.leaf_of(mover), lowest);
        for &list in &old {
            self.lists[list].unlink(mover, &mut self.nodes);
        }
        let vacated = match old.first() {
            Some(&leaf) => self.prune_leaf(leaf),
            None => None,
        };
        if let Some(parent) = vacated.filter(|&parent| parent != lowest) {
            self.collapse(parent);
        }

        let mut route = self.lists_between(self.leaf_of(stay), lowest);
        route.reverse();
        for &list in &route {
            self.lists[list].insert(mover, &mut self.nodes);
        }
        if let Some(&leaf) = route.last() {
            self.split_leaf(leaf, mover);
        }
        if vacated == Some(lowest) {
            self.collapse(lowest);
        }
        self.sync_membership(lowest);
    }

    /// Recompute the contents, levels and routing tables of every list below
    /// and including `top` from the shape of the trie alone.
    ///
    /// Only the leaf lists' members and the child links are trusted; internal
    /// lists may hold stale members when this is called.
    pub(crate) fn rebuild_subtree(&mut self, top: ListId) {
        let level = self.lists[top]
            .parent()
            .map_or(0, |parent| self.lists[parent].level() + 1);
        debug!(top = ?top, level, "rebuilding subtree");
        let mut leaves = Vec::new();
        self.collect_leaves(top, &mut leaves);
        for &id in &leaves {
            self.nodes[id].clear_from(level);
        }
        self.rebuild_from(top, level);
        self.sync_membership(top);
    }

    fn collect_leaves(&self, list: ListId, leaves: &mut Vec<NodeId>) {
        let list = &self.lists[list];
        if list.is_leaf() {
            leaves.extend(list.head());
            return;
        }
        for child in list.children().into_iter().flatten() {
            self.collect_leaves(child, leaves);
        }
    }

    fn rebuild_from(&mut self, list: ListId, level: usize) -> Vec<NodeId> {
        self.lists[list].set_level(level);
        let sorted = match self.lists[list].children() {
            [None, None] => {
                let head: Vec<NodeId> = self.lists[list].head().into_iter().collect();
                for &id in &head {
                    self.nodes[id].set_leaf_list(Some(list));
                }
                head
            }
            [zero, one] => {
                let zero = zero.map_or_else(Vec::new, |c| self.rebuild_from(c, level + 1));
                let one = one.map_or_else(Vec::new, |c| self.rebuild_from(c, level + 1));
                self.merge_by_key(zero, one)
            }
        };
        self.lists[list].relink(&sorted, &mut self.nodes);
        sorted
    }

    fn merge_by_key(&self, a: Vec<NodeId>, b: Vec<NodeId>) -> Vec<NodeId> {
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let mut a = a.into_iter().peekable();
        let mut b = b.into_iter().peekable();
        loop {
            let take_a = match (a.peek(), b.peek()) {
                (Some(&x), Some(&y)) => {
                    self.nodes[x].key().cmp(self.nodes[y].key()) == Ordering::Less
                }
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => return merged,
            };
            merged.extend(if take_a { a.next() } else { b.next() });
        }
    }
}

/// Level shift taking a subtree rooted at `current` to sit just below
/// `parent`.
#[expect(
    clippy::cast_possible_wrap,
    clippy::as_conversions,
    reason = "Trie depth is far below isize::MAX"
)]
fn depth_change(parent: usize, current: usize) -> isize {
    (parent + 1) as isize - current as isize
}
