//! Structural invariant checker.

use crate::{
    arena::{ListId, NodeId},
    error::SkipGraphError,
    skipgraph::SkipGraph,
};

fn violation(message: String) -> SkipGraphError {
    SkipGraphError::InvariantViolation(message)
}

impl<K: Ord> SkipGraph<K> {
    /// Verify every structural invariant of the skip graph.
    ///
    /// - Each list is sorted and its links are consistent in both directions.
    /// - A list with two or more members has exactly two non-empty children
    ///   that partition its members; a list with one member is a leaf.
    /// - Every node's membership vector starts with the bits of its path, and
    ///   it has a routing table entry at exactly the levels of that path.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`][SkipGraphError::InvariantViolation]
    /// describing the first inconsistency found.
    pub fn check(&self) -> Result<(), SkipGraphError> {
        let root = self
            .lists
            .get(self.root)
            .ok_or_else(|| violation("root list is dead".to_owned()))?;
        if root.parent().is_some() || root.level() != 0 {
            return Err(violation("root list is not at level 0".to_owned()));
        }
        if root.len() != self.nodes.len() {
            return Err(violation(format!(
                "root list has {} members but the graph has {} nodes",
                root.len(),
                self.nodes.len()
            )));
        }

        let mut prefix = Vec::new();
        let reachable = self.check_list(self.root, &mut prefix)?;
        if reachable != self.lists.len() {
            return Err(violation(format!(
                "{} lists are unreachable from the root",
                self.lists.len() - reachable
            )));
        }

        for id in self.lists[self.root].members(&self.nodes) {
            let node = &self.nodes[id];
            let Some(leaf) = node.leaf_list() else {
                return Err(violation(format!("{id:?} has no leaf list")));
            };
            if !node.levels().eq(0..=self.lists[leaf].level()) {
                return Err(violation(format!(
                    "{id:?} has routing entries {:?} but its leaf is at level {}",
                    node.levels().collect::<Vec<_>>(),
                    self.lists[leaf].level()
                )));
            }
        }
        Ok(())
    }

    /// Check a subtree, returning the number of lists in it.
    fn check_list(&self, id: ListId, prefix: &mut Vec<bool>) -> Result<usize, SkipGraphError> {
        let list = self
            .lists
            .get(id)
            .ok_or_else(|| violation(format!("{id:?} is dead")))?;
        if list.level() != prefix.len() {
            return Err(violation(format!(
                "{id:?} is at level {} but {} deep in the trie",
                list.level(),
                prefix.len()
            )));
        }

        let members = self.check_links(id)?;
        match (members.as_slice(), list.children()) {
            ([], [None, None]) if id == self.root => Ok(1),
            ([only], [None, None]) => {
                let node = &self.nodes[*only];
                if node.leaf_list() != Some(id) {
                    return Err(violation(format!(
                        "{only:?} is alone in {id:?} which is not its leaf list"
                    )));
                }
                if !node.membership().starts_with(prefix) {
                    return Err(violation(format!(
                        "{only:?} has membership {} off its path",
                        node.membership()
                    )));
                }
                Ok(1)
            }
            ([_, _, ..], [Some(zero), Some(one)]) => {
                for child in [zero, one] {
                    if self.lists.get(child).and_then(|c| c.parent()) != Some(id) {
                        return Err(violation(format!(
                            "{child:?} does not point back to its parent {id:?}"
                        )));
                    }
                }
                let mut below = self.member_ids(zero);
                below.extend(self.member_ids(one));
                below.sort_by(|&a, &b| self.nodes[a].key().cmp(self.nodes[b].key()));
                if below != members {
                    return Err(violation(format!(
                        "children of {id:?} do not partition its members"
                    )));
                }

                prefix.push(false);
                let zeros = self.check_list(zero, prefix)?;
                prefix.pop();
                prefix.push(true);
                let ones = self.check_list(one, prefix)?;
                prefix.pop();
                Ok(1 + zeros + ones)
            }
            (members, children) => Err(violation(format!(
                "{id:?} has {} members and {} children",
                members.len(),
                children.iter().flatten().count()
            ))),
        }
    }

    /// Walk a list checking order and link symmetry, returning its members.
    fn check_links(&self, id: ListId) -> Result<Vec<NodeId>, SkipGraphError> {
        let list = &self.lists[id];
        let level = list.level();
        let mut members: Vec<NodeId> = Vec::with_capacity(list.len());
        let mut previous: Option<NodeId> = None;
        let mut current = list.head();
        while let Some(node) = current {
            if members.len() >= list.len() {
                return Err(violation(format!(
                    "{id:?} holds more than its {} members",
                    list.len()
                )));
            }
            let Some(links) = self.nodes.get(node).and_then(|n| n.links(level)) else {
                return Err(violation(format!(
                    "{node:?} in {id:?} has no routing entry at level {level}"
                )));
            };
            if links.left != previous {
                return Err(violation(format!(
                    "{node:?} in {id:?} has a stale left link"
                )));
            }
            if let Some(previous) = previous {
                if self.nodes[previous].key() >= self.nodes[node].key() {
                    return Err(violation(format!("{id:?} is not sorted")));
                }
            }
            members.push(node);
            previous = Some(node);
            current = links.right;
        }
        if members.len() != list.len() {
            return Err(violation(format!(
                "{id:?} holds {} members but records {}",
                members.len(),
                list.len()
            )));
        }
        Ok(members)
    }
}
