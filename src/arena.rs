//! Slot storage for the nodes and lists of a skip graph.
//!
//! The trie of level lists is a cyclic pointer graph: lists point at their
//! parent and children, nodes point at their neighbours on every level and at
//! their leaf list. Rather than reference counting, every entity lives in an
//! [`Arena`] owned by the skip graph and is referred to by a small `Copy`
//! handle. Handles carry a generation so that a handle to a removed entity is
//! never confused with whatever later reuses its slot.

use std::{fmt, marker::PhantomData, ops};

// ////////////////////////////////////////////////////////////////////////////
// Handles
// ////////////////////////////////////////////////////////////////////////////

/// A typed index into an [`Arena`].
pub(crate) trait Handle: Copy + Eq {
    /// Build a handle from a slot index and the slot's generation.
    fn from_parts(index: usize, generation: u32) -> Self;
    /// The slot index.
    fn index(self) -> usize;
    /// The generation of the slot at the time the handle was issued.
    fn generation(self) -> u32;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl Handle for $name {
            #[inline]
            #[expect(
                clippy::cast_possible_truncation,
                clippy::as_conversions,
                reason = "Arenas never grow beyond u32::MAX slots"
            )]
            fn from_parts(index: usize, generation: u32) -> Self {
                $name {
                    index: index as u32,
                    generation,
                }
            }

            #[inline]
            #[expect(clippy::as_conversions, reason = "u32 always fits in usize")]
            fn index(self) -> usize {
                self.index as usize
            }

            #[inline]
            fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}v{}"), self.index, self.generation)
            }
        }
    };
}

handle!(
    /// Handle to a node of a skip graph.
    ///
    /// Handles stay valid for as long as the node is part of the graph, across
    /// any restructuring. Once the node is deleted the handle is dead and every
    /// lookup through it fails.
    NodeId,
    "n"
);

handle!(
    /// Handle to a level list of a skip graph.
    ///
    /// Restructuring may remove lists; a handle to a removed list is dead.
    ListId,
    "l"
);

// ////////////////////////////////////////////////////////////////////////////
// Arena
// ////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot storage.
#[derive(Clone)]
pub(crate) struct Arena<I, T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    len: usize,
    _handle: PhantomData<fn() -> I>,
}

impl<I: Handle, T> Arena<I, T> {
    /// Create an empty arena.
    pub(crate) fn new() -> Self {
        Arena {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
            _handle: PhantomData,
        }
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Store a value, returning its handle.
    pub(crate) fn insert(&mut self, value: T) -> I {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.value = Some(value);
            I::from_parts(index, entry.generation)
        } else {
            self.entries.push(Entry {
                generation: 0,
                value: Some(value),
            });
            I::from_parts(self.entries.len() - 1, 0)
        }
    }

    /// Remove a value, killing its handle.
    pub(crate) fn remove(&mut self, id: I) -> Option<T> {
        let entry = self.entries.get_mut(id.index())?;
        if entry.generation != id.generation() {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(value)
    }

    /// Get a reference to a live value.
    pub(crate) fn get(&self, id: I) -> Option<&T> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.value.as_ref())
    }

    /// Get a mutable reference to a live value.
    pub(crate) fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.value.as_mut())
    }
}

impl<I: Handle + fmt::Debug, T> ops::Index<I> for Arena<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("dead handle {id:?}"),
        }
    }
}

impl<I: Handle + fmt::Debug, T> ops::IndexMut<I> for Arena<I, T> {
    #[inline]
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("dead handle {id:?}"),
        }
    }
}

impl<I, T: fmt::Debug> fmt::Debug for Arena<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().filter_map(|entry| entry.value.as_ref()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Arena, ListId, NodeId};

    #[test]
    fn insert_get_remove() {
        let mut arena: Arena<NodeId, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
    }

    #[test]
    fn stale_handle_after_reuse() {
        let mut arena: Arena<ListId, u32> = Arena::new();
        let first = arena.insert(1);
        arena.remove(first);
        let second = arena.insert(2);

        // Same slot, new generation.
        assert_ne!(first, second);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&2));
    }

    #[test]
    #[should_panic(expected = "dead handle")]
    fn index_dead_handle() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let id = arena.insert(7);
        arena.remove(id);
        let _ = arena[id];
    }
}
