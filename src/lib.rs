//! A skip graph is a binary trie of sorted, doubly linked lists.
//!
//! Every node carries a membership vector of bits. The level-0 list holds all
//! nodes, and each list with two or more members splits them between two
//! child lists by the next bit of their vectors. Conceptually, a skip graph
//! holding the keys `0..8` resembles:
//!
//! ```text
//! level 3: [0] [4] [2] [6] [1] [5] [3] [7]
//! level 2: [0 4] [2 6] [1 5] [3 7]
//! level 1: [0 2 4 6] [1 3 5 7]
//! level 0: [0 1 2 3 4 5 6 7]
//! ```
//!
//! A search starts in the leaf list of the searching node and climbs towards
//! the root until it meets the key, so two nodes sharing a deep list are
//! cheap to route between.
//!
//! The [`policy`] module provides self-adjusting variants which reshape the
//! trie after every search, pulling the nodes that talk to each other into a
//! common length-2 list:
//!
//! ```
//! use skipgraph::{SkipGraph, policy::{SelfAdjusting, TreeSwap}};
//!
//! let graph = SkipGraph::balanced(0..8).unwrap();
//! let mut graph = SelfAdjusting::with_graph(graph, TreeSwap::default());
//! let seven = graph.find(&7).unwrap();
//! let zero = graph.search(&0, seven).unwrap();
//! assert!(graph.graph().shares_pair_list(zero, seven));
//! ```
//!
//! Nodes and lists live in arenas and are named by the copyable handles
//! [`NodeId`] and [`ListId`]. The structure is single-threaded and provides no
//! internal synchronisation.

mod arena;
pub mod coin;
pub mod error;
pub mod level_list;
pub mod membership;
pub mod node;
pub mod policy;
pub mod skipgraph;

pub use arena::{ListId, NodeId};
pub use coin::{Coin, CoinError};
pub use error::SkipGraphError;
pub use membership::MembershipVector;
pub use policy::{
    AdaptiveLru, BottomUpMerge, Braided, ProbDemote, Restructure, SelfAdjusting, Splay, TreeSwap,
};
pub use skipgraph::{Located, SkipGraph};
