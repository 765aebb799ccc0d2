//! Errors reported by skip graph operations.

use thiserror::Error;

/// Errors that can occur when operating on a [`SkipGraph`][crate::SkipGraph]
/// or one of its self-adjusting wrappers.
///
/// All variants except [`InvariantViolation`][SkipGraphError::InvariantViolation]
/// are ordinary outcomes that the caller is expected to handle. An invariant
/// violation means a restructuring step corrupted the trie and the structure
/// can no longer be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum SkipGraphError {
    /// The key is already stored in the skip graph.
    #[error("key is already present.")]
    DuplicateKey,
    /// No node with the requested key is stored in the skip graph.
    #[error("key not found.")]
    KeyNotFound,
    /// The node handle does not refer to a current member of the skip graph.
    #[error("node is not a member of the skip graph.")]
    NotAMember,
    /// A search was started from a node that is not a member of the skip
    /// graph.
    #[error("search must start from a member of the skip graph.")]
    InvalidStartNode,
    /// The internal structure of the skip graph is inconsistent.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
