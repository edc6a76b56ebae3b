#![forbid(unsafe_code)]

//! Error taxonomy for binding operations.
//!
//! Every error is local, synchronous and recoverable: it is reported to the
//! immediate caller and the node (and its edges) are left exactly as they
//! were before the failed call.

use crate::id::NodeId;
use crate::lease::LeaseToken;

/// Errors from binding, mutation and lease operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// A mutation was attempted on a disabled node.
    #[error("cannot mutate node {node} while it is disabled")]
    MutationWhileDisabled { node: NodeId },
    /// An edge between the two nodes already exists.
    #[error("node {node} is already bound to {peer}")]
    AlreadyBound { node: NodeId, peer: NodeId },
    /// The edge to remove does not exist.
    #[error("node {node} is not bound to {peer}")]
    NotBound { node: NodeId, peer: NodeId },
    /// A node cannot be bound to itself.
    #[error("node {node} cannot be bound to itself")]
    SelfBinding { node: NodeId },
    /// A lease is already active on the node.
    #[error("node {node} is already leased")]
    AlreadyLeased { node: NodeId },
    /// The lease token does not match the active lease, or no lease is active.
    #[error("lease token {token} does not match the active lease on node {node}")]
    InvalidLeaseToken { node: NodeId, token: LeaseToken },
    /// Bind or copy between incompatible node kinds.
    #[error("cannot bind a {found} node to a {expected} node")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A sequence position outside the sequence.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Result alias used throughout bindery.
pub type Result<T, E = BindError> = std::result::Result<T, E>;
