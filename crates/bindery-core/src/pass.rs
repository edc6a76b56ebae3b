#![forbid(unsafe_code)]

//! Propagation passes.
//!
//! A [`Pass`] is created for every external call that walks the graph and
//! is threaded by reference through the recursive walk. It records every
//! node the walk has entered; entering a node twice is refused, which is
//! the only thing that makes cyclic graphs safe.
//!
//! Passes are plain values owned by the call that started them, so a
//! subscriber that issues a fresh mutation from inside a callback starts
//! its own pass and never sees (or disturbs) the outer one.
//!
//! A guarded pass (opened by an ordinary mutation) also refuses to apply
//! the change on a disabled peer. State sync and lease revert open
//! unguarded passes, so they reach disabled peers too.

use ahash::AHashSet;

use crate::id::NodeId;

/// Visited set for one walk of the binding graph.
#[derive(Debug, Default)]
pub(crate) struct Pass {
    visited: AHashSet<NodeId>,
    guarded: bool,
}

impl Pass {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A pass that skips disabled peers.
    pub(crate) fn guarded() -> Self {
        Self {
            guarded: true,
            ..Self::default()
        }
    }

    pub(crate) fn is_guarded(&self) -> bool {
        self.guarded
    }

    /// Mark `id` visited. Returns `false` if it already was.
    pub(crate) fn enter(&mut self, id: NodeId) -> bool {
        self.visited.insert(id)
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.visited.contains(&id)
    }

    /// Number of nodes entered so far.
    pub(crate) fn len(&self) -> usize {
        self.visited.len()
    }
}
