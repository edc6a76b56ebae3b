#![forbid(unsafe_code)]

//! Non-owning references to bound peer nodes.
//!
//! A [`PeerSet`] keeps its entries in insertion order. Every entry is a
//! `Weak` reference tagged with the node id it points at and the kind of
//! edge it represents, so destroying a node never requires touching the
//! sets that mention it: stale entries are detected and removed the next
//! time someone walks over them.
//!
//! # Invariants
//!
//! 1. At most one entry per peer id.
//! 2. Entries never keep their target alive.
//! 3. Iteration order is insertion order.

use std::fmt;
use std::rc::Weak;

use crate::id::NodeId;

/// The kind of edge an entry represents, seen from the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Bidirectional edge: both ends propagate to each other.
    Strong,
    /// The peer is a weak dependent of this node; this node propagates to it.
    Dependent,
    /// The peer is this node's weak source; kept for unbinding only.
    Source,
}

impl EdgeKind {
    /// Whether mutations travel from the owning node along this edge.
    #[inline]
    #[must_use]
    pub const fn propagates(self) -> bool {
        matches!(self, Self::Strong | Self::Dependent)
    }

    /// Whether this is one end of a weak edge.
    #[inline]
    #[must_use]
    pub const fn is_weak(self) -> bool {
        matches!(self, Self::Dependent | Self::Source)
    }
}

/// One peer reference.
pub struct PeerEntry<T> {
    pub id: NodeId,
    pub kind: EdgeKind,
    pub target: Weak<T>,
}

impl<T> Clone for PeerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            target: Weak::clone(&self.target),
        }
    }
}

impl<T> PeerEntry<T> {
    /// Whether the target still exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

/// Insertion-ordered set of weak peer references.
pub struct PeerSet<T> {
    entries: Vec<PeerEntry<T>>,
}

impl<T> PeerSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a reference. Returns `false` (and changes nothing) if `id` is
    /// already present.
    pub fn insert(&mut self, id: NodeId, kind: EdgeKind, target: Weak<T>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.entries.push(PeerEntry { id, kind, target });
        true
    }

    /// Remove the reference to `id`, returning its edge kind.
    pub fn remove(&mut self, id: NodeId) -> Option<EdgeKind> {
        let pos = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(pos).kind)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Edge kind recorded for `id`, if any.
    #[must_use]
    pub fn kind_of(&self, id: NodeId) -> Option<EdgeKind> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.kind)
    }

    /// Number of entries, including stale ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose target is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_live()).count()
    }

    /// Peer ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    /// Copy of the entries, for walking while the set itself may change.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerEntry<T>> {
        self.entries.clone()
    }

    /// Remove every entry whose target is gone. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(PeerEntry::is_live);
        before - self.entries.len()
    }

    /// Remove and return every entry.
    pub fn drain(&mut self) -> Vec<PeerEntry<T>> {
        std::mem::take(&mut self.entries)
    }
}

impl<T> Default for PeerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PeerSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.id, entry.kind, entry.is_live())),
            )
            .finish()
    }
}
