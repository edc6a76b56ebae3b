#![forbid(unsafe_code)]

//! Process-unique identities for nodes and subscriber actions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for node identities.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Global counter for subscriber action identities.
static ACTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a binding node.
///
/// Peers refer to each other by `NodeId` plus a weak reference; the id is
/// what a propagation pass records in its visited set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh node id.
    pub(crate) fn next() -> Self {
        Self(NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a registered subscriber action, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(u64);

impl ActionId {
    pub(crate) fn next() -> Self {
        Self(ACTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}
