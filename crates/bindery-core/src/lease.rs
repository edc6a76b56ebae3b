#![forbid(unsafe_code)]

//! Lease state machine.
//!
//! ```text
//! None --begin--> Leased --end--> Returned --(immediately)--> None
//!                                    |
//!                                    +--begin--> Leased
//! ```
//!
//! A lease begun from `Returned` (by a subscriber reacting to the return)
//! stands; the pending move to `None` is dropped.
//!
//! A lease is a temporary exclusive claim on a node's value. At most one
//! lease is active per node; the holder proves ownership with the
//! [`LeaseToken`] returned by `begin`. When the lease was started with
//! `revert_on_return`, the value captured at `begin` is restored at `end`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `AlreadyLeased` | `begin` while `Leased` | State untouched |
//! | `InvalidLeaseToken` | Stale or foreign token, or no active lease | State untouched |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{BindError, Result};
use crate::id::NodeId;

static LEASE_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Lease state of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LeaseState {
    #[default]
    None,
    Leased,
    Returned,
}

/// Proof of an active lease, required to end it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaseToken {
    node: NodeId,
    serial: u64,
}

impl LeaseToken {
    fn issue(node: NodeId) -> Self {
        Self {
            node,
            serial: LEASE_SERIAL.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The node this token was issued by.
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.node
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lease {}@{}", self.serial, self.node)
    }
}

struct ActiveLease<S> {
    token: LeaseToken,
    snapshot: Option<S>,
}

/// Per-node lease bookkeeping. `S` is the storage snapshot type.
pub(crate) struct LeaseSlot<S> {
    state: LeaseState,
    active: Option<ActiveLease<S>>,
}

impl<S> LeaseSlot<S> {
    pub(crate) fn new() -> Self {
        Self {
            state: LeaseState::None,
            active: None,
        }
    }

    pub(crate) fn state(&self) -> LeaseState {
        self.state
    }

    /// Start a lease, keeping `snapshot` for revert.
    pub(crate) fn begin(&mut self, node: NodeId, snapshot: Option<S>) -> Result<LeaseToken> {
        if self.state == LeaseState::Leased {
            return Err(BindError::AlreadyLeased { node });
        }
        let token = LeaseToken::issue(node);
        self.active = Some(ActiveLease { token, snapshot });
        self.state = LeaseState::Leased;
        Ok(token)
    }

    /// Validate `token` against the active lease without consuming it.
    pub(crate) fn check(&self, node: NodeId, token: LeaseToken) -> Result<()> {
        match &self.active {
            Some(active) if self.state == LeaseState::Leased && active.token == token => Ok(()),
            _ => Err(BindError::InvalidLeaseToken { node, token }),
        }
    }

    /// Close the active lease, returning its snapshot. Leaves the state at
    /// `Leased`; the caller drives the `Returned`/`None` transitions.
    pub(crate) fn release(&mut self, node: NodeId, token: LeaseToken) -> Result<Option<S>> {
        self.check(node, token)?;
        Ok(self.active.take().and_then(|active| active.snapshot))
    }

    /// Move from `from` to `next`. Returns `false`, leaving the state
    /// alone, if the slot is no longer in `from`.
    pub(crate) fn advance(&mut self, from: LeaseState, next: LeaseState) -> bool {
        if self.state != from {
            return false;
        }
        self.state = next;
        true
    }
}

impl<S> fmt::Debug for LeaseSlot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseSlot")
            .field("state", &self.state)
            .field("reverts", &self.active.as_ref().is_some_and(|a| a.snapshot.is_some()))
            .finish()
    }
}
