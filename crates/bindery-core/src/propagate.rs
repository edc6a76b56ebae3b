#![forbid(unsafe_code)]

//! The propagation engine.
//!
//! A mutation is applied to the node that received it, then recursively to
//! every live peer reachable over propagating edges, then announced to the
//! node's own subscribers. Each node runs the same sequence when the walk
//! reaches it, so for any single node the order is always
//! apply → propagate → notify.
//!
//! # Invariants
//!
//! 1. A node is entered at most once per [`Pass`]; re-entry is a silent
//!    no-op, which makes cycles terminate.
//! 2. Peers are visited in peer-set insertion order; the node a walk came
//!    from is skipped.
//! 3. No `RefCell` borrow is held while a peer is visited or a subscriber
//!    runs.
//! 4. A peer reference found dead during the walk is removed from the set
//!    that holds it, in the same walk.
//! 5. In a guarded pass a disabled peer is left untouched and its own peers
//!    are not reached through it.

use crate::error::{BindError, Result};
use crate::event::ValueChanged;
use crate::id::NodeId;
use crate::node::{NodeCell, NodeRc};
use crate::pass::Pass;
use crate::queue::{NotificationQueue, fire_all};
use crate::storage::{Outcome, Storage};

/// Visit every live peer of `cell` that a mutation should reach.
///
/// Walks a snapshot of the peer set so visits may bind, unbind or drop
/// nodes; an entry removed by an earlier visit is skipped, a dead entry is
/// pruned.
pub(crate) fn walk_peers<S: Storage>(
    cell: &NodeRc<S>,
    from: Option<NodeId>,
    pass: &mut Pass,
    mut visit: impl FnMut(&NodeRc<S>, &mut Pass),
) {
    let (id, entries) = {
        let node = cell.borrow();
        (node.id, node.peers.snapshot())
    };

    for entry in entries {
        if !entry.kind.propagates() || Some(entry.id) == from || pass.contains(entry.id) {
            continue;
        }
        if !cell.borrow().peers.contains(entry.id) {
            continue;
        }
        match entry.target.upgrade() {
            Some(peer) => visit(&peer, pass),
            None => {
                cell.borrow_mut().peers.remove(entry.id);
                tracing::trace!(node = %id, peer = %entry.id, "pruned stale peer");
            }
        }
    }
}

/// Apply `op` to `cell` unless the pass has already been there.
///
/// Returns `Ok(None)` for an already visited node.
///
/// # Errors
///
/// `MutationWhileDisabled` for a disabled node in a guarded pass, or the
/// error `op` returned.
pub(crate) fn apply<S, R, F>(
    cell: &NodeRc<S>,
    from: Option<NodeId>,
    pass: &mut Pass,
    op: &F,
) -> Result<Option<R>>
where
    S: Storage,
    F: Fn(&mut S) -> Result<Outcome<R, S::Event>>,
{
    let (id, disabled) = {
        let node = cell.borrow();
        (node.id, node.disabled)
    };
    if !pass.enter(id) {
        return Ok(None);
    }
    if disabled && pass.is_guarded() {
        return Err(BindError::MutationWhileDisabled { node: id });
    }
    apply_entered(cell, id, from, pass, op).map(Some)
}

/// Apply `op` to a node the pass has just entered, propagate, notify.
pub(crate) fn apply_entered<S, R, F>(
    cell: &NodeRc<S>,
    id: NodeId,
    from: Option<NodeId>,
    pass: &mut Pass,
    op: &F,
) -> Result<R>
where
    S: Storage,
    F: Fn(&mut S) -> Result<Outcome<R, S::Event>>,
{
    let outcome = op(&mut cell.borrow_mut().storage)?;
    let (result, event) = match outcome {
        Outcome::Unchanged(result) => return Ok(result),
        Outcome::Changed(result, event) => (result, event),
    };

    walk_peers(cell, from, pass, |peer, pass| {
        if let Err(err) = apply(peer, Some(id), pass, op) {
            let peer_id = peer.borrow().id;
            tracing::warn!(
                node = %id,
                peer = %peer_id,
                error = %err,
                "peer rejected propagated mutation"
            );
        }
    });

    notify(cell, |node| &node.on_change, &event);
    Ok(result)
}

/// Set the disabled flag on `cell` and everything reachable from it.
///
/// Subscribers of a node are told only when its flag actually changed,
/// unless `force` is set.
pub(crate) fn set_disabled<S: Storage>(
    cell: &NodeRc<S>,
    from: Option<NodeId>,
    pass: &mut Pass,
    value: bool,
    force: bool,
) {
    let (id, old) = {
        let mut node = cell.borrow_mut();
        if !pass.enter(node.id) {
            return;
        }
        (node.id, std::mem::replace(&mut node.disabled, value))
    };

    walk_peers(cell, from, pass, |peer, pass| {
        set_disabled(peer, Some(id), pass, value, force);
    });

    if old != value || force {
        notify(
            cell,
            |node| &node.on_disabled_change,
            &ValueChanged::new(old, value),
        );
    }
}

/// Run one of the node's queues with `event`, outside any borrow.
pub(crate) fn notify<S, E>(
    cell: &NodeRc<S>,
    queue: impl FnOnce(&NodeCell<S>) -> &NotificationQueue<E>,
    event: &E,
) where
    S: Storage,
{
    let actions = {
        let node = cell.borrow();
        queue(&*node).snapshot()
    };
    fire_all(&actions, event);
}
