#![forbid(unsafe_code)]

//! The binding node.
//!
//! # Design
//!
//! [`Node<S>`] is a handle to shared, reference-counted state
//! (`Rc<RefCell<..>>`); cloning it yields another handle to the **same**
//! node. A node owns its storage, a disabled flag, lease state, a
//! [`PeerSet`] of weak references to bound nodes and three notification
//! queues (storage change, disabled change, lease change).
//!
//! Edges never own their target. Dropping the last handle to a node
//! destroys it; the nodes that still reference it notice the next time
//! they walk over the edge and prune it then.
//!
//! # Mutation template
//!
//! Every mutation entering through [`Node::mutate`]:
//!
//! 1. fails with `MutationWhileDisabled` if the node is disabled (nothing
//!    else happens);
//! 2. opens a fresh propagation pass and enters the node;
//! 3. applies the change to the local storage;
//! 4. re-applies the same change to every live peer reachable over
//!    propagating edges, each at most once per pass;
//! 5. notifies the node's change subscribers.
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation from a subscriber**: allowed. It starts a new
//!   pass; the outer pass is unaffected.
//! - **Peer dropped mid-walk**: the dead reference is pruned and the walk
//!   continues.
//! - **Operation not applicable on a diverged weak dependent**: that peer is
//!   skipped with a warning; the caller still gets its result.
//! - **Peer disabled on its own** (a weak dependent disabled apart from its
//!   source): skipped the same way. State sync and lease revert still reach
//!   it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::binding::{Binding, BindingKind};
use crate::error::{BindError, Result};
use crate::event::ValueChanged;
use crate::id::{ActionId, NodeId};
use crate::lease::{LeaseSlot, LeaseState, LeaseToken};
use crate::options::NodeOptions;
use crate::pass::Pass;
use crate::peers::{EdgeKind, PeerSet};
use crate::propagate;
use crate::queue::{Action, NotificationQueue};
use crate::storage::{self, Outcome, Storage};

pub(crate) type NodeRc<S> = Rc<RefCell<NodeCell<S>>>;

/// Shared interior of a [`Node`].
pub(crate) struct NodeCell<S: Storage> {
    pub(crate) id: NodeId,
    pub(crate) label: Option<String>,
    pub(crate) storage: S,
    pub(crate) disabled: bool,
    pub(crate) lease: LeaseSlot<S>,
    pub(crate) peers: PeerSet<RefCell<NodeCell<S>>>,
    pub(crate) on_change: NotificationQueue<S::Event>,
    pub(crate) on_disabled_change: NotificationQueue<ValueChanged<bool>>,
    pub(crate) on_lease_change: NotificationQueue<ValueChanged<LeaseState>>,
}

impl<S: Storage> NodeCell<S> {
    fn new(storage: S, options: NodeOptions) -> Self {
        Self {
            id: NodeId::next(),
            label: options.label,
            storage,
            disabled: options.disabled,
            lease: LeaseSlot::new(),
            peers: PeerSet::new(),
            on_change: NotificationQueue::new(),
            on_disabled_change: NotificationQueue::new(),
            on_lease_change: NotificationQueue::new(),
        }
    }

    fn subscriber_count(&self) -> usize {
        self.on_change.len() + self.on_disabled_change.len() + self.on_lease_change.len()
    }
}

/// A container that participates in the binding graph.
///
/// # Example
///
/// ```
/// use bindery_core::{Node, Outcome, Scalar, ValueChanged};
///
/// let a = Node::new(Scalar(1));
/// let b = Node::new(Scalar(0));
/// b.bind_to(&a).unwrap();
/// assert_eq!(b.read(|s| s.0), 1);
///
/// a.mutate(|s: &mut Scalar<i32>| {
///     let old = std::mem::replace(&mut s.0, 5);
///     Ok(Outcome::Changed(old, ValueChanged::new(old, 5)))
/// })
/// .unwrap();
/// assert_eq!(b.read(|s| s.0), 5);
/// ```
pub struct Node<S: Storage> {
    pub(crate) cell: NodeRc<S>,
}

impl<S: Storage> Clone for Node<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<S: Storage> Node<S> {
    /// Create an enabled, unbound node holding `storage`.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_options(storage, NodeOptions::default())
    }

    /// Create a node with explicit options.
    #[must_use]
    pub fn with_options(storage: S, options: NodeOptions) -> Self {
        Self {
            cell: Rc::new(RefCell::new(NodeCell::new(storage, options))),
        }
    }

    /// Stable identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.cell.borrow().id
    }

    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.cell.borrow().label.clone()
    }

    /// Access the storage by reference.
    ///
    /// `f` must not mutate or bind this node.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.cell.borrow().storage)
    }

    /// Mutable access to this node's storage alone. No disabled guard, no
    /// propagation and no notification.
    ///
    /// Only for housekeeping that leaves the observable contents unchanged.
    /// `f` must not touch this node through another handle.
    pub fn maintain<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.cell.borrow_mut().storage)
    }

    /// Clone of the current storage.
    #[must_use]
    pub fn snapshot(&self) -> S {
        self.cell.borrow().storage.clone()
    }

    /// Whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Non-owning handle to this node.
    #[must_use]
    pub fn downgrade(&self) -> WeakNode<S> {
        WeakNode {
            id: self.id(),
            cell: Rc::downgrade(&self.cell),
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Apply `op` here and on every reachable peer, then notify.
    ///
    /// `op` is invoked once per node entered by the pass. Its result on
    /// this node is returned; results on peers are discarded. An error from
    /// `op` on this node aborts the call before anything has changed.
    pub fn mutate<R, F>(&self, op: F) -> Result<R>
    where
        F: Fn(&mut S) -> Result<Outcome<R, S::Event>>,
    {
        let id = {
            let node = self.cell.borrow();
            if node.disabled {
                return Err(BindError::MutationWhileDisabled { node: node.id });
            }
            node.id
        };
        let _span = tracing::trace_span!("mutate", node = %id).entered();

        let mut pass = Pass::guarded();
        pass.enter(id);
        let result = propagate::apply_entered(&self.cell, id, None, &mut pass, &op)?;
        tracing::trace!(node = %id, visited = pass.len(), "propagation pass complete");
        Ok(result)
    }

    /// Replace the storage with `next`, bypassing the disabled guard.
    fn overwrite(&self, next: &S) -> Result<()> {
        let id = self.id();
        let mut pass = Pass::new();
        pass.enter(id);
        let op = |current: &mut S| Ok(storage::overwrite(current, next));
        propagate::apply_entered(&self.cell, id, None, &mut pass, &op)
    }

    /// Make this node's storage and disabled flag equal to `source`'s.
    fn sync_from(&self, source: &Node<S>) -> Result<()> {
        let (storage, disabled) = {
            let source = source.cell.borrow();
            (source.storage.clone(), source.disabled)
        };
        self.overwrite(&storage)?;
        self.spread_disabled(disabled, true);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Disabled state
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.cell.borrow().disabled
    }

    /// Set the disabled flag here and on every reachable peer.
    ///
    /// A no-op when the flag already has this value.
    pub fn set_disabled(&self, disabled: bool) {
        if self.is_disabled() == disabled {
            return;
        }
        self.spread_disabled(disabled, false);
    }

    fn spread_disabled(&self, disabled: bool, force: bool) {
        let mut pass = Pass::new();
        propagate::set_disabled(&self.cell, None, &mut pass, disabled, force);
    }

    // -----------------------------------------------------------------------
    // Binding
    // -----------------------------------------------------------------------

    /// Bind this node and `other` with a strong (bidirectional) edge.
    ///
    /// This node first takes `other`'s storage and disabled flag; afterwards
    /// a mutation on either side reaches the other.
    ///
    /// # Errors
    ///
    /// `SelfBinding` for `other == self`, `AlreadyBound` if any edge between
    /// the two exists. Nothing changes on error.
    pub fn bind_to(&self, other: &Node<S>) -> Result<Binding<S>> {
        self.ensure_unlinked(other)?;
        self.sync_from(other)?;
        self.link(other, EdgeKind::Strong, EdgeKind::Strong);
        tracing::debug!(node = %self.id(), peer = %other.id(), "bound");
        Ok(Binding::new(BindingKind::Strong, self, other))
    }

    /// Make this node a weak dependent of `source`.
    ///
    /// This node first takes `source`'s state. Afterwards `source`'s
    /// mutations reach this node, but this node's mutations never reach
    /// `source`, and this node does not keep `source` alive.
    ///
    /// # Errors
    ///
    /// Same as [`bind_to`](Self::bind_to).
    pub fn weak_bind(&self, source: &Node<S>) -> Result<Binding<S>> {
        self.ensure_unlinked(source)?;
        self.sync_from(source)?;
        self.link(source, EdgeKind::Source, EdgeKind::Dependent);
        tracing::debug!(node = %self.id(), source = %source.id(), "weakly bound");
        Ok(Binding::new(BindingKind::Weak, self, source))
    }

    fn ensure_unlinked(&self, other: &Node<S>) -> Result<()> {
        let (id, peer) = (self.id(), other.id());
        if id == peer {
            return Err(BindError::SelfBinding { node: id });
        }
        let linked =
            self.cell.borrow().peers.contains(peer) || other.cell.borrow().peers.contains(id);
        if linked {
            return Err(BindError::AlreadyBound { node: id, peer });
        }
        Ok(())
    }

    fn link(&self, other: &Node<S>, mine: EdgeKind, theirs: EdgeKind) {
        let (id, peer) = (self.id(), other.id());
        self.cell
            .borrow_mut()
            .peers
            .insert(peer, mine, Rc::downgrade(&other.cell));
        other
            .cell
            .borrow_mut()
            .peers
            .insert(id, theirs, Rc::downgrade(&self.cell));
    }

    fn unlink(&self, other: &Node<S>) {
        let (id, peer) = (self.id(), other.id());
        self.cell.borrow_mut().peers.remove(peer);
        other.cell.borrow_mut().peers.remove(id);
    }

    /// Remove every edge of this node, in both directions, and clear its
    /// subscribers.
    pub fn unbind(&self) {
        let (id, edges) = {
            let mut node = self.cell.borrow_mut();
            node.on_change.clear();
            node.on_disabled_change.clear();
            node.on_lease_change.clear();
            (node.id, node.peers.drain())
        };
        for entry in &edges {
            if let Some(peer) = entry.target.upgrade() {
                peer.borrow_mut().peers.remove(id);
            }
        }
        tracing::debug!(node = %id, edges = edges.len(), "unbound");
    }

    /// Remove the strong edge to `other`.
    ///
    /// # Errors
    ///
    /// `NotBound` if there is no strong edge between the two.
    pub fn unbind_from(&self, other: &Node<S>) -> Result<()> {
        if self.edge_to(other) != Some(EdgeKind::Strong) {
            return Err(BindError::NotBound {
                node: self.id(),
                peer: other.id(),
            });
        }
        self.unlink(other);
        tracing::debug!(node = %self.id(), peer = %other.id(), "unbound from peer");
        Ok(())
    }

    /// Remove the weak edge between this node and `other`, whichever side
    /// is the source.
    ///
    /// # Errors
    ///
    /// `NotBound` if there is no weak edge between the two.
    pub fn unbind_weak_from(&self, other: &Node<S>) -> Result<()> {
        match self.edge_to(other) {
            Some(kind) if kind.is_weak() => {
                self.unlink(other);
                tracing::debug!(node = %self.id(), peer = %other.id(), "weak edge removed");
                Ok(())
            }
            _ => Err(BindError::NotBound {
                node: self.id(),
                peer: other.id(),
            }),
        }
    }

    /// Kind of the edge from this node to `other`, if any.
    #[must_use]
    pub fn edge_to(&self, other: &Node<S>) -> Option<EdgeKind> {
        let peer = other.id();
        self.cell.borrow().peers.kind_of(peer)
    }

    #[must_use]
    pub fn is_bound_to(&self, other: &Node<S>) -> bool {
        self.edge_to(other).is_some()
    }

    /// Number of edges whose other end is still alive.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.cell.borrow().peers.live_count()
    }

    /// Ids of all recorded peers (including dead ones not yet pruned).
    #[must_use]
    pub fn peer_ids(&self) -> Vec<NodeId> {
        self.cell.borrow().peers.ids().collect()
    }

    /// Drop references to destroyed peers now. Returns how many were dropped.
    pub fn prune_peers(&self) -> usize {
        let pruned = self.cell.borrow_mut().peers.prune();
        if pruned > 0 {
            tracing::trace!(node = %self.id(), pruned, "pruned stale peers");
        }
        pruned
    }

    // -----------------------------------------------------------------------
    // Copies
    // -----------------------------------------------------------------------

    /// Unbound snapshot: same storage, disabled flag and label; no edges,
    /// no subscribers.
    #[must_use]
    pub fn copy(&self) -> Node<S> {
        let node = self.cell.borrow();
        let options = NodeOptions {
            label: node.label.clone(),
            disabled: node.disabled,
        };
        Node::with_options(node.storage.clone(), options)
    }

    /// Overwrite `target`'s storage and disabled flag with this node's,
    /// without creating an edge. The change reaches `target`'s own peers.
    pub fn copy_to(&self, target: &Node<S>) -> Result<()> {
        if self.ptr_eq(target) {
            return Ok(());
        }
        target.sync_from(self)?;
        tracing::debug!(node = %self.id(), target = %target.id(), "copied state");
        Ok(())
    }

    /// Fresh node strongly bound to this one.
    #[must_use]
    pub fn bound_copy(&self) -> Node<S> {
        let copy = self.copy();
        copy.link(self, EdgeKind::Strong, EdgeKind::Strong);
        copy
    }

    /// Fresh weak dependent of this node.
    #[must_use]
    pub fn weak_copy(&self) -> Node<S> {
        let copy = self.copy();
        copy.link(self, EdgeKind::Source, EdgeKind::Dependent);
        copy
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Subscribe to storage changes.
    pub fn on_change(&self, action: impl Fn(&S::Event) + 'static) -> ActionId {
        self.cell.borrow_mut().on_change.push(action)
    }

    /// Subscribe to storage changes and receive one synthetic event
    /// presenting the current contents as just added.
    pub fn on_change_immediate(&self, action: impl Fn(&S::Event) + 'static) -> ActionId {
        let action: Action<S::Event> = Rc::new(action);
        let id = self
            .cell
            .borrow_mut()
            .on_change
            .push_shared(Rc::clone(&action));
        let replay = self.cell.borrow().storage.replay();
        action(&replay);
        id
    }

    /// Subscribe to disabled-flag changes.
    pub fn on_disabled_change(&self, action: impl Fn(&ValueChanged<bool>) + 'static) -> ActionId {
        self.cell.borrow_mut().on_disabled_change.push(action)
    }

    /// Subscribe to disabled-flag changes, replaying the current flag once.
    pub fn on_disabled_change_immediate(
        &self,
        action: impl Fn(&ValueChanged<bool>) + 'static,
    ) -> ActionId {
        let action: Action<ValueChanged<bool>> = Rc::new(action);
        let id = self
            .cell
            .borrow_mut()
            .on_disabled_change
            .push_shared(Rc::clone(&action));
        let disabled = self.is_disabled();
        action(&ValueChanged::new(disabled, disabled));
        id
    }

    /// Subscribe to lease-state changes.
    pub fn on_lease_change(
        &self,
        action: impl Fn(&ValueChanged<LeaseState>) + 'static,
    ) -> ActionId {
        self.cell.borrow_mut().on_lease_change.push(action)
    }

    /// Subscribe to lease-state changes, replaying the current state once.
    pub fn on_lease_change_immediate(
        &self,
        action: impl Fn(&ValueChanged<LeaseState>) + 'static,
    ) -> ActionId {
        let action: Action<ValueChanged<LeaseState>> = Rc::new(action);
        let id = self
            .cell
            .borrow_mut()
            .on_lease_change
            .push_shared(Rc::clone(&action));
        let state = self.lease_state();
        action(&ValueChanged::new(state, state));
        id
    }

    /// Remove one subscriber from whichever queue holds it.
    pub fn unsubscribe(&self, id: ActionId) -> bool {
        let mut node = self.cell.borrow_mut();
        node.on_change.remove(id)
            || node.on_disabled_change.remove(id)
            || node.on_lease_change.remove(id)
    }

    /// Drop every subscriber of every queue.
    pub fn clear_subscribers(&self) {
        let mut node = self.cell.borrow_mut();
        node.on_change.clear();
        node.on_disabled_change.clear();
        node.on_lease_change.clear();
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.cell.borrow().subscriber_count()
    }

    // -----------------------------------------------------------------------
    // Lease
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn lease_state(&self) -> LeaseState {
        self.cell.borrow().lease.state()
    }

    /// Start a lease, optionally capturing the current storage for revert.
    ///
    /// # Errors
    ///
    /// `AlreadyLeased` if a lease is active.
    pub fn begin_lease(&self, revert_on_return: bool) -> Result<LeaseToken> {
        let (old, token) = {
            let mut guard = self.cell.borrow_mut();
            let node = &mut *guard;
            let old = node.lease.state();
            let snapshot = revert_on_return.then(|| node.storage.clone());
            (old, node.lease.begin(node.id, snapshot)?)
        };
        tracing::debug!(node = %token.node(), %token, revert_on_return, "lease begun");
        propagate::notify(
            &self.cell,
            |node| &node.on_lease_change,
            &ValueChanged::new(old, LeaseState::Leased),
        );
        Ok(token)
    }

    /// End the lease identified by `token`, restoring the captured storage
    /// if the lease was started with `revert_on_return`.
    ///
    /// Subscribers see `Leased → Returned` then `Returned → None`. If a
    /// subscriber begins a new lease on `Returned`, the second step is
    /// skipped and the new lease stays active.
    ///
    /// # Errors
    ///
    /// `InvalidLeaseToken` if `token` is not the active lease.
    pub fn end_lease(&self, token: LeaseToken) -> Result<()> {
        let snapshot = {
            let mut guard = self.cell.borrow_mut();
            let node = &mut *guard;
            node.lease.release(node.id, token)?
        };
        if let Some(snapshot) = snapshot {
            self.overwrite(&snapshot)?;
        }
        let mut from = LeaseState::Leased;
        for next in [LeaseState::Returned, LeaseState::None] {
            if !self.cell.borrow_mut().lease.advance(from, next) {
                tracing::debug!(node = %token.node(), %token, "lease re-taken while returning");
                break;
            }
            propagate::notify(
                &self.cell,
                |node| &node.on_lease_change,
                &ValueChanged::new(from, next),
            );
            from = next;
        }
        tracing::debug!(node = %token.node(), %token, "lease ended");
        Ok(())
    }
}

impl<S: Storage + Default> Default for Node<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Storage + fmt::Debug> fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.cell.borrow();
        f.debug_struct("Node")
            .field("id", &node.id)
            .field("label", &node.label)
            .field("storage", &node.storage)
            .field("disabled", &node.disabled)
            .field("lease", &node.lease)
            .field("peers", &node.peers)
            .field("subscriber_count", &node.subscriber_count())
            .finish()
    }
}

/// Non-owning handle to a [`Node`].
pub struct WeakNode<S: Storage> {
    id: NodeId,
    cell: Weak<RefCell<NodeCell<S>>>,
}

impl<S: Storage> Clone for WeakNode<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cell: Weak::clone(&self.cell),
        }
    }
}

impl<S: Storage> WeakNode<S> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get a strong handle if the node still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Node<S>> {
        self.cell.upgrade().map(|cell| Node { cell })
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.cell.strong_count() > 0
    }
}

impl<S: Storage> fmt::Debug for WeakNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNode")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindable::Scalar;
    use std::cell::Cell;

    type IntNode = Node<Scalar<i32>>;

    fn int(value: i32) -> IntNode {
        Node::new(Scalar(value))
    }

    fn get(node: &IntNode) -> i32 {
        node.read(|s| s.0)
    }

    /// Set op that counts how many nodes it was applied to.
    fn set_counting(node: &IntNode, value: i32, applied: &Cell<u32>) -> Result<i32> {
        node.mutate(|s: &mut Scalar<i32>| {
            applied.set(applied.get() + 1);
            let old = std::mem::replace(&mut s.0, value);
            Ok(Outcome::Changed(old, ValueChanged::new(old, value)))
        })
    }

    #[test]
    fn strong_bind_syncs_and_propagates_both_ways() {
        let x = int(7);
        let y = int(0);
        y.bind_to(&x).unwrap();
        assert_eq!(get(&y), 7, "bind takes the other side's value");

        let applied = Cell::new(0);
        set_counting(&x, 1, &applied).unwrap();
        assert_eq!(get(&y), 1);
        set_counting(&y, 2, &applied).unwrap();
        assert_eq!(get(&x), 2);
        assert_eq!(applied.get(), 4);
    }

    #[test]
    fn cycle_applies_once_per_node() {
        let a = int(0);
        let b = int(0);
        let c = int(0);
        a.bind_to(&b).unwrap();
        b.bind_to(&c).unwrap();
        c.bind_to(&a).unwrap();

        let applied = Cell::new(0);
        set_counting(&a, 9, &applied).unwrap();
        assert_eq!(applied.get(), 3);
        assert_eq!((get(&a), get(&b), get(&c)), (9, 9, 9));
    }

    #[test]
    fn rebinding_is_rejected() {
        let x = int(0);
        let y = int(0);
        y.bind_to(&x).unwrap();
        let err = x.bind_to(&y).unwrap_err();
        assert_eq!(err, BindError::AlreadyBound { node: x.id(), peer: y.id() });

        let z = int(0);
        z.weak_bind(&x).unwrap();
        assert!(z.bind_to(&x).is_err());
        assert!(x.weak_bind(&z).is_err());
    }

    #[test]
    fn self_binding_is_rejected() {
        let x = int(0);
        assert_eq!(
            x.bind_to(&x.clone()).unwrap_err(),
            BindError::SelfBinding { node: x.id() }
        );
    }

    #[test]
    fn dropped_peer_is_pruned_during_walk() {
        let x = int(0);
        let keep = int(0);
        keep.bind_to(&x).unwrap();
        {
            let gone = int(0);
            gone.bind_to(&x).unwrap();
            assert_eq!(x.peer_count(), 2);
        }
        assert_eq!(x.peer_ids().len(), 2, "dead edge is still recorded");

        let applied = Cell::new(0);
        set_counting(&x, 3, &applied).unwrap();
        assert_eq!(applied.get(), 2);
        assert_eq!(x.peer_ids(), vec![keep.id()], "dead edge pruned by the walk");
        assert_eq!(get(&keep), 3);
    }

    #[test]
    fn disabled_node_rejects_mutation_and_nothing_changes() {
        let x = int(1);
        let y = int(0);
        y.bind_to(&x).unwrap();
        x.set_disabled(true);
        assert!(y.is_disabled(), "disabled flag propagates");

        let applied = Cell::new(0);
        let err = set_counting(&y, 5, &applied).unwrap_err();
        assert_eq!(err, BindError::MutationWhileDisabled { node: y.id() });
        assert_eq!(applied.get(), 0);
        assert_eq!((get(&x), get(&y)), (1, 1));
    }

    #[test]
    fn disabled_notifications_fire_only_on_change() {
        let x = int(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        x.on_disabled_change(move |e| s.borrow_mut().push((e.old, e.new)));

        x.set_disabled(false);
        assert!(seen.borrow().is_empty());
        x.set_disabled(true);
        assert_eq!(*seen.borrow(), vec![(false, true)]);
    }

    #[test]
    fn bind_forces_disabled_notification() {
        let x = int(0);
        let y = int(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        y.on_disabled_change(move |e| s.borrow_mut().push((e.old, e.new)));

        y.bind_to(&x).unwrap();
        assert_eq!(*seen.borrow(), vec![(false, false)]);
    }

    #[test]
    fn unbind_clears_edges_both_ways_and_subscribers() {
        let x = int(0);
        let y = int(0);
        let z = int(0);
        y.bind_to(&x).unwrap();
        y.weak_bind(&z).unwrap();
        y.on_change(|_| {});
        assert_eq!(y.peer_count(), 2);

        y.unbind();
        assert_eq!(y.peer_count(), 0);
        assert_eq!(y.subscriber_count(), 0);
        assert!(!x.is_bound_to(&y));
        assert!(!z.is_bound_to(&y));
    }

    #[test]
    fn unbind_from_requires_strong_edge() {
        let x = int(0);
        let y = int(0);
        y.weak_bind(&x).unwrap();
        assert_eq!(
            y.unbind_from(&x).unwrap_err(),
            BindError::NotBound { node: y.id(), peer: x.id() }
        );
        y.unbind_weak_from(&x).unwrap();
        assert!(!x.is_bound_to(&y));
        assert!(y.unbind_weak_from(&x).is_err());
    }

    #[test]
    fn copy_is_unbound_snapshot() {
        let x = Node::with_options(Scalar(4), NodeOptions::new().label("x").disabled(true));
        let copy = x.copy();
        assert_eq!(get(&copy), 4);
        assert!(copy.is_disabled());
        assert_eq!(copy.label().as_deref(), Some("x"));
        assert_eq!(copy.peer_count(), 0);
        assert_ne!(copy.id(), x.id());
    }

    #[test]
    fn bound_and_weak_copies() {
        let x = int(2);
        let bound = x.bound_copy();
        let weak = x.weak_copy();
        assert_eq!(bound.edge_to(&x), Some(EdgeKind::Strong));
        assert_eq!(weak.edge_to(&x), Some(EdgeKind::Source));
        assert_eq!(x.edge_to(&weak), Some(EdgeKind::Dependent));

        let applied = Cell::new(0);
        set_counting(&weak, 8, &applied).unwrap();
        assert_eq!(get(&x), 2, "weak copy does not write back");
        set_counting(&bound, 6, &applied).unwrap();
        assert_eq!((get(&x), get(&weak)), (6, 6));
    }

    #[test]
    fn copy_to_overwrites_without_edge() {
        let x = int(11);
        x.set_disabled(true);
        let target = int(0);
        x.copy_to(&target).unwrap();
        assert_eq!(get(&target), 11);
        assert!(target.is_disabled());
        assert!(!x.is_bound_to(&target));
    }

    #[test]
    fn subscriber_may_mutate_reentrantly() {
        let x = int(0);
        let mirror = int(0);
        let m = mirror.clone();
        x.on_change(move |e: &ValueChanged<i32>| {
            let value = e.new * 10;
            let applied = Cell::new(0);
            set_counting(&m, value, &applied).unwrap();
        });

        let applied = Cell::new(0);
        set_counting(&x, 4, &applied).unwrap();
        assert_eq!(get(&mirror), 40);
    }

    #[test]
    fn lease_revert_restores_snapshot() {
        let x = int(1);
        let y = int(0);
        y.bind_to(&x).unwrap();

        let token = x.begin_lease(true).unwrap();
        assert_eq!(x.lease_state(), LeaseState::Leased);
        let applied = Cell::new(0);
        set_counting(&x, 50, &applied).unwrap();
        assert_eq!(get(&y), 50);

        x.end_lease(token).unwrap();
        assert_eq!(x.lease_state(), LeaseState::None);
        assert_eq!((get(&x), get(&y)), (1, 1));
    }

    #[test]
    fn lease_transitions_are_announced() {
        let x = int(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        x.on_lease_change(move |e| s.borrow_mut().push((e.old, e.new)));

        let token = x.begin_lease(false).unwrap();
        assert_eq!(x.begin_lease(false).unwrap_err(), BindError::AlreadyLeased { node: x.id() });
        x.end_lease(token).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                (LeaseState::None, LeaseState::Leased),
                (LeaseState::Leased, LeaseState::Returned),
                (LeaseState::Returned, LeaseState::None),
            ]
        );
        assert!(matches!(
            x.end_lease(token),
            Err(BindError::InvalidLeaseToken { .. })
        ));
    }

    #[test]
    fn lease_taken_on_return_stays_active() {
        let x = int(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        x.on_lease_change(move |e| s.borrow_mut().push((e.old, e.new)));

        let retaken = Rc::new(Cell::new(None));
        let (handle, slot) = (x.clone(), Rc::clone(&retaken));
        x.on_lease_change(move |e| {
            if e.new == LeaseState::Returned && slot.get().is_none() {
                slot.set(Some(handle.begin_lease(false).unwrap()));
            }
        });

        let first = x.begin_lease(false).unwrap();
        x.end_lease(first).unwrap();
        let second = retaken.get().unwrap();
        assert_eq!(x.lease_state(), LeaseState::Leased);
        assert_eq!(x.begin_lease(false).unwrap_err(), BindError::AlreadyLeased { node: x.id() });

        x.end_lease(second).unwrap();
        assert_eq!(x.lease_state(), LeaseState::None);
        assert_eq!(
            *seen.borrow(),
            vec![
                (LeaseState::None, LeaseState::Leased),
                (LeaseState::Leased, LeaseState::Returned),
                (LeaseState::Returned, LeaseState::Leased),
                (LeaseState::Leased, LeaseState::Returned),
                (LeaseState::Returned, LeaseState::None),
            ]
        );
    }

    #[test]
    fn disabled_peer_is_skipped_by_mutation() {
        let x = int(1);
        let dependent = x.weak_copy();
        dependent.set_disabled(true);

        let applied = Cell::new(0);
        set_counting(&x, 2, &applied).unwrap();
        assert_eq!(applied.get(), 1);
        assert_eq!(get(&dependent), 1);
    }

    #[test]
    fn lease_revert_reaches_disabled_peers() {
        let x = int(1);
        let y = int(0);
        y.bind_to(&x).unwrap();

        let token = x.begin_lease(true).unwrap();
        let applied = Cell::new(0);
        set_counting(&y, 5, &applied).unwrap();
        x.set_disabled(true);
        assert!(y.is_disabled());

        x.end_lease(token).unwrap();
        assert_eq!((get(&x), get(&y)), (1, 1));
    }

    #[test]
    fn weak_node_tracks_liveness() {
        let x = int(0);
        let weak = x.downgrade();
        assert!(weak.upgrade().is_some_and(|n| n.ptr_eq(&x)));
        drop(x);
        assert!(!weak.is_live());
        assert!(weak.upgrade().is_none());
    }
}
