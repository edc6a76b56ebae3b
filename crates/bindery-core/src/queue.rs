#![forbid(unsafe_code)]

//! Ordered subscriber callbacks for one event kind.
//!
//! # Invariants
//!
//! 1. Actions run in registration order.
//! 2. Firing runs against a snapshot of the action list, so an action may
//!    register, unsubscribe or clear actions (on this or any other queue)
//!    without affecting the fan-out already in progress.
//! 3. `clear()` drops every action; nothing registered before the clear is
//!    invoked afterwards.

use std::fmt;
use std::rc::Rc;

use crate::id::ActionId;

/// A subscriber callback. Shared so a fan-out can run outside any borrow.
pub type Action<E> = Rc<dyn Fn(&E)>;

/// Ordered list of subscriber callbacks for one event kind.
pub struct NotificationQueue<E> {
    actions: Vec<(ActionId, Action<E>)>,
}

impl<E> NotificationQueue<E> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn push(&mut self, action: impl Fn(&E) + 'static) -> ActionId {
        self.push_shared(Rc::new(action))
    }

    /// Append an already shared action.
    pub fn push_shared(&mut self, action: Action<E>) -> ActionId {
        let id = ActionId::next();
        self.actions.push((id, action));
        id
    }

    /// Remove one action. Returns whether it was registered here.
    pub fn remove(&mut self, id: ActionId) -> bool {
        let before = self.actions.len();
        self.actions.retain(|(action_id, _)| *action_id != id);
        self.actions.len() != before
    }

    /// Drop every action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Snapshot of the registered actions in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Action<E>> {
        self.actions
            .iter()
            .map(|(_, action)| Rc::clone(action))
            .collect()
    }

    /// Run every action with `event`.
    ///
    /// Only usable when the queue is not behind a borrow the actions might
    /// need; nodes use [`snapshot`](Self::snapshot) plus [`fire_all`].
    pub fn execute(&self, event: &E) {
        fire_all(&self.snapshot(), event);
    }
}

/// Invoke each action in order.
pub fn fire_all<E>(actions: &[Action<E>], event: &E) {
    for action in actions {
        action(event);
    }
}

impl<E> Default for NotificationQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for NotificationQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("len", &self.actions.len())
            .finish()
    }
}
