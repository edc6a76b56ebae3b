#![forbid(unsafe_code)]

//! What a node holds, and how mutations of it are described.

/// Payload owned by a binding node (a scalar, a sequence, a map, ...).
///
/// Storage is `Clone` because binding and lease reverts copy whole states
/// between nodes.
pub trait Storage: Clone + 'static {
    /// Event delivered to change subscribers.
    type Event: 'static;

    /// Synthetic event presenting everything currently held as just added.
    fn replay(&self) -> Self::Event;

    /// Event describing the wholesale replacement of `old` by `new`, or
    /// `None` when the two are equal.
    fn diff(old: &Self, new: &Self) -> Option<Self::Event>;
}

/// Result of applying a mutation to one node's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R, E> {
    /// The storage changed: propagate to peers, then notify with the event.
    Changed(R, E),
    /// Nothing changed: no propagation, no notification.
    Unchanged(R),
}

impl<R, E> Outcome<R, E> {
    /// The caller-facing result.
    pub fn into_result(self) -> R {
        match self {
            Self::Changed(result, _) | Self::Unchanged(result) => result,
        }
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(..))
    }
}

/// Replace `current` with `next`, reporting the difference.
pub(crate) fn overwrite<S: Storage>(current: &mut S, next: &S) -> Outcome<(), S::Event> {
    let previous = std::mem::replace(current, next.clone());
    match S::diff(&previous, current) {
        Some(event) => Outcome::Changed((), event),
        None => Outcome::Unchanged(()),
    }
}
