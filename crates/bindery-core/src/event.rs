#![forbid(unsafe_code)]

//! Change events delivered to subscribers.

/// Before/after pair for scalar values, disabled flags and lease states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChanged<T> {
    pub old: T,
    pub new: T,
}

impl<T> ValueChanged<T> {
    #[must_use]
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }
}

impl<T: PartialEq> ValueChanged<T> {
    /// Whether old and new differ.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

/// What a collection event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
    Replace,
}

/// One element of a sequence together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<T> {
    pub value: T,
    pub index: usize,
}

impl<T> Element<T> {
    #[must_use]
    pub fn new(value: T, index: usize) -> Self {
        Self { value, index }
    }
}

/// Sequence change: elements added and removed, each with its position.
///
/// Positions in `removed` refer to the sequence before the change, positions
/// in `added` to the sequence after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEvent<T> {
    pub kind: ChangeKind,
    pub added: Vec<Element<T>>,
    pub removed: Vec<Element<T>>,
}

impl<T> CollectionEvent<T> {
    /// Elements were inserted.
    #[must_use]
    pub fn added(added: Vec<Element<T>>) -> Self {
        Self {
            kind: ChangeKind::Add,
            added,
            removed: Vec::new(),
        }
    }

    /// Elements were removed.
    #[must_use]
    pub fn removed(removed: Vec<Element<T>>) -> Self {
        Self {
            kind: ChangeKind::Remove,
            added: Vec::new(),
            removed,
        }
    }

    /// Elements were replaced in place.
    #[must_use]
    pub fn replaced(removed: Vec<Element<T>>, added: Vec<Element<T>>) -> Self {
        Self {
            kind: ChangeKind::Replace,
            added,
            removed,
        }
    }

    /// Event listing every element of `items` as added at its position.
    #[must_use]
    pub fn all_added(items: &[T]) -> Self
    where
        T: Clone,
    {
        Self::added(enumerate(items))
    }

    /// Whether the event carries no elements at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Pair every item with its position.
#[must_use]
pub fn enumerate<T: Clone>(items: &[T]) -> Vec<Element<T>> {
    items
        .iter()
        .enumerate()
        .map(|(index, value)| Element::new(value.clone(), index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_added_carries_positions() {
        let event = CollectionEvent::all_added(&['a', 'b']);
        assert_eq!(event.kind, ChangeKind::Add);
        assert_eq!(event.added, vec![Element::new('a', 0), Element::new('b', 1)]);
        assert!(event.removed.is_empty());
    }

    #[test]
    fn empty_event() {
        let event: CollectionEvent<u8> = CollectionEvent::removed(Vec::new());
        assert!(event.is_empty());
    }

    #[test]
    fn value_changed_detects_change() {
        assert!(ValueChanged::new(1, 2).is_change());
        assert!(!ValueChanged::new(true, true).is_change());
    }
}
