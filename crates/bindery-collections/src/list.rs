#![forbid(unsafe_code)]

//! Bindable sequence.
//!
//! Every mutation is a re-applicable closure over the backing `Vec`, so
//! the same positional operation runs on each bound peer. Events carry the
//! positions of the elements they describe: positions of removed elements
//! refer to the sequence before the change, positions of added elements to
//! the sequence after it.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `IndexOutOfBounds` | Position past the end on the called node | Nothing changes |
//! | Same, on a weak dependent whose contents diverged | Dependent mutated locally | Peer skipped, warning logged |
//! | `MutationWhileDisabled` on a weak dependent | Dependent disabled apart from its source | Peer skipped, warning logged |
//! | `MutationWhileDisabled` | Called node disabled | Nothing changes |
//!
//! # Example
//!
//! ```
//! use bindery_collections::BindableList;
//!
//! let a = BindableList::from(vec![1, 2]);
//! let b = BindableList::new();
//! b.bind_to(&a).unwrap();
//! assert_eq!(b.to_vec(), vec![1, 2]);
//!
//! b.push(3).unwrap();
//! a.remove(0).unwrap();
//! assert_eq!(a.to_vec(), vec![2, 3]);
//! assert_eq!(b.to_vec(), vec![2, 3]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use bindery_core::{
    AsNode, BindError, CollectionEvent, Element, Node, NodeOptions, Outcome, Result, Storage,
    enumerate,
};

/// Storage of a [`BindableList`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListStorage<T>(pub Vec<T>);

impl<T: Clone + PartialEq + 'static> Storage for ListStorage<T> {
    type Event = CollectionEvent<T>;

    fn replay(&self) -> CollectionEvent<T> {
        CollectionEvent::all_added(&self.0)
    }

    fn diff(old: &Self, new: &Self) -> Option<CollectionEvent<T>> {
        if old.0 == new.0 {
            None
        } else if old.0.is_empty() {
            Some(CollectionEvent::added(enumerate(&new.0)))
        } else if new.0.is_empty() {
            Some(CollectionEvent::removed(enumerate(&old.0)))
        } else {
            Some(CollectionEvent::replaced(enumerate(&old.0), enumerate(&new.0)))
        }
    }
}

type ListOutcome<R, T> = Result<Outcome<R, CollectionEvent<T>>>;

fn check_position(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(BindError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn check_element(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(BindError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn splice_in<T: Clone>(items: &mut Vec<T>, index: usize, values: &[T]) -> ListOutcome<(), T> {
    check_position(index, items.len())?;
    if values.is_empty() {
        return Ok(Outcome::Unchanged(()));
    }
    items.splice(index..index, values.iter().cloned());
    let added = values
        .iter()
        .enumerate()
        .map(|(offset, value)| Element::new(value.clone(), index + offset))
        .collect();
    Ok(Outcome::Changed((), CollectionEvent::added(added)))
}

fn take_at<T: Clone>(items: &mut Vec<T>, index: usize) -> ListOutcome<T, T> {
    check_element(index, items.len())?;
    let value = items.remove(index);
    let event = CollectionEvent::removed(vec![Element::new(value.clone(), index)]);
    Ok(Outcome::Changed(value, event))
}

/// Drop every element for which `discard` holds.
fn remove_where<T>(items: &mut Vec<T>, discard: impl Fn(&T) -> bool) -> ListOutcome<usize, T> {
    let mut kept = Vec::with_capacity(items.len());
    let mut removed = Vec::new();
    for (index, value) in items.drain(..).enumerate() {
        if discard(&value) {
            removed.push(Element::new(value, index));
        } else {
            kept.push(value);
        }
    }
    *items = kept;
    if removed.is_empty() {
        return Ok(Outcome::Unchanged(0));
    }
    Ok(Outcome::Changed(removed.len(), CollectionEvent::removed(removed)))
}

/// Replace the whole sequence with `next`, reported as a replacement of
/// every element.
fn rewrite<T: Clone + PartialEq>(items: &mut Vec<T>, next: Vec<T>) -> ListOutcome<(), T> {
    if *items == next {
        return Ok(Outcome::Unchanged(()));
    }
    let old = std::mem::replace(items, next);
    Ok(Outcome::Changed(
        (),
        CollectionEvent::replaced(enumerate(&old), enumerate(items)),
    ))
}

/// An ordered sequence that participates in the binding graph.
pub struct BindableList<T: Clone + PartialEq + 'static> {
    node: Node<ListStorage<T>>,
}

impl<T: Clone + PartialEq + 'static> BindableList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::with_options(items, NodeOptions::default())
    }

    #[must_use]
    pub fn with_options(items: Vec<T>, options: NodeOptions) -> Self {
        Self::from_node(Node::with_options(ListStorage(items), options))
    }

    #[must_use]
    pub fn from_node(node: Node<ListStorage<T>>) -> Self {
        Self { node }
    }

    #[must_use]
    pub fn node(&self) -> &Node<ListStorage<T>> {
        &self.node
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append one element.
    pub fn push(&self, value: T) -> Result<()> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            let index = s.0.len();
            splice_in(&mut s.0, index, std::slice::from_ref(&value))
        })
    }

    /// Insert one element at `index` (`index == len` appends).
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            splice_in(&mut s.0, index, std::slice::from_ref(&value))
        })
    }

    pub fn push_front(&self, value: T) -> Result<()> {
        self.insert(0, value)
    }

    /// Append every element of `items`.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) -> Result<()> {
        let items: Vec<T> = items.into_iter().collect();
        self.node.mutate(|s: &mut ListStorage<T>| {
            let index = s.0.len();
            splice_in(&mut s.0, index, &items)
        })
    }

    /// Insert every element of `items` starting at `index`.
    pub fn insert_all(&self, index: usize, items: impl IntoIterator<Item = T>) -> Result<()> {
        let items: Vec<T> = items.into_iter().collect();
        self.node
            .mutate(|s: &mut ListStorage<T>| splice_in(&mut s.0, index, &items))
    }

    /// Replace the element at `index`. Returns the element it replaced.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            check_element(index, s.0.len())?;
            if s.0[index] == value {
                return Ok(Outcome::Unchanged(value.clone()));
            }
            let old = std::mem::replace(&mut s.0[index], value.clone());
            let event = CollectionEvent::replaced(
                vec![Element::new(old.clone(), index)],
                vec![Element::new(value.clone(), index)],
            );
            Ok(Outcome::Changed(old, event))
        })
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize) -> Result<T> {
        self.node
            .mutate(|s: &mut ListStorage<T>| take_at(&mut s.0, index))
    }

    /// Remove the first element equal to `value`. Returns whether one was
    /// found.
    pub fn remove_item(&self, value: &T) -> Result<bool> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            match s.0.iter().position(|item| item == value) {
                Some(index) => take_at(&mut s.0, index).map(|outcome| match outcome {
                    Outcome::Changed(_, event) => Outcome::Changed(true, event),
                    Outcome::Unchanged(_) => Outcome::Unchanged(true),
                }),
                None => Ok(Outcome::Unchanged(false)),
            }
        })
    }

    /// Remove every element equal to one of `values`. Returns how many were
    /// removed.
    pub fn remove_all(&self, values: &[T]) -> Result<usize> {
        let values = values.to_vec();
        self.node.mutate(|s: &mut ListStorage<T>| {
            remove_where(&mut s.0, |item| values.contains(item))
        })
    }

    /// Keep only the elements for which `keep` holds. Returns how many were
    /// removed.
    pub fn retain(&self, keep: impl Fn(&T) -> bool) -> Result<usize> {
        self.node
            .mutate(|s: &mut ListStorage<T>| remove_where(&mut s.0, |item| !keep(item)))
    }

    /// Remove every element.
    pub fn clear(&self) -> Result<()> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            if s.0.is_empty() {
                return Ok(Outcome::Unchanged(()));
            }
            let old = std::mem::take(&mut s.0);
            Ok(Outcome::Changed((), CollectionEvent::removed(enumerate(&old))))
        })
    }

    /// Remove and return the first element.
    pub fn pop_front(&self) -> Result<Option<T>> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            if s.0.is_empty() {
                return Ok(Outcome::Unchanged(None));
            }
            take_at(&mut s.0, 0).map(|outcome| match outcome {
                Outcome::Changed(value, event) => Outcome::Changed(Some(value), event),
                Outcome::Unchanged(value) => Outcome::Unchanged(Some(value)),
            })
        })
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Option<T>> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            let Some(index) = s.0.len().checked_sub(1) else {
                return Ok(Outcome::Unchanged(None));
            };
            take_at(&mut s.0, index).map(|outcome| match outcome {
                Outcome::Changed(value, event) => Outcome::Changed(Some(value), event),
                Outcome::Unchanged(value) => Outcome::Unchanged(Some(value)),
            })
        })
    }

    /// Sort with `compare` (stable).
    pub fn sort_by(&self, compare: impl Fn(&T, &T) -> Ordering) -> Result<()> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            let mut next = s.0.clone();
            next.sort_by(&compare);
            rewrite(&mut s.0, next)
        })
    }

    pub fn reverse(&self) -> Result<()> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            let next = s.0.iter().rev().cloned().collect();
            rewrite(&mut s.0, next)
        })
    }

    /// Replace every element with `f(element)`.
    pub fn replace_all(&self, f: impl Fn(&T) -> T) -> Result<()> {
        self.node.mutate(|s: &mut ListStorage<T>| {
            let next = s.0.iter().map(&f).collect();
            rewrite(&mut s.0, next)
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.node.read(|s| s.0.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.read(|s| s.0.is_empty())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.node.read(|s| s.0.get(index).cloned())
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.node.read(|s| s.0.first().cloned())
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.node.read(|s| s.0.last().cloned())
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.node.read(|s| s.0.contains(value))
    }

    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.node.read(|s| s.0.iter().position(|item| item == value))
    }

    #[must_use]
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.node.read(|s| s.0.iter().rposition(|item| item == value))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.node.read(|s| s.0.clone())
    }

    /// Borrow the elements.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.node.read(|s| f(&s.0))
    }

    // -----------------------------------------------------------------------
    // Copies
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn copy(&self) -> Self {
        Self::from_node(self.node.copy())
    }

    #[must_use]
    pub fn bound_copy(&self) -> Self {
        Self::from_node(self.node.bound_copy())
    }

    #[must_use]
    pub fn weak_copy(&self) -> Self {
        Self::from_node(self.node.weak_copy())
    }
}

impl<T: Clone + Ord + 'static> BindableList<T> {
    /// Sort in ascending order (stable).
    pub fn sort(&self) -> Result<()> {
        self.sort_by(T::cmp)
    }
}

impl<T: Clone + PartialEq + 'static> Deref for BindableList<T> {
    type Target = Node<ListStorage<T>>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<T: Clone + PartialEq + 'static> AsNode for BindableList<T> {
    type Storage = ListStorage<T>;

    fn as_node(&self) -> &Node<ListStorage<T>> {
        &self.node
    }
}

impl<T: Clone + PartialEq + 'static> Clone for BindableList<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Default for BindableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> From<Vec<T>> for BindableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + PartialEq + 'static> FromIterator<T> for BindableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for BindableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableList")
            .field("id", &self.node.id())
            .field("items", &self.to_vec())
            .field("disabled", &self.node.is_disabled())
            .finish()
    }
}
