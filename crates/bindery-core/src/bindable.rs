#![forbid(unsafe_code)]

//! Scalar binding: a single value of type `T`.
//!
//! # Example
//!
//! ```
//! use bindery_core::Bindable;
//!
//! let x = Bindable::new(0);
//! let y = Bindable::new(0);
//! y.bind_to(&x).unwrap();
//!
//! x.set(400).unwrap();
//! assert_eq!(y.get(), 400);
//!
//! y.unbind();
//! x.set(200).unwrap();
//! assert_eq!(y.get(), 400);
//! ```

use std::fmt;
use std::ops::Deref;

use crate::erased::AsNode;
use crate::error::Result;
use crate::event::ValueChanged;
use crate::node::Node;
use crate::options::NodeOptions;
use crate::storage::{Outcome, Storage};

/// Storage for a single value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scalar<T>(pub T);

impl<T: Clone + PartialEq + 'static> Storage for Scalar<T> {
    type Event = ValueChanged<T>;

    fn replay(&self) -> ValueChanged<T> {
        ValueChanged::new(self.0.clone(), self.0.clone())
    }

    fn diff(old: &Self, new: &Self) -> Option<ValueChanged<T>> {
        (old.0 != new.0).then(|| ValueChanged::new(old.0.clone(), new.0.clone()))
    }
}

/// A bindable value.
///
/// Dereferences to its [`Node`], which carries the binding, disabled,
/// lease and subscription API.
pub struct Bindable<T: Clone + PartialEq + 'static> {
    node: Node<Scalar<T>>,
}

impl<T: Clone + PartialEq + 'static> Bindable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_options(value, NodeOptions::default())
    }

    #[must_use]
    pub fn with_options(value: T, options: NodeOptions) -> Self {
        Self::from_node(Node::with_options(Scalar(value), options))
    }

    /// Wrap an existing node handle.
    #[must_use]
    pub fn from_node(node: Node<Scalar<T>>) -> Self {
        Self { node }
    }

    #[must_use]
    pub fn node(&self) -> &Node<Scalar<T>> {
        &self.node
    }

    #[must_use]
    pub fn into_node(self) -> Node<Scalar<T>> {
        self.node
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.node.read(|s| s.0.clone())
    }

    /// Borrow the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.node.read(|s| f(&s.0))
    }

    /// Set the value everywhere it is bound. Returns the prior value.
    ///
    /// Setting an equal value changes nothing and notifies nobody.
    pub fn set(&self, value: T) -> Result<T> {
        self.node.mutate(|s: &mut Scalar<T>| {
            if s.0 == value {
                return Ok(Outcome::Unchanged(s.0.clone()));
            }
            let old = std::mem::replace(&mut s.0, value.clone());
            Ok(Outcome::Changed(
                old.clone(),
                ValueChanged::new(old, value.clone()),
            ))
        })
    }

    /// Set the value to `f(current)`. Returns the prior value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<T> {
        let next = self.with(f);
        self.set(next)
    }

    /// Unbound snapshot.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self::from_node(self.node.copy())
    }

    /// Fresh value strongly bound to this one.
    #[must_use]
    pub fn bound_copy(&self) -> Self {
        Self::from_node(self.node.bound_copy())
    }

    /// Fresh weak dependent of this value.
    #[must_use]
    pub fn weak_copy(&self) -> Self {
        Self::from_node(self.node.weak_copy())
    }
}

impl Bindable<bool> {
    /// Flip the flag. Returns the new value.
    pub fn toggle(&self) -> Result<bool> {
        self.update(|v| !v).map(|old| !old)
    }

    pub fn on(&self) -> Result<()> {
        self.set(true).map(drop)
    }

    pub fn off(&self) -> Result<()> {
        self.set(false).map(drop)
    }
}

impl<T: Clone + PartialEq + 'static> Deref for Bindable<T> {
    type Target = Node<Scalar<T>>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<T: Clone + PartialEq + 'static> AsNode for Bindable<T> {
    type Storage = Scalar<T>;

    fn as_node(&self) -> &Node<Scalar<T>> {
        &self.node
    }
}

impl<T: Clone + PartialEq + 'static> Clone for Bindable<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Bindable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for Bindable<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Bindable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindable")
            .field("id", &self.node.id())
            .field("value", &self.get())
            .field("disabled", &self.node.is_disabled())
            .finish()
    }
}
