#![forbid(unsafe_code)]

//! Binding between nodes whose concrete kind is only known at runtime.
//!
//! Every node wrapper implements [`AsNode`], and through it the
//! object-safe [`AnyBindable`]. A binding call through `dyn AnyBindable`
//! downcasts the other side to the same storage type and fails with
//! `TypeMismatch` when the kinds differ.
//!
//! ```
//! use bindery_core::{AnyBindable, BindError, Bindable};
//!
//! let a = Bindable::new(1_i32);
//! let b = Bindable::new(2_i32);
//! let s = Bindable::new(String::from("x"));
//!
//! let nodes: Vec<&dyn AnyBindable> = vec![&a, &b, &s];
//! nodes[1].bind_to_any(nodes[0]).unwrap();
//! assert_eq!(b.get(), 1);
//! assert!(matches!(
//!     nodes[2].bind_to_any(nodes[0]),
//!     Err(BindError::TypeMismatch { .. })
//! ));
//! ```

use std::any::{Any, type_name};

use crate::error::{BindError, Result};
use crate::id::NodeId;
use crate::node::Node;
use crate::storage::Storage;

/// Access to the [`Node`] behind a wrapper.
pub trait AsNode {
    type Storage: Storage;

    fn as_node(&self) -> &Node<Self::Storage>;
}

impl<S: Storage> AsNode for Node<S> {
    type Storage = S;

    fn as_node(&self) -> &Node<S> {
        self
    }
}

/// Object-safe binding surface shared by every node kind.
pub trait AnyBindable {
    fn node_id(&self) -> NodeId;

    /// Type name of the storage, used in `TypeMismatch` errors.
    fn kind_name(&self) -> &'static str;

    /// The underlying `Node<S>` as `Any`.
    fn as_any_node(&self) -> &dyn Any;

    /// [`Node::bind_to`] against a node of unknown kind.
    fn bind_to_any(&self, other: &dyn AnyBindable) -> Result<()>;

    /// [`Node::weak_bind`] against a node of unknown kind.
    fn weak_bind_any(&self, source: &dyn AnyBindable) -> Result<()>;

    /// [`Node::copy_to`] into a node of unknown kind.
    fn copy_to_any(&self, target: &dyn AnyBindable) -> Result<()>;

    /// [`Node::unbind_from`] against a node of unknown kind.
    fn unbind_from_any(&self, other: &dyn AnyBindable) -> Result<()>;

    /// [`Node::unbind_weak_from`] against a node of unknown kind.
    fn unbind_weak_from_any(&self, other: &dyn AnyBindable) -> Result<()>;

    /// [`Node::unbind`].
    fn unbind_all(&self);
}

fn downcast<S: Storage>(other: &dyn AnyBindable) -> Result<&Node<S>> {
    other
        .as_any_node()
        .downcast_ref::<Node<S>>()
        .ok_or_else(|| BindError::TypeMismatch {
            expected: type_name::<S>(),
            found: other.kind_name(),
        })
}

impl<T: AsNode> AnyBindable for T {
    fn node_id(&self) -> NodeId {
        self.as_node().id()
    }

    fn kind_name(&self) -> &'static str {
        type_name::<T::Storage>()
    }

    fn as_any_node(&self) -> &dyn Any {
        self.as_node()
    }

    fn bind_to_any(&self, other: &dyn AnyBindable) -> Result<()> {
        let other = downcast::<T::Storage>(other)?;
        self.as_node().bind_to(other).map(drop)
    }

    fn weak_bind_any(&self, source: &dyn AnyBindable) -> Result<()> {
        let source = downcast::<T::Storage>(source)?;
        self.as_node().weak_bind(source).map(drop)
    }

    fn copy_to_any(&self, target: &dyn AnyBindable) -> Result<()> {
        let target = downcast::<T::Storage>(target)?;
        self.as_node().copy_to(target)
    }

    fn unbind_from_any(&self, other: &dyn AnyBindable) -> Result<()> {
        let other = downcast::<T::Storage>(other)?;
        self.as_node().unbind_from(other)
    }

    fn unbind_weak_from_any(&self, other: &dyn AnyBindable) -> Result<()> {
        let other = downcast::<T::Storage>(other)?;
        self.as_node().unbind_weak_from(other)
    }

    fn unbind_all(&self) {
        self.as_node().unbind();
    }
}
