#![forbid(unsafe_code)]

//! Binding graph engine for bindery.
//!
//! This crate provides the primitives every bindable container is built on:
//!
//! - [`Node`]: a shared container owning a [`Storage`], a disabled flag, a
//!   lease state, a set of weak peer references and three notification
//!   queues.
//! - [`Bindable`]: the scalar variant.
//! - [`Binding`]: handle for one edge created by `bind_to`/`weak_bind`.
//! - [`AnyBindable`]: binding between nodes of runtime-selected kinds.
//!
//! # Architecture
//!
//! Nodes are `Rc<RefCell<..>>` handles. Edges are `Weak` references tagged
//! with an [`EdgeKind`]; a node never keeps a peer alive. Dead edges are
//! removed lazily, the next time a walk crosses them.
//!
//! A mutation is a re-applicable closure. It runs on the node that received
//! the call, then on every node reachable over propagating edges, each at
//! most once per propagation pass, then the node's subscribers are told.
//!
//! # Invariants
//!
//! 1. One external call applies its mutation to each reachable node exactly
//!    once, even in cyclic graphs.
//! 2. For every node, propagation to its peers completes before its own
//!    subscribers run.
//! 3. Subscribers run in registration order, outside any internal borrow.
//! 4. A failed call leaves storage and edges untouched.
//! 5. Setting a value equal to the current one propagates and notifies
//!    nothing.

pub mod bindable;
pub mod binding;
pub mod erased;
pub mod error;
pub mod event;
pub mod id;
pub mod lease;
pub mod node;
pub mod options;
mod pass;
pub mod peers;
mod propagate;
pub mod queue;
pub mod storage;

pub use bindable::{Bindable, Scalar};
pub use binding::{Binding, BindingKind};
pub use erased::{AnyBindable, AsNode};
pub use error::{BindError, Result};
pub use event::{ChangeKind, CollectionEvent, Element, ValueChanged, enumerate};
pub use id::{ActionId, NodeId};
pub use lease::{LeaseState, LeaseToken};
pub use node::{Node, WeakNode};
pub use options::NodeOptions;
pub use peers::{EdgeKind, PeerEntry, PeerSet};
pub use queue::{Action, NotificationQueue};
pub use storage::{Outcome, Storage};
