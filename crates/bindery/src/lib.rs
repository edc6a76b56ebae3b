#![forbid(unsafe_code)]

//! Reactive state binding.
//!
//! A bindable container (a value, a list or a map) can be linked to other
//! containers of the same kind. A mutation on any of them is applied to
//! every container it is linked to, exactly once, and then announced to
//! subscribers.
//!
//! - **Strong** links (`bind_to`) propagate both ways.
//! - **Weak** links (`weak_bind`) propagate from the source to the
//!   dependent only, and never keep the source alive.
//!
//! Links are tracked through non-owning references; dropping a container
//! needs no cleanup elsewhere, stale references are pruned the next time a
//! mutation walks over them.
//!
//! # Example
//!
//! ```
//! use bindery::prelude::*;
//!
//! let volume = Bindable::new(3);
//! let slider = volume.bound_copy();
//! let readout = volume.weak_copy();
//!
//! slider.set(7).unwrap();
//! assert_eq!(volume.get(), 7);
//! assert_eq!(readout.get(), 7);
//!
//! readout.set(0).unwrap();
//! assert_eq!(volume.get(), 7);
//! ```
//!
//! # Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `bindery-core` | Nodes, propagation, leases, scalar values |
//! | `bindery-collections` | Lists and maps |

pub use bindery_collections::{
    BindableList, BindableMap, HashStore, IdentityMap, IdentityStore, LinkedMap, LinkedStore,
    ListStorage, MapEntry, MapEvent, MapStorage, MapStore, WeakKeyMap, WeakKeyStore,
};
pub use bindery_core::{
    ActionId, AnyBindable, AsNode, BindError, Bindable, Binding, BindingKind, ChangeKind,
    CollectionEvent, EdgeKind, Element, LeaseState, LeaseToken, Node, NodeId, NodeOptions,
    Outcome, Result, Scalar, Storage, ValueChanged, WeakNode,
};

/// Everything needed to create, bind and observe containers.
pub mod prelude {
    pub use crate::{
        AnyBindable, BindError, Bindable, BindableList, BindableMap, Binding, ChangeKind,
        CollectionEvent, LeaseState, MapEvent, NodeOptions, ValueChanged,
    };
}
