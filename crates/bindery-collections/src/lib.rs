#![forbid(unsafe_code)]

//! Bindable collections for bindery.
//!
//! - [`BindableList`]: an ordered sequence with positional change events.
//! - [`BindableMap`]: a key→value map whose key-equality policy is chosen
//!   by type ([`HashStore`], [`LinkedStore`], [`IdentityStore`],
//!   [`WeakKeyStore`]).
//!
//! Both dereference to a [`bindery_core::Node`], so binding, disabled state,
//! leases and subscriptions work exactly as for scalar values.

pub mod list;
pub mod map;

pub use list::{BindableList, ListStorage};
pub use map::{
    BindableMap, HashStore, IdentityMap, IdentityStore, LinkedMap, LinkedStore, MapEntry,
    MapEvent, MapStorage, MapStore, WeakKeyMap, WeakKeyStore,
};
