#![forbid(unsafe_code)]

//! Key-equality policies for [`BindableMap`](super::BindableMap).
//!
//! The policy only decides how the local storage finds a key; propagation
//! is the same for all of them.
//!
//! | Store | Keys equal when | Iteration order |
//! |-------|-----------------|-----------------|
//! | [`HashStore`] | `K: Eq + Hash` says so | unspecified |
//! | [`LinkedStore`] | `K: Eq + Hash` says so | insertion |
//! | [`IdentityStore`] | same `Rc` allocation | unspecified |
//! | [`WeakKeyStore`] | same `Rc` allocation; entry vanishes once the key is otherwise unreferenced | unspecified |

use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use indexmap::IndexMap;

/// Local storage behind a bindable map.
pub trait MapStore: Clone + Default + 'static {
    type Key: Clone + 'static;
    type Value: Clone + PartialEq + 'static;

    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Insert, returning the value previously stored under `key`.
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn contains_key(&self, key: &Self::Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Live entries, in the store's iteration order.
    fn entries(&self) -> Vec<(Self::Key, Self::Value)>;

    /// Drop entries that can no longer be reached. Returns how many were
    /// dropped.
    fn purge(&mut self) -> usize {
        0
    }
}

// ---------------------------------------------------------------------------
// HashStore
// ---------------------------------------------------------------------------

/// Value-equality keys in a hash map.
pub struct HashStore<K, V> {
    map: AHashMap<K, V>,
}

impl<K, V> Default for HashStore<K, V> {
    fn default() -> Self {
        Self {
            map: AHashMap::new(),
        }
    }
}

impl<K: Clone, V: Clone> Clone for HashStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K, V> MapStore for HashStore<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for HashStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// LinkedStore
// ---------------------------------------------------------------------------

/// Value-equality keys, iterated in insertion order.
///
/// Replacing the value of an existing key keeps its position; removing a
/// key shifts the later entries up.
pub struct LinkedStore<K, V> {
    map: IndexMap<K, V>,
}

impl<K, V> Default for LinkedStore<K, V> {
    fn default() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }
}

impl<K: Clone, V: Clone> Clone for LinkedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K, V> MapStore for LinkedStore<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.map.shift_remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LinkedStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// IdentityStore
// ---------------------------------------------------------------------------

fn addr<T>(ptr: *const T) -> usize {
    ptr.cast::<()>() as usize
}

/// Keys compared by allocation identity, not by value.
pub struct IdentityStore<T, V> {
    map: AHashMap<usize, (Rc<T>, V)>,
}

impl<T, V> Default for IdentityStore<T, V> {
    fn default() -> Self {
        Self {
            map: AHashMap::new(),
        }
    }
}

impl<T, V: Clone> Clone for IdentityStore<T, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T, V> MapStore for IdentityStore<T, V>
where
    T: 'static,
    V: Clone + PartialEq + 'static,
{
    type Key = Rc<T>;
    type Value = V;

    fn get(&self, key: &Rc<T>) -> Option<&V> {
        self.map.get(&addr(Rc::as_ptr(key))).map(|(_, v)| v)
    }

    fn insert(&mut self, key: Rc<T>, value: V) -> Option<V> {
        let slot = addr(Rc::as_ptr(&key));
        self.map.insert(slot, (key, value)).map(|(_, v)| v)
    }

    fn remove(&mut self, key: &Rc<T>) -> Option<V> {
        self.map.remove(&addr(Rc::as_ptr(key))).map(|(_, v)| v)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn entries(&self) -> Vec<(Rc<T>, V)> {
        self.map
            .values()
            .map(|(k, v)| (Rc::clone(k), v.clone()))
            .collect()
    }
}

impl<T: fmt::Debug, V: fmt::Debug> fmt::Debug for IdentityStore<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.map.values().map(|(k, v)| (k, v)))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WeakKeyStore
// ---------------------------------------------------------------------------

/// Identity keys held weakly.
///
/// An entry stops being visible as soon as every other `Rc` to its key is
/// dropped; the slot itself is reclaimed by [`purge`](MapStore::purge) or
/// when the same slot is written again. A held `Weak` keeps the allocation
/// (not the value) alive, so a slot address is never reused while its entry
/// exists.
pub struct WeakKeyStore<T, V> {
    map: AHashMap<usize, (Weak<T>, V)>,
}

impl<T, V> Default for WeakKeyStore<T, V> {
    fn default() -> Self {
        Self {
            map: AHashMap::new(),
        }
    }
}

impl<T, V: Clone> Clone for WeakKeyStore<T, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T, V> WeakKeyStore<T, V> {
    /// Number of slots, including ones whose key is gone.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.map.len()
    }
}

impl<T, V> MapStore for WeakKeyStore<T, V>
where
    T: 'static,
    V: Clone + PartialEq + 'static,
{
    type Key = Rc<T>;
    type Value = V;

    fn get(&self, key: &Rc<T>) -> Option<&V> {
        self.map
            .get(&addr(Rc::as_ptr(key)))
            .filter(|(k, _)| k.strong_count() > 0)
            .map(|(_, v)| v)
    }

    fn insert(&mut self, key: Rc<T>, value: V) -> Option<V> {
        let slot = addr(Rc::as_ptr(&key));
        self.map
            .insert(slot, (Rc::downgrade(&key), value))
            .filter(|(k, _)| k.strong_count() > 0)
            .map(|(_, v)| v)
    }

    fn remove(&mut self, key: &Rc<T>) -> Option<V> {
        self.map
            .remove(&addr(Rc::as_ptr(key)))
            .filter(|(k, _)| k.strong_count() > 0)
            .map(|(_, v)| v)
    }

    fn len(&self) -> usize {
        self.map
            .values()
            .filter(|(k, _)| k.strong_count() > 0)
            .count()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn entries(&self) -> Vec<(Rc<T>, V)> {
        self.map
            .values()
            .filter_map(|(k, v)| k.upgrade().map(|k| (k, v.clone())))
            .collect()
    }

    fn purge(&mut self) -> usize {
        let before = self.map.len();
        self.map.retain(|_, (k, _)| k.strong_count() > 0);
        before - self.map.len()
    }
}

impl<T, V: fmt::Debug> fmt::Debug for WeakKeyStore<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakKeyStore")
            .field("slots", &self.map.len())
            .finish_non_exhaustive()
    }
}
