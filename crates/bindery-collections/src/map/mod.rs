#![forbid(unsafe_code)]

//! Bindable key→value map.
//!
//! The map's key-equality policy is a type parameter (see [`store`]); the
//! binding behavior is identical for every policy. Mutations report the
//! entries they wrote as `added` and the entries they displaced as
//! `removed`.
//!
//! ```
//! use bindery_collections::BindableMap;
//!
//! let prefs = BindableMap::new();
//! let mirror = prefs.bound_copy();
//! assert_eq!(prefs.put("theme", "dark").unwrap(), None);
//! assert_eq!(mirror.put("theme", "light").unwrap(), Some("dark"));
//! assert_eq!(prefs.get(&"theme"), Some("light"));
//! ```

pub mod store;

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;

use bindery_core::{AsNode, ChangeKind, Node, NodeOptions, Outcome, Result, Storage};

pub use store::{HashStore, IdentityStore, LinkedStore, MapStore, WeakKeyStore};

/// One key/value pair in a [`MapEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> MapEntry<K, V> {
    #[must_use]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for MapEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Map change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEvent<K, V> {
    pub kind: ChangeKind,
    pub added: Vec<MapEntry<K, V>>,
    pub removed: Vec<MapEntry<K, V>>,
}

impl<K, V> MapEvent<K, V> {
    /// Build an event, deriving the kind from which side is populated.
    #[must_use]
    pub fn new(added: Vec<MapEntry<K, V>>, removed: Vec<MapEntry<K, V>>) -> Self {
        let kind = if removed.is_empty() {
            ChangeKind::Add
        } else if added.is_empty() {
            ChangeKind::Remove
        } else {
            ChangeKind::Replace
        };
        Self {
            kind,
            added,
            removed,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Storage of a [`BindableMap`].
#[derive(Debug, Clone, Default)]
pub struct MapStorage<M>(pub M);

impl<M: MapStore> Storage for MapStorage<M> {
    type Event = MapEvent<M::Key, M::Value>;

    fn replay(&self) -> Self::Event {
        let added = self.0.entries().into_iter().map(MapEntry::from).collect();
        MapEvent::new(added, Vec::new())
    }

    fn diff(old: &Self, new: &Self) -> Option<Self::Event> {
        let missing_from = |from: &M, to: &M| -> Vec<MapEntry<M::Key, M::Value>> {
            from.entries()
                .into_iter()
                .filter(|(k, v)| to.get(k) != Some(v))
                .map(MapEntry::from)
                .collect()
        };
        let event = MapEvent::new(missing_from(&new.0, &old.0), missing_from(&old.0, &new.0));
        (!event.is_empty()).then_some(event)
    }
}

type MapOutcome<R, M> =
    Result<Outcome<R, MapEvent<<M as MapStore>::Key, <M as MapStore>::Value>>>;

/// A key→value map that participates in the binding graph.
pub struct BindableMap<K, V, M = HashStore<K, V>>
where
    M: MapStore<Key = K, Value = V>,
{
    node: Node<MapStorage<M>>,
    _entry: PhantomData<fn() -> (K, V)>,
}

/// Map iterated in insertion order.
pub type LinkedMap<K, V> = BindableMap<K, V, LinkedStore<K, V>>;
/// Map keyed by `Rc` identity.
pub type IdentityMap<T, V> = BindableMap<Rc<T>, V, IdentityStore<T, V>>;
/// Map whose entries vanish with their keys.
pub type WeakKeyMap<T, V> = BindableMap<Rc<T>, V, WeakKeyStore<T, V>>;

impl<K, V> BindableMap<K, V, HashStore<K, V>>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Empty map with value-equality keys.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(HashStore::default())
    }
}

impl<K, V> BindableMap<K, V, LinkedStore<K, V>>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Empty map iterated in insertion order.
    #[must_use]
    pub fn linked() -> Self {
        Self::with_store(LinkedStore::default())
    }
}

impl<T: 'static, V: Clone + PartialEq + 'static> BindableMap<Rc<T>, V, IdentityStore<T, V>> {
    /// Empty map keyed by `Rc` identity.
    #[must_use]
    pub fn identity() -> Self {
        Self::with_store(IdentityStore::default())
    }
}

impl<T: 'static, V: Clone + PartialEq + 'static> BindableMap<Rc<T>, V, WeakKeyStore<T, V>> {
    /// Empty map holding its keys weakly.
    #[must_use]
    pub fn weak_keys() -> Self {
        Self::with_store(WeakKeyStore::default())
    }
}

impl<K, V, M> BindableMap<K, V, M>
where
    K: Clone + 'static,
    V: Clone + PartialEq + 'static,
    M: MapStore<Key = K, Value = V>,
{
    #[must_use]
    pub fn with_store(store: M) -> Self {
        Self::with_options(store, NodeOptions::default())
    }

    #[must_use]
    pub fn with_options(store: M, options: NodeOptions) -> Self {
        Self::from_node(Node::with_options(MapStorage(store), options))
    }

    #[must_use]
    pub fn from_node(node: Node<MapStorage<M>>) -> Self {
        Self {
            node,
            _entry: PhantomData,
        }
    }

    #[must_use]
    pub fn node(&self) -> &Node<MapStorage<M>> {
        &self.node
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Store `value` under `key`. Returns the value it displaced.
    ///
    /// Writing the value already stored changes nothing.
    pub fn put(&self, key: K, value: V) -> Result<Option<V>> {
        self.node.mutate(|s: &mut MapStorage<M>| -> MapOutcome<Option<V>, M> {
            let prior = s.0.get(&key).cloned();
            if prior.as_ref() == Some(&value) {
                return Ok(Outcome::Unchanged(prior));
            }
            s.0.insert(key.clone(), value.clone());
            let removed = prior
                .iter()
                .map(|old| MapEntry::new(key.clone(), old.clone()))
                .collect();
            let event = MapEvent::new(vec![MapEntry::new(key.clone(), value.clone())], removed);
            Ok(Outcome::Changed(prior, event))
        })
    }

    /// Remove `key`. Returns its value, if it was present.
    pub fn remove(&self, key: &K) -> Result<Option<V>> {
        self.node.mutate(|s: &mut MapStorage<M>| -> MapOutcome<Option<V>, M> {
            match s.0.remove(key) {
                Some(old) => {
                    let event =
                        MapEvent::new(Vec::new(), vec![MapEntry::new(key.clone(), old.clone())]);
                    Ok(Outcome::Changed(Some(old), event))
                }
                None => Ok(Outcome::Unchanged(None)),
            }
        })
    }

    /// Store every pair of `entries`, in order.
    ///
    /// A key written more than once keeps its last value, and the event
    /// reports only the net change per key.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<()> {
        let mut last = M::default();
        let mut order = Vec::new();
        for (key, value) in entries {
            if last.insert(key.clone(), value).is_none() {
                order.push(key);
            }
        }
        let writes: Vec<(K, V)> = order
            .into_iter()
            .filter_map(|key| last.get(&key).cloned().map(|value| (key, value)))
            .collect();

        self.node.mutate(|s: &mut MapStorage<M>| -> MapOutcome<(), M> {
            let mut added = Vec::new();
            let mut removed = Vec::new();
            for (key, value) in &writes {
                match s.0.insert(key.clone(), value.clone()) {
                    Some(old) if old == *value => continue,
                    Some(old) => removed.push(MapEntry::new(key.clone(), old)),
                    None => {}
                }
                added.push(MapEntry::new(key.clone(), value.clone()));
            }
            if added.is_empty() {
                return Ok(Outcome::Unchanged(()));
            }
            Ok(Outcome::Changed((), MapEvent::new(added, removed)))
        })
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        self.node.mutate(|s: &mut MapStorage<M>| -> MapOutcome<(), M> {
            let removed: Vec<_> = s.0.entries().into_iter().map(MapEntry::from).collect();
            s.0.clear();
            if removed.is_empty() {
                return Ok(Outcome::Unchanged(()));
            }
            Ok(Outcome::Changed((), MapEvent::new(Vec::new(), removed)))
        })
    }

    /// Reclaim slots whose key is gone, on this node only. Returns how many
    /// were reclaimed.
    ///
    /// Dead entries are already invisible, so nothing is propagated or
    /// notified, and a disabled map is purged too.
    pub fn purge(&self) -> usize {
        let purged = self.node.maintain(|s| s.0.purge());
        if purged > 0 {
            tracing::trace!(node = %self.node.id(), purged, "purged dead map keys");
        }
        purged
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.node.read(|s| s.0.get(key).cloned())
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.node.read(|s| s.0.contains_key(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.node.read(|s| s.0.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.read(|s| s.0.is_empty())
    }

    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.node.read(|s| s.0.entries())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }

    /// Borrow the store.
    pub fn with<R>(&self, f: impl FnOnce(&M) -> R) -> R {
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

impl<K, V, M> Deref for BindableMap<K, V, M>
where
    M: MapStore<Key = K, Value = V>,
{
    type Target = Node<MapStorage<M>>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<K, V, M> AsNode for BindableMap<K, V, M>
where
    M: MapStore<Key = K, Value = V>,
{
    type Storage = MapStorage<M>;

    fn as_node(&self) -> &Node<MapStorage<M>> {
        &self.node
    }
}

impl<K, V, M> Clone for BindableMap<K, V, M>
where
    M: MapStore<Key = K, Value = V>,
{
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _entry: PhantomData,
        }
    }
}

impl<K, V, M> Default for BindableMap<K, V, M>
where
    K: Clone + 'static,
    V: Clone + PartialEq + 'static,
    M: MapStore<Key = K, Value = V>,
{
    fn default() -> Self {
        Self::with_store(M::default())
    }
}

impl<K, V, M> fmt::Debug for BindableMap<K, V, M>
where
    K: Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
    M: MapStore<Key = K, Value = V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableMap")
            .field("id", &self.node.id())
            .field("entries", &self.entries())
            .field("disabled", &self.node.is_disabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::BindError;
    use std::cell::RefCell;

    type Log<K, V> = Rc<RefCell<Vec<MapEvent<K, V>>>>;

    fn record<K, V, M>(map: &BindableMap<K, V, M>) -> Log<K, V>
    where
        K: Clone + 'static,
        V: Clone + PartialEq + 'static,
        M: MapStore<Key = K, Value = V>,
    {
        let log: Log<K, V> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        map.on_change(move |e: &MapEvent<K, V>| sink.borrow_mut().push(e.clone()));
        log
    }

    fn entry<K, V>(key: K, value: V) -> MapEntry<K, V> {
        MapEntry::new(key, value)
    }

    #[test]
    fn put_reports_add_then_replace() {
        let map = BindableMap::new();
        let log = record(&map);
        assert_eq!(map.put("a", 1).unwrap(), None);
        assert_eq!(map.put("a", 2).unwrap(), Some(1));
        assert_eq!(map.put("a", 2).unwrap(), Some(2));

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, ChangeKind::Add);
        assert_eq!(log[1].kind, ChangeKind::Replace);
        assert_eq!(log[1].removed, vec![entry("a", 1)]);
        assert_eq!(log[1].added, vec![entry("a", 2)]);
    }

    #[test]
    fn remove_and_clear() {
        let map = BindableMap::linked();
        map.put_all([(1, 'x'), (2, 'y'), (3, 'z')]).unwrap();
        let log = record(&map);
        assert_eq!(map.remove(&2).unwrap(), Some('y'));
        assert_eq!(map.remove(&2).unwrap(), None);
        map.clear().unwrap();
        map.clear().unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, ChangeKind::Remove);
        assert_eq!(log[1].removed, vec![entry(1, 'x'), entry(3, 'z')]);
        assert!(map.is_empty());
    }

    #[test]
    fn put_all_reports_written_and_displaced() {
        let map = BindableMap::linked();
        map.put("keep", 1).unwrap();
        map.put("swap", 2).unwrap();
        let log = record(&map);
        map.put_all([("keep", 1), ("swap", 20), ("new", 3)]).unwrap();

        let log = log.borrow();
        assert_eq!(log[0].kind, ChangeKind::Replace);
        assert_eq!(log[0].added, vec![entry("swap", 20), entry("new", 3)]);
        assert_eq!(log[0].removed, vec![entry("swap", 2)]);
        assert_eq!(map.keys(), vec!["keep", "swap", "new"]);
        assert_eq!(map.values(), vec![1, 20, 3]);
    }

    #[test]
    fn put_all_reports_net_change_for_repeated_keys() {
        let map = BindableMap::linked();
        map.put("a", 1).unwrap();
        let log = record(&map);

        map.put_all([("b", 2), ("a", 5), ("b", 3), ("a", 1)]).unwrap();
        map.put_all([("a", 9), ("a", 1)]).unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, ChangeKind::Add);
        assert_eq!(log[0].added, vec![entry("b", 3)]);
        assert!(log[0].removed.is_empty());
        assert_eq!(map.entries(), vec![("a", 1), ("b", 3)]);
    }

    #[test]
    fn bound_maps_stay_equal() {
        let a = BindableMap::new();
        a.put(1, "one").unwrap();
        let b = BindableMap::new();
        b.put(2, "two").unwrap();
        b.bind_to(&a).unwrap();
        assert_eq!(b.entries(), vec![(1, "one")]);

        b.put(3, "three").unwrap();
        assert_eq!(a.get(&3), Some("three"));
        assert!(a.contains_key(&1));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn identity_map_binds_by_allocation() {
        let key = Rc::new(String::from("k"));
        let twin = Rc::new(String::from("k"));
        let a = BindableMap::identity();
        let b = a.bound_copy();
        a.put(Rc::clone(&key), 1).unwrap();
        assert_eq!(b.get(&key), Some(1));
        assert_eq!(b.get(&twin), None);
    }

    #[test]
    fn weak_key_map_forgets_dropped_keys() {
        let map = BindableMap::weak_keys();
        let keep = Rc::new(1);
        map.put(Rc::clone(&keep), "kept").unwrap();
        {
            let temp = Rc::new(2);
            map.put(Rc::clone(&temp), "temp").unwrap();
            assert_eq!(map.len(), 2);
        }
        assert_eq!(map.len(), 1);
        assert_eq!(map.purge(), 1);
        assert_eq!(map.with(WeakKeyStore::slot_count), 1);
    }

    #[test]
    fn disabled_weak_key_map_still_purges() {
        let map = BindableMap::weak_keys();
        let mirror = map.bound_copy();
        map.put(Rc::new(1), "temp").unwrap();
        map.set_disabled(true);

        assert_eq!(map.purge(), 1);
        assert_eq!(map.with(WeakKeyStore::slot_count), 0);
        assert_eq!(mirror.with(WeakKeyStore::slot_count), 1, "purge stays local");
    }

    #[test]
    fn disabled_map_rejects_writes() {
        let map: BindableMap<&str, i32> =
            BindableMap::with_options(HashStore::default(), NodeOptions::new().disabled(true));
        assert!(matches!(
            map.put("a", 1),
            Err(BindError::MutationWhileDisabled { .. })
        ));
        assert!(map.is_empty());
    }

    #[test]
    fn diff_describes_wholesale_change() {
        let mut old = LinkedStore::default();
        old.insert('a', 1);
        old.insert('b', 2);
        let mut new = LinkedStore::default();
        new.insert('a', 1);
        new.insert('c', 3);
        let event = MapStorage::diff(&MapStorage(old.clone()), &MapStorage(new)).unwrap();
        assert_eq!(event.kind, ChangeKind::Replace);
        assert_eq!(event.removed, vec![entry('b', 2)]);
        assert_eq!(event.added, vec![entry('c', 3)]);
        assert!(MapStorage::diff(&MapStorage(old.clone()), &MapStorage(old)).is_none());
    }
}
