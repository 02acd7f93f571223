//! A heterogeneous map keyed by first-class typed keys.
//!
//! Unlike a `TypeId`-keyed context, keys here are *values*: every call to
//! [`MetaKey::new`] allocates a fresh, process-unique identity, so two
//! independently created keys of the same value type never collide. This
//! is what lets an owned span handle carry several bindings of related
//! types without the collector maintaining its own index.
//!
//! Maps are immutable by interface: [`MetaMap::with`] and
//! [`MetaMap::without`] return a new map, and stored values are shared
//! behind [`Arc`] so cloning a map never deep-copies its entries.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque value holder; reads go through the key's type witness.
pub type MetaValue = Arc<dyn Any + Send + Sync>;

/// A typed key into a [`MetaMap`].
///
/// The value type `V` travels with the key as a phantom parameter, so a
/// lookup can only ever observe a value of the type the key was created
/// with. Key ids are never reused.
pub struct MetaKey<V> {
    id: u64,
    _value: PhantomData<fn(V) -> V>,
}

impl<V> MetaKey<V> {
    /// Allocate a new key with a process-unique id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        MetaKey {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            _value: PhantomData,
        }
    }

    /// The key's unique integer id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<V> Clone for MetaKey<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for MetaKey<V> {}

impl<V> fmt::Debug for MetaKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MetaKey").field(&self.id).finish()
    }
}

/// The error returned by [`MetaMap::get_required`] for an absent binding.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no metadata entry for key {id}")]
pub struct MissingKeyError {
    id: u64,
}

impl MissingKeyError {
    /// The id of the key that had no binding.
    pub fn key_id(&self) -> u64 {
        self.id
    }
}

/// An immutable map from typed keys to values.
#[derive(Clone, Default)]
pub struct MetaMap {
    entries: BTreeMap<u64, MetaValue>,
}

impl MetaMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        MetaMap::default()
    }

    /// Returns a copy of the map with the binding added, replacing any
    /// existing binding for the same key.
    pub fn with<V: Send + Sync + 'static>(&self, key: MetaKey<V>, value: V) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key.id, Arc::new(value));
        MetaMap { entries }
    }

    /// Returns a copy of the map with the binding removed.
    pub fn without<V>(&self, key: MetaKey<V>) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(&key.id);
        MetaMap { entries }
    }

    /// Looks up the value bound to `key`, if any.
    pub fn get<V: 'static>(&self, key: MetaKey<V>) -> Option<&V> {
        self.entries
            .get(&key.id)
            .and_then(|value| value.downcast_ref())
    }

    /// Looks up the value bound to `key`, failing if it is absent.
    ///
    /// An absent binding here is a programmer error; callers that can
    /// tolerate absence should use [`MetaMap::get`] instead.
    pub fn get_required<V: 'static>(&self, key: MetaKey<V>) -> Result<&V, MissingKeyError> {
        self.get(key).ok_or(MissingKeyError { id: key.id })
    }

    /// Whether the map has a binding for `key`.
    pub fn contains<V>(&self, key: MetaKey<V>) -> bool {
        self.entries.contains_key(&key.id)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key id, value holder)` pairs in key-id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &MetaValue)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// The map's bindings as a list, in key-id order.
    pub fn entries(&self) -> Vec<(u64, MetaValue)> {
        self.entries
            .iter()
            .map(|(id, value)| (*id, Arc::clone(value)))
            .collect()
    }
}

impl FromIterator<(u64, MetaValue)> for MetaMap {
    fn from_iter<I: IntoIterator<Item = (u64, MetaValue)>>(iter: I) -> Self {
        MetaMap {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for MetaMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaMap")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_keys_stay_distinct() {
        let k1: MetaKey<u32> = MetaKey::new();
        let k2: MetaKey<u32> = MetaKey::new();
        assert_ne!(k1.id(), k2.id());

        let map = MetaMap::new().with(k2, 2u32).with(k1, 1u32);
        assert_eq!(map.get(k1), Some(&1));
        assert_eq!(map.get(k2), Some(&2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn with_replaces_existing_binding() {
        let key: MetaKey<&'static str> = MetaKey::new();
        let map = MetaMap::new().with(key, "old").with(key, "new");
        assert_eq!(map.get(key), Some(&"new"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn without_removes_only_the_given_key() {
        let k1: MetaKey<i64> = MetaKey::new();
        let k2: MetaKey<i64> = MetaKey::new();
        let map = MetaMap::new().with(k1, 1).with(k2, 2);

        let trimmed = map.without(k1);
        assert!(!trimmed.contains(k1));
        assert_eq!(trimmed.get(k2), Some(&2));

        // the original map is unchanged
        assert_eq!(map.get(k1), Some(&1));
    }

    #[test]
    fn get_required_reports_the_missing_key() {
        let key: MetaKey<bool> = MetaKey::new();
        let err = MetaMap::new().get_required(key).unwrap_err();
        assert_eq!(err.key_id(), key.id());

        let map = MetaMap::new().with(key, true);
        assert_eq!(map.get_required(key).unwrap(), &true);
    }

    #[test]
    fn round_trips_through_entries() {
        let k1: MetaKey<u8> = MetaKey::new();
        let k2: MetaKey<String> = MetaKey::new();
        let map = MetaMap::new().with(k1, 9u8).with(k2, String::from("s"));

        let rebuilt: MetaMap = map.entries().into_iter().collect();
        assert_eq!(rebuilt.get(k1), Some(&9));
        assert_eq!(rebuilt.get(k2), Some(&String::from("s")));
        assert_eq!(rebuilt.len(), map.len());
    }

    #[test]
    fn heterogeneous_bindings_coexist() {
        let id_key: MetaKey<u64> = MetaKey::new();
        let name_key: MetaKey<String> = MetaKey::new();
        let map = MetaMap::new()
            .with(id_key, 42u64)
            .with(name_key, String::from("req"));

        assert_eq!(map.get(id_key), Some(&42));
        assert_eq!(map.get(name_key).map(String::as_str), Some("req"));
    }
}
