//! Ordered map type for MessagePack maps.
//!
//! This module provides [`Map`], a wrapper around [`IndexMap`] keyed by [`MapKey`].
//! Entries iterate in insertion order, which is also the order the encoder writes them
//! in unless `sort_keys` is enabled.
//!
//! ## Examples
//!
//! ```rust
//! use msgpack_codec::{Map, MapKey, Value};
//!
//! let mut map = Map::new();
//! map.insert(MapKey::from("name"), Value::from("Alice"));
//! map.insert(MapKey::Int(1), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! assert_eq!(map.get_key(&MapKey::Float(1.0)), Some(&Value::Int(30)));
//! ```

use crate::value::KeyIdentity;
use crate::{MapKey, Value};
use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of [`MapKey`] to [`Value`].
///
/// Inserting a key that is already present replaces the value in place and keeps the
/// original position.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{Map, MapKey, Value};
///
/// let mut map = Map::new();
/// map.insert(MapKey::from("first"), Value::from(1));
/// map.insert(MapKey::from("second"), Value::from(2));
///
/// let keys: Vec<_> = map.keys().filter_map(MapKey::as_str).collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map(IndexMap<MapKey, Value>);

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, returning the previous value for an equal key.
    pub fn insert(&mut self, key: MapKey, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns the value stored under a string key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(&KeyIdentity::Str(key))
    }

    /// Returns the value stored under any key, using numeric key identity.
    #[must_use]
    pub fn get_key(&self, key: &MapKey) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, shifting later entries to keep insertion order.
    pub fn remove(&mut self, key: &MapKey) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, MapKey, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, MapKey, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, MapKey, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for Map {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().map(|(k, v)| (MapKey::Str(k), v)).collect()
    }
}

impl From<IndexMap<MapKey, Value>> for Map {
    fn from(map: IndexMap<MapKey, Value>) -> Self {
        Map(map)
    }
}

impl From<Map> for IndexMap<MapKey, Value> {
    fn from(map: Map) -> Self {
        map.0
    }
}

impl IntoIterator for Map {
    type Item = (MapKey, Value);
    type IntoIter = indexmap::map::IntoIter<MapKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a MapKey, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, MapKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(MapKey, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (MapKey, Value)>>(iter: T) -> Self {
        Map(IndexMap::from_iter(iter))
    }
}

impl Extend<(MapKey, Value)> for Map {
    fn extend<T: IntoIterator<Item = (MapKey, Value)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = Map::new();
        map.insert(MapKey::from("a"), Value::from(1));
        map.insert(MapKey::from("b"), Value::from(2));
        assert_eq!(map.insert(MapKey::from("a"), Value::from(3)), Some(Value::from(1)));

        let entries: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            entries,
            vec![
                (MapKey::from("a"), Value::from(3)),
                (MapKey::from("b"), Value::from(2)),
            ]
        );
    }

    #[test]
    fn test_numeric_keys_collapse() {
        let mut map = Map::new();
        map.insert(MapKey::Int(1), Value::from("int"));
        map.insert(MapKey::Float(1.0), Value::from("float"));
        map.insert(MapKey::Float(-0.0), Value::from("zero"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_key(&MapKey::Int(1)), Some(&Value::from("float")));
        assert_eq!(map.get_key(&MapKey::Int(0)), Some(&Value::from("zero")));
    }

    #[test]
    fn test_get_by_str_does_not_match_numbers() {
        let mut map = Map::new();
        map.insert(MapKey::Int(1), Value::Nil);
        assert!(map.get("1").is_none());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut map: Map = (0..4).map(|i| (MapKey::Int(i), Value::from(i))).collect();
        map.remove(&MapKey::Int(1));
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![MapKey::Int(0), MapKey::Int(2), MapKey::Int(3)]);
    }
}
