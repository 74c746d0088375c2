//! Ordered property maps keyed by [`PropertyKey`].

use std::borrow::Borrow;
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

const INTERNAL_KEY_PREFIX: &str = "__";

/// The name of a property.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyKey(String);

impl PropertyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal keys start with `__` and are hidden from users.
    pub fn is_internal(&self) -> bool {
        is_internal_key(&self.0)
    }
}

/// Returns `true` for keys reserved for internal bookkeeping.
pub fn is_internal_key(key: &str) -> bool {
    key.starts_with(INTERNAL_KEY_PREFIX)
}

impl Borrow<str> for PropertyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PropertyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<PropertyKey> for String {
    fn from(key: PropertyKey) -> Self {
        key.0
    }
}

/// A sorted set of property keys.
pub type PropertySet = BTreeSet<PropertyKey>;

/// A map from property keys to values, always iterated in key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap(BTreeMap<PropertyKey, Value>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PropertyKey, Value> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, PropertyKey, Value> {
        self.0.iter_mut()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, PropertyKey, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> btree_map::Values<'_, PropertyKey, Value> {
        self.0.values()
    }

    /// Returns `true` if `key` is present and holds a value (see [`Value::has_value`]).
    pub fn has_value(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(Value::has_value)
    }

    /// All keys in sorted order.
    pub fn stable_keys(&self) -> Vec<&PropertyKey> {
        self.0.keys().collect()
    }

    /// Sorted keys, excluding internal ones.
    pub fn user_keys(&self) -> Vec<&PropertyKey> {
        self.0.keys().filter(|k| !k.is_internal()).collect()
    }

    /// The set of keys.
    pub fn key_set(&self) -> PropertySet {
        self.0.keys().cloned().collect()
    }

    pub fn contains_unknowns(&self) -> bool {
        self.0.values().any(Value::contains_unknowns)
    }

    pub fn contains_secrets(&self) -> bool {
        self.0.values().any(Value::contains_secrets)
    }

    /// Semantic equality. A key whose value has no value matches a missing key.
    pub fn deep_equals(&self, other: &PropertyMap) -> bool {
        let matches = |a: &PropertyMap, b: &PropertyMap| {
            a.0.iter().all(|(k, v)| match b.get(k.as_str()) {
                Some(w) => v.deep_equals(w) || (!v.has_value() && !w.has_value()),
                None => !v.has_value(),
            })
        };
        matches(self, other) && matches(other, self)
    }
}

impl<K: Into<PropertyKey>, V: Into<Value>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<PropertyKey>, V: Into<Value>> Extend<(K, V)> for PropertyMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for PropertyMap {
    type Item = (PropertyKey, Value);
    type IntoIter = btree_map::IntoIter<PropertyKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = (&'a PropertyKey, &'a Value);
    type IntoIter = btree_map::Iter<'a, PropertyKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
