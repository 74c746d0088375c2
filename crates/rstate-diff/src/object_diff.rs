//! Object diff: key-by-key comparison of two property maps.

use std::collections::BTreeMap;

use rstate_value::{PropertyKey, PropertyMap, PropertySet, Value};

use crate::value_diff::{diff_values, ValueDiff};

/// Predicate that excludes a key from comparison at every object level.
pub type IgnoreKey<'a> = &'a dyn Fn(&str) -> bool;

/// Changes between two property maps.
///
/// Every key that survives the ignore predicates lands in exactly one of
/// the four buckets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectDiff {
    /// Keys only in the new map, with their new values.
    pub adds: PropertyMap,
    /// Keys only in the old map, with their old values.
    pub deletes: PropertyMap,
    /// Keys whose values did not change.
    pub sames: PropertyMap,
    /// Keys whose values changed.
    pub updates: BTreeMap<PropertyKey, ValueDiff>,
}

impl ObjectDiff {
    /// All keys mentioned by the diff, in sorted order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut keys: PropertySet = self.adds.keys().cloned().collect();
        keys.extend(self.deletes.keys().cloned());
        keys.extend(self.sames.keys().cloned());
        keys.extend(self.updates.keys().cloned());
        keys.into_iter().collect()
    }

    pub fn added(&self, key: &str) -> bool {
        self.adds.contains_key(key)
    }

    pub fn deleted(&self, key: &str) -> bool {
        self.deletes.contains_key(key)
    }

    pub fn updated(&self, key: &str) -> bool {
        self.updates.contains_key(key)
    }

    pub fn same(&self, key: &str) -> bool {
        self.sames.contains_key(key)
    }

    /// Returns `true` if any key was added, deleted, or updated.
    pub fn any_changes(&self) -> bool {
        !(self.adds.is_empty() && self.deletes.is_empty() && self.updates.is_empty())
    }

    /// Keys that were added, deleted, or updated, in sorted order.
    pub fn changed_keys(&self) -> Vec<PropertyKey> {
        let mut keys: PropertySet = self.adds.keys().cloned().collect();
        keys.extend(self.deletes.keys().cloned());
        keys.extend(self.updates.keys().cloned());
        keys.into_iter().collect()
    }
}

fn ignored(key: &str, ignore: &[IgnoreKey<'_>]) -> bool {
    ignore.iter().any(|pred| pred(key))
}

/// Compare two property maps. Returns `None` if nothing was added, deleted,
/// or updated.
///
/// A key whose new value is an output is treated as unchanged: its final
/// value is not known yet. A key mapped to a value that has no value (null
/// or an unknown output) counts as absent, so moving between "null" and
/// "missing" is not a change.
pub fn diff_maps(
    old: &PropertyMap,
    new: &PropertyMap,
    ignore: &[IgnoreKey<'_>],
) -> Option<ObjectDiff> {
    let mut diff = ObjectDiff::default();

    for (key, old_value) in old.iter() {
        if ignored(key.as_str(), ignore) {
            continue;
        }
        match new.get(key.as_str()) {
            Some(new_value @ Value::Output { .. }) => {
                diff.sames.insert(key.clone(), new_value.clone());
            }
            Some(new_value) => match diff_values(old_value, new_value, ignore) {
                None => {
                    diff.sames.insert(key.clone(), new_value.clone());
                }
                Some(_) if !old_value.has_value() => {
                    diff.adds.insert(key.clone(), new_value.clone());
                }
                Some(_) if !new_value.has_value() => {
                    diff.deletes.insert(key.clone(), old_value.clone());
                }
                Some(update) => {
                    diff.updates.insert(key.clone(), update);
                }
            },
            None if old_value.has_value() => {
                diff.deletes.insert(key.clone(), old_value.clone());
            }
            None => {}
        }
    }

    for (key, new_value) in new.iter() {
        if ignored(key.as_str(), ignore) || old.contains_key(key.as_str()) {
            continue;
        }
        if new_value.has_value() {
            diff.adds.insert(key.clone(), new_value.clone());
        }
    }

    diff.any_changes().then_some(diff)
}
