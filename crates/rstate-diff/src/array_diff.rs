//! Array diff: positional comparison of two arrays.

use std::collections::BTreeMap;

use rstate_value::Value;

use crate::value_diff::{diff_values, ValueDiff};

/// Positional changes between two arrays, keyed by index.
///
/// Indices present in both arrays are compared pairwise. Trailing indices
/// only in the new array are adds and trailing indices only in the old
/// array are deletes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayDiff {
    pub adds: BTreeMap<usize, Value>,
    pub deletes: BTreeMap<usize, Value>,
    pub sames: BTreeMap<usize, Value>,
    pub updates: BTreeMap<usize, ValueDiff>,
}

impl ArrayDiff {
    /// One past the highest index mentioned by any part of the diff.
    pub fn len(&self) -> usize {
        [
            self.adds.keys().next_back(),
            self.deletes.keys().next_back(),
            self.sames.keys().next_back(),
            self.updates.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .map(|i| i + 1)
        .max()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if any index was added, deleted, or updated.
    pub fn any_changes(&self) -> bool {
        !(self.adds.is_empty() && self.deletes.is_empty() && self.updates.is_empty())
    }
}

/// Compare two arrays position by position. Returns `None` if nothing changed.
///
/// Ignore predicates stop at arrays: elements are compared in full.
pub(crate) fn diff_arrays(old: &[Value], new: &[Value]) -> Option<ArrayDiff> {
    let mut diff = ArrayDiff::default();

    for (i, (a, b)) in old.iter().zip(new).enumerate() {
        match diff_values(a, b, &[]) {
            Some(update) => {
                diff.updates.insert(i, update);
            }
            None => {
                diff.sames.insert(i, a.clone());
            }
        }
    }
    for (i, v) in old.iter().enumerate().skip(new.len()) {
        diff.deletes.insert(i, v.clone());
    }
    for (i, v) in new.iter().enumerate().skip(old.len()) {
        diff.adds.insert(i, v.clone());
    }

    diff.any_changes().then_some(diff)
}
