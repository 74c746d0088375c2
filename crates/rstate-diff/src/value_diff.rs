//! Value-level diff: dispatch to array, object, or leaf comparison.

use rstate_value::Value;

use crate::array_diff::diff_arrays;
use crate::object_diff::{diff_maps, IgnoreKey, ObjectDiff};
use crate::ArrayDiff;

/// A value that changed, with both sides and the shape of the change.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueDiff {
    pub old: Value,
    pub new: Value,
    pub detail: DiffDetail,
}

/// How a [`ValueDiff`] changed.
#[derive(Clone, Debug, PartialEq)]
pub enum DiffDetail {
    /// Scalars, mismatched kinds, or anything else compared as a whole.
    Leaf,
    /// Both sides are arrays.
    Array(ArrayDiff),
    /// Both sides are objects.
    Object(ObjectDiff),
}

impl ValueDiff {
    pub fn is_leaf(&self) -> bool {
        matches!(self.detail, DiffDetail::Leaf)
    }

    pub fn array(&self) -> Option<&ArrayDiff> {
        match &self.detail {
            DiffDetail::Array(diff) => Some(diff),
            _ => None,
        }
    }

    pub fn object(&self) -> Option<&ObjectDiff> {
        match &self.detail {
            DiffDetail::Object(diff) => Some(diff),
            _ => None,
        }
    }
}

/// Compare two values. Returns `None` when they are the same.
///
/// Arrays are compared position by position and objects key by key, passing
/// `ignore` down through nested objects. Everything else, including a change
/// of kind, falls back to [`Value::deep_equals`].
pub fn diff_values(old: &Value, new: &Value, ignore: &[IgnoreKey<'_>]) -> Option<ValueDiff> {
    let detail = match (old, new) {
        (Value::Array(a), Value::Array(b)) => DiffDetail::Array(diff_arrays(a, b)?),
        (Value::Object(a), Value::Object(b)) => DiffDetail::Object(diff_maps(a, b, ignore)?),
        _ if old.deep_equals(new) => return None,
        _ => DiffDetail::Leaf,
    };
    Some(ValueDiff {
        old: old.clone(),
        new: new.clone(),
        detail,
    })
}
