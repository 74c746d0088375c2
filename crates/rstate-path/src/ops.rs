//! Reading and writing the location a path addresses.
//!
//! Arrays are addressed by index and objects by key; any other pairing is a
//! miss. None of these operations panic or partially apply: a miss leaves
//! the value untouched.

use std::alloc::Layout;

use rstate_value::Value;

use crate::path::{PathSegment, PropertyPath};

fn step<'v>(value: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match value {
        Value::Array(arr) => arr.get(segment.as_index()?),
        Value::Object(map) => map.get(segment.as_key()?),
        _ => None,
    }
}

fn step_mut<'v>(value: &'v mut Value, segment: &PathSegment) -> Option<&'v mut Value> {
    match value {
        Value::Array(arr) => arr.get_mut(segment.as_index()?),
        Value::Object(map) => map.get_mut(segment.as_key()?),
        _ => None,
    }
}

fn get_in<'v>(segments: &[PathSegment], value: &'v Value) -> Option<&'v Value> {
    segments.iter().try_fold(value, step)
}

fn get_in_mut<'v>(segments: &[PathSegment], value: &'v mut Value) -> Option<&'v mut Value> {
    segments.iter().try_fold(value, step_mut)
}

/// Whether an array can grow to hold `index`.
fn index_fits(index: usize) -> bool {
    index
        .checked_add(1)
        .is_some_and(|len| Layout::array::<Value>(len).is_ok())
}

/// Whether `add` can descend through `value` with `segment`: it must be
/// null (and so replaceable) or a container of the matching kind, and an
/// index must be one an array can grow to.
fn can_extend(value: Option<&Value>, segment: &PathSegment) -> bool {
    match value {
        None | Some(Value::Null) => segment.as_index().map_or(true, index_fits),
        Some(Value::Array(arr)) => segment
            .as_index()
            .is_some_and(|index| index < arr.len() || index_fits(index)),
        Some(Value::Object(_)) => segment.as_key().is_some(),
        Some(_) => false,
    }
}

/// Descend one level for `add`, creating or growing the container.
fn extend<'v>(value: &'v mut Value, segment: &PathSegment) -> Option<&'v mut Value> {
    match segment.as_index() {
        Some(index) => {
            if value.is_null() {
                *value = Value::Array(Vec::new());
            }
            let len = index.checked_add(1)?;
            let arr = value.as_array_mut()?;
            if arr.len() < len {
                arr.resize(len, Value::Null);
            }
            arr.get_mut(index)
        }
        None => {
            let key = segment.as_key()?;
            if value.is_null() {
                *value = Value::Object(Default::default());
            }
            let map = value.as_object_mut()?;
            if !map.contains_key(key) {
                map.insert(key, Value::Null);
            }
            map.get_mut(key)
        }
    }
}

impl PropertyPath {
    /// The value at this path, or `None` if any step misses.
    ///
    /// The empty path addresses the value itself.
    pub fn get<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        get_in(self.segments(), value)
    }

    pub fn get_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        get_in_mut(self.segments(), value)
    }

    /// Overwrite the value at this path.
    ///
    /// Every step but the last must exist. The last step may name an array
    /// index in range or any object key.
    ///
    /// This is not a strict "replace existing" operation: when the parent is
    /// an object and the final key is missing, the key is inserted. Arrays
    /// are never extended. Use [`get`](Self::get) first, or
    /// [`add`](Self::add) for full structure creation, if the difference
    /// matters.
    pub fn set(&self, dest: &mut Value, value: Value) -> bool {
        let Some((last, parent)) = self.segments().split_last() else {
            return false;
        };
        match get_in_mut(parent, dest) {
            Some(Value::Array(arr)) => match last.as_index().and_then(|i| arr.get_mut(i)) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            Some(Value::Object(map)) => match last.as_key() {
                Some(key) => {
                    map.insert(key, value);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Set the value at this path, creating missing structure on the way.
    ///
    /// Nulls and missing entries become empty arrays or objects as the next
    /// segment requires. Arrays grow with null slots to fit the index. An
    /// existing value of the wrong shape is a miss, and `dest` is left as it
    /// was.
    pub fn add(&self, dest: &mut Value, value: Value) -> bool {
        if self.is_empty() {
            return false;
        }

        // Check the whole walk first so a miss never leaves half-built structure.
        let mut cursor = Some(&*dest);
        for segment in self.segments() {
            if !can_extend(cursor, segment) {
                return false;
            }
            cursor = cursor.and_then(|v| step(v, segment));
        }

        let mut slot = dest;
        for segment in self.segments() {
            match extend(slot, segment) {
                Some(next) => slot = next,
                None => return false,
            }
        }
        *slot = value;
        true
    }

    /// Like [`add`](Self::add), but starting from `Null` and returning the
    /// built value.
    pub fn build(&self, value: Value) -> Option<Value> {
        let mut dest = Value::Null;
        self.add(&mut dest, value).then_some(dest)
    }

    /// Remove the value at this path.
    ///
    /// Object keys are removed. Array slots are reset to `Null` so the array
    /// keeps its length. Returns `false` if nothing was at the path.
    pub fn delete(&self, dest: &mut Value) -> bool {
        let Some((last, parent)) = self.segments().split_last() else {
            return false;
        };
        match get_in_mut(parent, dest) {
            Some(Value::Array(arr)) => match last.as_index().and_then(|i| arr.get_mut(i)) {
                Some(slot) => {
                    *slot = Value::Null;
                    true
                }
                None => false,
            },
            Some(Value::Object(map)) => last
                .as_key()
                .is_some_and(|key| map.remove(key).is_some()),
            _ => false,
        }
    }
}
