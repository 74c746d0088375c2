//! Restoring locations in a new property map from an old one.

use rstate_value::{PropertyMap, Value};

use crate::path::{PathSegment, PropertyPath};

impl PropertyPath {
    /// Overwrite the location this path addresses in `new` with the value
    /// at the same location in `old`.
    ///
    /// Both trees are walked in step. Secrets on either side are looked
    /// through, and a value copied out of a secret context into a plain one
    /// is re-wrapped as secret. A wildcard applies the rest of the path to
    /// every key or index of the old value. Keys missing on both sides are
    /// left alone and keys missing only in `old` are removed from `new`, but
    /// array slots are never added or removed.
    ///
    /// Returns `false` when the trees cannot be walked together (one side is
    /// a container and the other is not, an index exists on only one side,
    /// or a key the walk must pass through is gone from `new`). `new` is
    /// unchanged in that case.
    pub fn reset(&self, old: &PropertyMap, new: &mut PropertyMap) -> bool {
        let old = Value::Object(old.clone());
        let mut candidate = Value::Object(new.clone());
        if !reset_value(self.segments(), &old, &mut candidate, false, false) {
            return false;
        }
        if let Value::Object(map) = candidate {
            *new = map;
        }
        true
    }
}

fn unwrap_secrets(value: &Value) -> (&Value, bool) {
    match value {
        Value::Secret { element } => (unwrap_secrets(element).0, true),
        other => (other, false),
    }
}

fn unwrap_secrets_mut(value: &mut Value) -> (&mut Value, bool) {
    match value {
        Value::Secret { element } => (unwrap_secrets_mut(element).0, true),
        other => (other, false),
    }
}

fn reset_value(
    path: &[PathSegment],
    old: &Value,
    new: &mut Value,
    old_secret: bool,
    new_secret: bool,
) -> bool {
    let Some((segment, rest)) = path.split_first() else {
        return false;
    };

    let (old, unwrapped) = unwrap_secrets(old);
    let old_secret = old_secret || unwrapped;
    let (new, unwrapped) = unwrap_secrets_mut(new);
    let new_secret = new_secret || unwrapped;

    let carry = |v: &Value| {
        if old_secret && !new_secret {
            Value::secret(v.clone())
        } else {
            v.clone()
        }
    };

    match segment {
        PathSegment::Index(index) => match (old, new) {
            (Value::Array(old_arr), Value::Array(new_arr)) => {
                match (old_arr.get(*index), new_arr.get_mut(*index)) {
                    (Some(o), Some(n)) if rest.is_empty() => {
                        *n = carry(o);
                        true
                    }
                    (Some(o), Some(n)) => reset_value(rest, o, n, old_secret, new_secret),
                    // Absent on both sides: nothing to restore at the leaf, no way forward otherwise.
                    (None, None) => rest.is_empty(),
                    _ => false,
                }
            }
            (Value::Array(_), _) | (_, Value::Array(_)) => false,
            _ => true,
        },

        PathSegment::Wildcard if rest.is_empty() => match (old, new) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                *new_map = old_map.iter().map(|(k, v)| (k.clone(), carry(v))).collect();
                true
            }
            (Value::Array(old_arr), Value::Array(new_arr)) => {
                if old_arr.len() != new_arr.len() {
                    return false;
                }
                *new_arr = old_arr.iter().map(carry).collect();
                true
            }
            (_, Value::Object(_) | Value::Array(_)) => true,
            _ => false,
        },

        PathSegment::Wildcard => match (old, new) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                old_map.iter().all(|(k, o)| match new_map.get_mut(k.as_str()) {
                    Some(n) => reset_value(rest, o, n, old_secret, new_secret),
                    None => false,
                })
            }
            (Value::Array(old_arr), Value::Array(new_arr)) => {
                old_arr.len() == new_arr.len()
                    && old_arr
                        .iter()
                        .zip(new_arr.iter_mut())
                        .all(|(o, n)| reset_value(rest, o, n, old_secret, new_secret))
            }
            _ => false,
        },

        PathSegment::Key(key) if rest.is_empty() => {
            let previous = old.as_object().and_then(|m| m.get(key));
            match (previous, new) {
                (Some(v), Value::Object(new_map)) => {
                    new_map.insert(key.as_str(), carry(v));
                    true
                }
                (Some(_), _) => false,
                (None, Value::Object(new_map)) => {
                    new_map.remove(key);
                    true
                }
                (None, _) => true,
            }
        }

        PathSegment::Key(key) => match (old, new) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                match (old_map.get(key), new_map.get_mut(key)) {
                    (Some(_), None) => false,
                    (None, None) => true,
                    (o, Some(n)) => {
                        reset_value(rest, o.unwrap_or(&Value::Null), n, old_secret, new_secret)
                    }
                }
            }
            (Value::Object(_), _) | (_, Value::Object(_)) => false,
            _ => true,
        },
    }
}
