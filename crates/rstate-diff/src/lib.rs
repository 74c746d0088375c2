//! Diff engine for property values.
//!
//! Compares two snapshots of resource state and classifies every key and
//! array slot as added, deleted, updated, or the same. The result trees are
//! built fresh on every comparison and never mutate their inputs.
//!
//! # Key Types
//!
//! - [`ObjectDiff`] -- keyed changes between two property maps
//! - [`ArrayDiff`] -- positional changes between two arrays
//! - [`ValueDiff`] / [`DiffDetail`] -- a changed value and how it changed

pub mod array_diff;
pub mod object_diff;
pub mod value_diff;

pub use array_diff::ArrayDiff;
pub use object_diff::{diff_maps, IgnoreKey, ObjectDiff};
pub use value_diff::{diff_values, DiffDetail, ValueDiff};
