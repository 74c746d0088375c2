//! Property paths.
//!
//! A [`PropertyPath`] addresses a location inside a [`Value`] tree with
//! JavaScript-style accessors: `root.array[0]["key with a ."]`. Paths are
//! parsed once into typed segments and then used to read, write, and patch
//! values.
//!
//! # Architecture
//!
//! - **Parser** is a single-pass scanner with a lenient mode for paths
//!   written by older tools and a strict mode for the bare grammar
//! - **Structural operations** (`get`, `set`, `add`, `delete`) never panic and
//!   never partially apply
//! - **Matching** (`contains`, `reset`) treats `*` as "any single segment"
//!
//! # Key Types
//!
//! - [`PropertyPath`] — a parsed path
//! - [`PathSegment`] — key, index, or wildcard
//! - [`ParseMode`] — lenient or strict parsing
//! - [`PathError`] — parse failures naming the offending fragment
//!
//! [`Value`]: rstate_value::Value

pub mod error;
pub mod ops;
pub mod parser;
pub mod path;
pub mod reset;

pub use error::{PathError, PathResult};
pub use parser::ParseMode;
pub use path::{PathSegment, PropertyPath, WILDCARD};

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstate_value::{PropertyMap, Value};

    use super::*;

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-z_][a-z0-9_]{0,5}".prop_map(PathSegment::Key),
            "[ -~]{0,6}"
                .prop_filter("wildcard key", |s| s != WILDCARD)
                .prop_map(PathSegment::Key),
            (0usize..4).prop_map(PathSegment::Index),
            Just(PathSegment::Wildcard),
        ]
    }

    fn structural_segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-c]".prop_map(PathSegment::Key),
            (0usize..4).prop_map(PathSegment::Index),
        ]
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::from),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-c]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect::<PropertyMap>())),
            ]
        })
    }

    proptest! {
        #[test]
        fn display_parses_back(segments in prop::collection::vec(segment(), 0..6)) {
            let path = PropertyPath::new(segments);
            let rendered = path.to_string();
            prop_assert_eq!(PropertyPath::parse_strict(&rendered)?, path.clone());
            prop_assert_eq!(PropertyPath::parse(&rendered)?, path);
        }

        #[test]
        fn set_of_get_is_identity(
            v in value(),
            segments in prop::collection::vec(structural_segment(), 1..4),
        ) {
            let path = PropertyPath::new(segments);
            if let Some(found) = path.get(&v).cloned() {
                let mut copy = v.clone();
                prop_assert!(path.set(&mut copy, found.clone()));
                prop_assert_eq!(&copy, &v);
                prop_assert_eq!(path.get(&copy), Some(&found));
            }
        }

        #[test]
        fn add_then_get(
            segments in prop::collection::vec(structural_segment(), 1..5),
            x in leaf(),
        ) {
            let path = PropertyPath::new(segments);
            let built = path.build(x.clone());
            prop_assert!(built.is_some());
            prop_assert_eq!(built.as_ref().and_then(|b| path.get(b)), Some(&x));
        }

        #[test]
        fn path_contains_its_extensions(
            base in prop::collection::vec(segment(), 0..4),
            extra in prop::collection::vec(structural_segment(), 0..3),
        ) {
            let short = PropertyPath::new(base.clone());
            let long: PropertyPath = base.into_iter().chain(extra).collect();
            prop_assert!(short.contains(&long));
        }
    }
}
