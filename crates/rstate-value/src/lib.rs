//! The property value model.
//!
//! A [`Value`] is a closed tagged union over everything a resource property
//! can hold: JSON-like data, assets and archives, not-yet-known values, secrets,
//! and references to other resources. A [`PropertyMap`] is an ordered map of
//! them, so every walk, encoding, and diff visits keys in the same order.
//!
//! # Architecture
//!
//! - **Semantic equality** lives in [`Value::deep_equals`], which looks through
//!   secrets and compares assets and archives by content hash
//! - **Weak form** conversion ([`Value::mappable`], [`Value::from_mappable`])
//!   flattens values into `serde_json` trees, tagging typed values under the
//!   signature key so they can be recovered
//! - **Serde** impls for [`Value`] and [`PropertyMap`] go through the weak form
//!
//! # Key Types
//!
//! - [`Value`] — the tagged union
//! - [`ResourceReference`] — URN, optional ID, and package version
//! - [`PropertyKey`] / [`PropertyMap`] / [`PropertySet`] — ordered containers
//! - [`ValueError`] — weak-form decoding failures

pub mod error;
pub mod map;
pub mod value;
pub mod weak;

pub use error::{ValueError, ValueResult};
pub use map::{is_internal_key, PropertyKey, PropertyMap, PropertySet};
pub use value::{ResourceReference, Value};
pub use weak::{KeyRepl, ValueRepl, WeakValueRepl};
