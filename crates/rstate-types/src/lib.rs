//! Foundation types for the resource-state layer.
//!
//! This crate holds the small, dependency-free building blocks shared by the
//! value model, the asset subsystem, the path language, and the diff engine.
//!
//! # Key Types
//!
//! - [`Urn`] — Hierarchical resource name referenced by resource references and outputs
//! - [`Signature`] — Discriminant recovering typed values from weakly-typed maps
//! - [`UnknownSentinel`] — Per-type placeholder strings for not-yet-known values
//! - [`ContentHasher`] — Streaming SHA-256 sink producing hex digests

pub mod error;
pub mod hasher;
pub mod sig;
pub mod urn;

pub use error::TypeError;
pub use hasher::{ContentHasher, EMPTY_DIGEST};
pub use sig::{Signature, UnknownSentinel, SIG_KEY};
pub use urn::Urn;
