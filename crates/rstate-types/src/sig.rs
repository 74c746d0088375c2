//! Wire signatures for recovering typed values from weakly-typed maps.
//!
//! When a value is flattened into a plain JSON-like map, its type identity is
//! kept under [`SIG_KEY`]. The constants are fixed on the wire and must never
//! change.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::error::TypeError;

/// Reserved map key that carries a [`Signature`].
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// The typed values that can hide inside a weakly-typed map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signature {
    Asset,
    Archive,
    Secret,
    ResourceReference,
}

impl Signature {
    /// The fixed wire constant for this signature.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "c44067f5952c0a294b673a41bacd8c17",
            Self::Archive => "0def7320c3a5731c473e5ecbe6d01bc7",
            Self::Secret => "1b47061264138c4ac30d75fd1eb44270",
            Self::ResourceReference => "5cf8f73096256a8f31e491e813e4eb8e",
        }
    }

    /// Parse a wire constant.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        [
            Self::Asset,
            Self::Archive,
            Self::Secret,
            Self::ResourceReference,
        ]
        .into_iter()
        .find(|sig| sig.as_str() == s)
        .ok_or_else(|| TypeError::UnknownSignature(s.to_string()))
    }

    /// Inspect a weak map for a signature.
    ///
    /// Returns `None` for a plain map (no signature key, or a non-string
    /// value under it) and an error for an unrecognized signature string.
    pub fn of(map: &Map<String, JsonValue>) -> Option<Result<Self, TypeError>> {
        match map.get(SIG_KEY) {
            Some(JsonValue::String(s)) => Some(Self::parse(s)),
            _ => None,
        }
    }

    /// Returns `true` if the map is tagged with exactly this signature.
    pub fn tags(self, map: &Map<String, JsonValue>) -> bool {
        matches!(map.get(SIG_KEY), Some(JsonValue::String(s)) if s == self.as_str())
    }

    /// A fresh weak map holding only this signature.
    pub fn new_map(self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        map.insert(SIG_KEY.to_string(), JsonValue::String(self.as_str().to_string()));
        map
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Asset => "asset",
            Self::Archive => "archive",
            Self::Secret => "secret",
            Self::ResourceReference => "resource reference",
        };
        write!(f, "{name}")
    }
}

/// Placeholder strings standing in for unknown values of a known type.
///
/// A computed value flattens to the sentinel of its element's type so the
/// type survives a trip through a weak map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnknownSentinel {
    Bool,
    Number,
    String,
    Array,
    Asset,
    Archive,
    Object,
}

impl UnknownSentinel {
    const ALL: [Self; 7] = [
        Self::Bool,
        Self::Number,
        Self::String,
        Self::Array,
        Self::Asset,
        Self::Archive,
        Self::Object,
    ];

    /// The fixed wire constant for this sentinel.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "1c4a061d-8072-4f0a-a4cb-0ff528b18fe7",
            Self::Number => "3eeb2bf0-c639-47a8-9e75-3b44932eb421",
            Self::String => "04da6b54-80e4-46f7-96ec-b56ff0331ba9",
            Self::Array => "6a19a0b0-7e62-4c92-b797-7f8e31da9cc2",
            Self::Asset => "030794c1-ac77-496b-92df-f27374a8bd58",
            Self::Archive => "e48ece36-62e2-4504-bad9-02848725956a",
            Self::Object => "dd056dcd-154b-4c76-9bd3-c8f88648b5ff",
        }
    }

    /// Recognize a sentinel string. Ordinary strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == s)
    }
}
