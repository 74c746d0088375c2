//! Property paths and their segments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};
use crate::parser::{parse, ParseMode};

/// The literal key that doubles as a wildcard.
pub const WILDCARD: &str = "*";

/// One step of a [`PropertyPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
    /// Matches any single key or index in [`PropertyPath::contains`] and
    /// [`PropertyPath::reset`]. Structural operations treat it as the
    /// literal key `*`.
    Wildcard,
}

impl PathSegment {
    /// The object key this segment addresses, if any.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            Self::Wildcard => Some(WILDCARD),
            Self::Index(_) => None,
        }
    }

    /// The array index this segment addresses, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// An address of a location inside a property value: a sequence of object
/// keys, array indices, and wildcards.
///
/// Paths render as JavaScript-style property accesses:
///
/// ```
/// use rstate_path::{PathSegment, PropertyPath};
///
/// let path: PropertyPath = "root.array[0][\"key with a .\"]".parse().unwrap();
/// assert_eq!(path.segments()[2], PathSegment::Index(0));
/// assert_eq!(path.to_string(), "root.array[0][\"key with a .\"]");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyPath(Vec<PathSegment>);

impl PropertyPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Parse a path, tolerating a `.` before a bracketed accessor.
    pub fn parse(path: &str) -> PathResult<Self> {
        parse(path, ParseMode::Lenient).map(Self)
    }

    /// Parse a path, rejecting anything outside the grammar.
    pub fn parse_strict(path: &str) -> PathResult<Self> {
        parse(path, ParseMode::Strict).map(Self)
    }

    pub fn parse_with(path: &str, mode: ParseMode) -> PathResult<Self> {
        parse(path, mode).map(Self)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// A new path extended by one segment.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Returns `true` if `other` is this path extended by zero or more
    /// segments. A wildcard here matches any single segment of `other`.
    ///
    /// `foo["bar"][1]` contains `foo.bar[1].baz`, and `*` contains every
    /// non-empty path.
    pub fn contains(&self, other: &PropertyPath) -> bool {
        if other.0.len() < self.0.len() {
            return false;
        }
        self.0.iter().zip(&other.0).all(|(mine, theirs)| match mine {
            PathSegment::Wildcard => true,
            _ => mine == theirs,
        })
    }
}

impl From<Vec<PathSegment>> for PropertyPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for PropertyPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PropertyPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PropertyPath> for String {
    fn from(path: PropertyPath) -> Self {
        path.to_string()
    }
}

/// Keys render bare only when they are non-empty, do not start with a digit,
/// and consist of ASCII letters, digits, and underscores.
fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_quoted(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    f.write_str("[\"")?;
    for c in key.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"]")
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_bare_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => write_quoted(f, key)?,
                PathSegment::Wildcard => write_quoted(f, WILDCARD)?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
