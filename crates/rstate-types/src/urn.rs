use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const URN_PREFIX: &str = "urn:pulumi:";
const URN_NAME_DELIMITER: &str = "::";
const URN_TYPE_DELIMITER: char = '$';

/// Hierarchical name of a resource:
/// `urn:pulumi:<stack>::<project>::<qualified type>::<name>`.
///
/// The qualified type is the `$`-joined chain of parent types ending in the
/// resource's own type. The name is everything after the third delimiter and
/// may itself contain `::`.
///
/// Conversions from `String`/`&str` do not validate, so URNs read off the wire
/// are preserved byte-for-byte. Use [`Urn::parse`] to validate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Build a URN from its components.
    pub fn new(
        stack: &str,
        project: &str,
        parent_type: Option<&str>,
        base_type: &str,
        name: &str,
    ) -> Self {
        let qualified = match parent_type {
            Some(parent) if !parent.is_empty() => format!("{parent}{URN_TYPE_DELIMITER}{base_type}"),
            _ => base_type.to_string(),
        };
        Self(format!(
            "{URN_PREFIX}{stack}{d}{project}{d}{qualified}{d}{name}",
            d = URN_NAME_DELIMITER
        ))
    }

    /// Parse and validate a URN string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let urn = Self(s.to_string());
        if !s.starts_with(URN_PREFIX) {
            return Err(TypeError::InvalidUrn {
                urn: s.to_string(),
                reason: format!("missing '{URN_PREFIX}' prefix"),
            });
        }
        if urn.parts().is_none() {
            return Err(TypeError::InvalidUrn {
                urn: s.to_string(),
                reason: "expected <stack>::<project>::<type>::<name>".into(),
            });
        }
        Ok(urn)
    }

    /// Returns `true` if the URN has the prefix and all four components.
    pub fn is_valid(&self) -> bool {
        self.parts().is_some()
    }

    /// The raw URN string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty URN.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The stack component.
    pub fn stack(&self) -> Option<&str> {
        self.parts().map(|p| p[0])
    }

    /// The project component.
    pub fn project(&self) -> Option<&str> {
        self.parts().map(|p| p[1])
    }

    /// The full `$`-joined type chain.
    pub fn qualified_type(&self) -> Option<&str> {
        self.parts().map(|p| p[2])
    }

    /// The resource's own type (last component of the qualified type).
    pub fn type_name(&self) -> Option<&str> {
        self.qualified_type()
            .and_then(|q| q.rsplit(URN_TYPE_DELIMITER).next())
    }

    /// The resource name.
    pub fn name(&self) -> Option<&str> {
        self.parts().map(|p| p[3])
    }

    fn parts(&self) -> Option<[&str; 4]> {
        let rest = self.0.strip_prefix(URN_PREFIX)?;
        let mut split = rest.splitn(4, URN_NAME_DELIMITER);
        let stack = split.next()?;
        let project = split.next()?;
        let qualified = split.next()?;
        let name = split.next()?;
        Some([stack, project, qualified, name])
    }
}

impl fmt::Debug for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Urn({})", self.0)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Urn {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Urn {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.0
    }
}
