//! The tagged-union property value.

use std::fmt;

use rstate_asset::{Archive, Asset};
use rstate_types::Urn;
use serde_json::Value as JsonValue;

use crate::map::PropertyMap;

/// A reference to another resource by URN, optionally carrying its ID.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceReference {
    pub urn: Urn,
    /// `Null` when absent, a `String` when known, `Computed` when unknown.
    pub id: Box<Value>,
    pub package_version: String,
}

impl ResourceReference {
    pub fn new(urn: Urn, id: Value, package_version: impl Into<String>) -> Self {
        Self {
            urn,
            id: Box::new(id),
            package_version: package_version.into(),
        }
    }

    /// References are equal when URNs match and IDs are deeply equal.
    /// Two unknown IDs are equal. The package version is not compared.
    pub fn deep_equals(&self, other: &ResourceReference) -> bool {
        if self.urn != other.urn {
            return false;
        }
        if self.id.is_computed() && other.id.is_computed() {
            return true;
        }
        self.id.deep_equals(&other.id)
    }
}

/// Any storable property value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(PropertyMap),
    Asset(Asset),
    Archive(Archive),
    /// A value of known type whose concrete value is not yet available.
    Computed { element: Box<Value> },
    /// The result of a resource output, tracking the resources it came from.
    Output {
        element: Box<Value>,
        known: bool,
        secret: bool,
        dependencies: Vec<Urn>,
    },
    /// A sensitive value. Equality looks through the wrapper.
    Secret { element: Box<Value> },
    ResourceReference(ResourceReference),
}

impl Value {
    pub fn computed(element: Value) -> Self {
        Self::Computed {
            element: Box::new(element),
        }
    }

    pub fn output(element: Value, known: bool, secret: bool, dependencies: Vec<Urn>) -> Self {
        Self::Output {
            element: Box::new(element),
            known,
            secret,
            dependencies,
        }
    }

    /// An unknown output with no dependencies.
    pub fn unknown_output(element: Value) -> Self {
        Self::output(element, false, false, Vec::new())
    }

    pub fn secret(element: Value) -> Self {
        Self::Secret {
            element: Box::new(element),
        }
    }

    pub fn resource_reference(urn: Urn, id: Value, package_version: impl Into<String>) -> Self {
        Self::ResourceReference(ResourceReference::new(urn, id, package_version))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_asset(&self) -> bool {
        matches!(self, Self::Asset(_))
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output { .. })
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret { .. })
    }

    pub fn is_resource_reference(&self) -> bool {
        matches!(self, Self::ResourceReference(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut PropertyMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn as_archive(&self) -> Option<&Archive> {
        match self {
            Self::Archive(archive) => Some(archive),
            _ => None,
        }
    }

    pub fn as_resource_reference(&self) -> Option<&ResourceReference> {
        match self {
            Self::ResourceReference(r) => Some(r),
            _ => None,
        }
    }

    /// The payload of a secret, or `None` for any other variant.
    pub fn secret_element(&self) -> Option<&Value> {
        match self {
            Self::Secret { element } => Some(element),
            _ => None,
        }
    }

    /// Returns `false` for `Null` and for unknown outputs.
    ///
    /// Computed values report `true`: their type is known even though their
    /// concrete value is not.
    pub fn has_value(&self) -> bool {
        !matches!(self, Self::Null | Self::Output { known: false, .. })
    }

    /// Returns `true` if any computed value or unknown output is reachable.
    pub fn contains_unknowns(&self) -> bool {
        match self {
            Self::Computed { .. } | Self::Output { known: false, .. } => true,
            Self::Output { element, .. } | Self::Secret { element } => element.contains_unknowns(),
            Self::Array(arr) => arr.iter().any(Value::contains_unknowns),
            Self::Object(map) => map.contains_unknowns(),
            _ => false,
        }
    }

    /// Returns `true` if any secret, or secret output, is reachable.
    pub fn contains_secrets(&self) -> bool {
        match self {
            Self::Secret { .. } | Self::Output { secret: true, .. } => true,
            Self::Computed { element } | Self::Output { element, .. } => {
                element.contains_secrets()
            }
            Self::Array(arr) => arr.iter().any(Value::contains_secrets),
            Self::Object(map) => map.contains_secrets(),
            _ => false,
        }
    }

    /// A short descriptor of this value's type, e.g. `secret<output<string>>`.
    pub fn type_string(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "bool".into(),
            Self::Number(_) => "number".into(),
            Self::String(_) => "string".into(),
            Self::Array(_) => "[]".into(),
            Self::Object(_) => "object".into(),
            Self::Asset(_) => "asset".into(),
            Self::Archive(_) => "archive".into(),
            Self::Computed { element } | Self::Output { element, .. } => {
                format!("output<{}>", element.type_string())
            }
            Self::Secret { element } => format!("secret<{}>", element.type_string()),
            Self::ResourceReference(r) => {
                let id = match r.id.as_ref() {
                    Self::Null => String::new(),
                    Self::String(s) => s.clone(),
                    other => other.type_string(),
                };
                format!(
                    "resourceReference({:?}, {:?}, {:?})",
                    r.urn.as_str(),
                    id,
                    r.package_version
                )
            }
        }
    }

    /// Semantic equality.
    ///
    /// Differs from `==` in a few places: assets and archives compare by
    /// content hash, secrets compare their payloads, any two computed values
    /// are equal, resource references ignore the package version, and map
    /// keys without a value are treated as absent. `NaN` equals `NaN` so that
    /// every value equals itself.
    pub fn deep_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_equals(y))
            }
            (Self::Object(a), Self::Object(b)) => a.deep_equals(b),
            (Self::Asset(a), Self::Asset(b)) => a == b || a.equals(b),
            (Self::Archive(a), Self::Archive(b)) => a == b || a.equals(b),
            (Self::Computed { .. }, Self::Computed { .. }) => true,
            (
                Self::Output {
                    element: e1,
                    known: k1,
                    secret: s1,
                    dependencies: d1,
                },
                Self::Output {
                    element: e2,
                    known: k2,
                    secret: s2,
                    dependencies: d2,
                },
            ) => {
                if k1 != k2 || s1 != s2 || !same_dependencies(d1, d2) {
                    return false;
                }
                !*k1 || e1.deep_equals(e2)
            }
            (Self::Secret { element: a }, Self::Secret { element: b }) => a.deep_equals(b),
            (Self::ResourceReference(a), Self::ResourceReference(b)) => a.deep_equals(b),
            _ => false,
        }
    }
}

fn same_dependencies(a: &[Urn], b: &[Urn]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&Urn> = a.iter().collect();
    let mut b: Vec<&Urn> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}

impl fmt::Display for Value {
    /// Unknowns render as their type, secrets are redacted, and everything
    /// else renders as its weak form in braces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computed { .. } | Self::Output { .. } => write!(f, "{}{{}}", self.type_string()),
            Self::Secret { .. } => write!(f, "[secret]"),
            Self::String(s) => write!(f, "{{{s}}}"),
            _ => {
                let redact = |v: &Value| match v {
                    Self::Secret { .. } => Some(JsonValue::String("[secret]".into())),
                    _ => None,
                };
                write!(f, "{{{}}}", self.map_repl(None, Some(&redact)))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Self::Array(arr)
    }
}

impl From<PropertyMap> for Value {
    fn from(map: PropertyMap) -> Self {
        Self::Object(map)
    }
}

impl From<Asset> for Value {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}

impl From<Archive> for Value {
    fn from(archive: Archive) -> Self {
        Self::Archive(archive)
    }
}

impl From<ResourceReference> for Value {
    fn from(r: ResourceReference) -> Self {
        Self::ResourceReference(r)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use rstate_asset::ArchiveMember;

    use super::*;

    fn urn(name: &str) -> Urn {
        Urn::new("stack", "proj", None, "pkg:index:Thing", name)
    }

    #[test]
    fn has_value_rules() {
        assert!(!Value::Null.has_value());
        assert!(!Value::unknown_output(Value::from("x")).has_value());
        assert!(Value::output(Value::from("x"), true, false, vec![]).has_value());
        assert!(Value::computed(Value::from("")).has_value());
        assert!(Value::from(false).has_value());
        assert!(Value::secret(Value::Null).has_value());
    }

    #[test]
    fn contains_unknowns_recurses() {
        assert!(Value::computed(Value::Null).contains_unknowns());
        assert!(Value::unknown_output(Value::Null).contains_unknowns());
        assert!(!Value::output(Value::from(1), true, false, vec![]).contains_unknowns());
        assert!(Value::output(
            Value::Array(vec![Value::computed(Value::Null)]),
            true,
            false,
            vec![]
        )
        .contains_unknowns());

        let nested: PropertyMap = [(
            "a",
            Value::Array(vec![Value::from(1), Value::secret(Value::computed(Value::Null))]),
        )]
        .into_iter()
        .collect();
        assert!(Value::Object(nested).contains_unknowns());
        assert!(!Value::from("plain").contains_unknowns());
    }

    #[test]
    fn contains_secrets_recurses() {
        assert!(Value::secret(Value::from(1)).contains_secrets());
        assert!(Value::output(Value::from(1), true, true, vec![]).contains_secrets());
        assert!(!Value::output(Value::from(1), true, false, vec![]).contains_secrets());
        assert!(Value::computed(Value::secret(Value::Null)).contains_secrets());
        assert!(Value::Array(vec![Value::Null, Value::secret(Value::Null)]).contains_secrets());
        assert!(!Value::Array(vec![Value::Null]).contains_secrets());
    }

    #[test]
    fn type_strings() {
        assert_eq!(Value::Null.type_string(), "null");
        assert_eq!(Value::Array(vec![]).type_string(), "[]");
        assert_eq!(
            Value::secret(Value::unknown_output(Value::from("s"))).type_string(),
            "secret<output<string>>"
        );
        assert_eq!(
            Value::computed(Value::from(1.0)).type_string(),
            "output<number>"
        );
        let r = Value::resource_reference(urn("a"), Value::from("id-1"), "1.2.3");
        assert_eq!(
            r.type_string(),
            format!("resourceReference({:?}, \"id-1\", \"1.2.3\")", urn("a").as_str())
        );
    }

    #[test]
    fn secret_equality_ignores_wrapper_only() {
        let a = Value::secret(Value::from("pw"));
        let b = Value::secret(Value::from("pw"));
        assert!(a.deep_equals(&b));
        assert!(!a.deep_equals(&Value::secret(Value::from("other"))));
        assert!(!a.deep_equals(&Value::from("pw")));
    }

    #[test]
    fn resource_reference_ignores_package_version() {
        let a = Value::resource_reference(urn("a"), Value::from("id"), "1.0.0");
        let b = Value::resource_reference(urn("a"), Value::from("id"), "2.0.0");
        let c = Value::resource_reference(urn("b"), Value::from("id"), "1.0.0");
        assert!(a.deep_equals(&b));
        assert!(!a.deep_equals(&c));

        let unknown_a = Value::resource_reference(urn("a"), Value::computed(Value::from("")), "");
        let unknown_b = Value::resource_reference(urn("a"), Value::computed(Value::Null), "");
        assert!(unknown_a.deep_equals(&unknown_b));
        assert!(!unknown_a.deep_equals(&a));
    }

    #[test]
    fn nan_equals_itself() {
        let nan = Value::from(f64::NAN);
        assert!(nan.deep_equals(&nan));
        assert!(!nan.deep_equals(&Value::from(0.0)));
    }

    #[test]
    fn outputs_compare_flags_and_known_elements() {
        let a = Value::output(Value::from(1), true, false, vec![urn("x"), urn("y")]);
        let b = Value::output(Value::from(1), true, false, vec![urn("y"), urn("x")]);
        assert!(a.deep_equals(&b));
        assert!(!a.deep_equals(&Value::output(Value::from(2), true, false, vec![urn("x"), urn("y")])));
        assert!(!a.deep_equals(&Value::output(Value::from(1), true, true, vec![urn("x"), urn("y")])));

        let u1 = Value::unknown_output(Value::from("a"));
        let u2 = Value::unknown_output(Value::from("b"));
        assert!(u1.deep_equals(&u2));
        assert!(!u1.deep_equals(&a));
    }

    #[test]
    fn computed_values_are_all_equal() {
        assert!(Value::computed(Value::from(1)).deep_equals(&Value::computed(Value::from("x"))));
        assert!(!Value::computed(Value::Null).deep_equals(&Value::Null));
    }

    #[test]
    fn assets_compare_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "a test asset").unwrap();

        let text = Value::from(Asset::from_text("a test asset"));
        let file = Value::from(Asset::from_path(&path).unwrap());
        assert!(text.deep_equals(&file));
        assert_ne!(text, file);
        assert!(!text.deep_equals(&Value::from(Asset::from_text("other"))));
    }

    #[test]
    fn unreadable_assets_equal_themselves() {
        let missing = Value::from(Asset::placeholder("abc"));
        assert!(missing.deep_equals(&missing.clone()));
        assert!(!missing.deep_equals(&Value::from(Asset::placeholder("def"))));
    }

    #[test]
    fn archives_compare_by_content() {
        let members = |text: &str| {
            let mut m = BTreeMap::new();
            m.insert("f".to_string(), ArchiveMember::from(Asset::from_text(text)));
            m
        };
        let a = Value::from(Archive::from_assets(members("one")).unwrap());
        let b = Value::from(Archive::from_assets(members("one")).unwrap());
        let c = Value::from(Archive::from_assets(members("two")).unwrap());
        assert!(a.deep_equals(&b));
        assert!(!a.deep_equals(&c));
    }

    #[test]
    fn mismatched_variants_are_unequal() {
        assert!(!Value::from(1).deep_equals(&Value::from("1")));
        assert!(!Value::Null.deep_equals(&Value::from(false)));
        assert!(!Value::Array(vec![]).deep_equals(&Value::Object(PropertyMap::new())));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::from("hi").to_string(), "{hi}");
        assert_eq!(Value::from(true).to_string(), "{true}");
        assert_eq!(Value::secret(Value::from("pw")).to_string(), "[secret]");
        assert_eq!(
            Value::computed(Value::from("")).to_string(),
            "output<string>{}"
        );

        let map: PropertyMap = [("pw", Value::secret(Value::from("hunter2"))), ("user", Value::from("me"))]
            .into_iter()
            .collect();
        let shown = Value::Object(map).to_string();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("[secret]"));
    }

    #[test]
    fn accessors_match_variants() {
        let mut v = Value::Array(vec![Value::from(1)]);
        assert!(v.as_object().is_none());
        v.as_array_mut().unwrap().push(Value::from(2));
        assert_eq!(v.as_array().map(Vec::len), Some(2));
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert_eq!(Value::from(2.5).as_number(), Some(2.5));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(
            Value::secret(Value::from(1)).secret_element(),
            Some(&Value::from(1))
        );
    }
}
