//! Conversion between values and their weakly-typed JSON form.
//!
//! Plain nulls, booleans, numbers, strings, arrays, and objects map directly.
//! Assets, archives, secrets, and resource references become maps tagged
//! under [`SIG_KEY`]. Computed values become the sentinel string of their
//! element's type. Outputs do not survive the trip: unknown outputs come back
//! as computed values and known outputs as their (possibly secret) element.

use std::collections::BTreeMap;

use rstate_asset::{Archive, Asset};
use rstate_types::{Signature, UnknownSentinel, Urn, SIG_KEY};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::{ValueError, ValueResult};
use crate::map::PropertyMap;
use crate::value::{ResourceReference, Value};

pub const SECRET_VALUE_KEY: &str = "value";
pub const REFERENCE_URN_KEY: &str = "urn";
pub const REFERENCE_ID_KEY: &str = "id";
pub const REFERENCE_PACKAGE_VERSION_KEY: &str = "packageVersion";

/// Key substitution applied while walking maps. `None` keeps the key.
pub type KeyRepl<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Value substitution applied before encoding. `None` encodes normally.
pub type ValueRepl<'a> = &'a dyn Fn(&Value) -> Option<JsonValue>;

/// Value substitution applied before decoding. `None` decodes normally.
pub type WeakValueRepl<'a> = &'a dyn Fn(&JsonValue) -> Option<Value>;

impl Value {
    /// The weak form of this value.
    pub fn mappable(&self) -> JsonValue {
        self.map_repl(None, None)
    }

    /// The weak form of this value, with optional key and value substitution
    /// applied at every level of the walk.
    pub fn map_repl(&self, replk: Option<KeyRepl<'_>>, replv: Option<ValueRepl<'_>>) -> JsonValue {
        if let Some(replaced) = replv.and_then(|f| f(self)) {
            return replaced;
        }
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(arr) => {
                JsonValue::Array(arr.iter().map(|v| v.map_repl(replk, replv)).collect())
            }
            Self::Object(map) => JsonValue::Object(map.map_repl(replk, replv)),
            Self::Asset(asset) => JsonValue::Object(asset.serialize()),
            Self::Archive(archive) => JsonValue::Object(archive.serialize()),
            Self::Computed { element } | Self::Output { element, known: false, .. } => {
                JsonValue::String(sentinel_for(element).as_str().to_string())
            }
            Self::Output {
                element,
                secret: true,
                ..
            } => encode_secret(element.map_repl(replk, replv)),
            Self::Output { element, .. } => element.map_repl(replk, replv),
            Self::Secret { element } => encode_secret(element.map_repl(replk, replv)),
            Self::ResourceReference(r) => JsonValue::Object(encode_reference(r)),
        }
    }

    /// Decode a weak value.
    pub fn from_mappable(weak: &JsonValue) -> ValueResult<Self> {
        Self::from_map_repl(weak, None, None)
    }

    /// Decode a weak value, with optional key and value substitution applied
    /// at every level of the walk.
    pub fn from_map_repl(
        weak: &JsonValue,
        replk: Option<KeyRepl<'_>>,
        replv: Option<WeakValueRepl<'_>>,
    ) -> ValueResult<Self> {
        if let Some(replaced) = replv.and_then(|f| f(weak)) {
            return Ok(replaced);
        }
        Ok(match weak {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => Self::Number(n.as_f64().ok_or_else(|| {
                ValueError::malformed("number", format!("{n} is not representable as f64"))
            })?),
            JsonValue::String(s) => match UnknownSentinel::parse(s) {
                Some(sentinel) => Self::computed(zero_of(sentinel)?),
                None => Self::String(s.clone()),
            },
            JsonValue::Array(arr) => Self::Array(
                arr.iter()
                    .map(|v| Self::from_map_repl(v, replk, replv))
                    .collect::<ValueResult<_>>()?,
            ),
            JsonValue::Object(map) => decode_object(map, replk, replv)?,
        })
    }
}

impl PropertyMap {
    /// The weak form of this map.
    pub fn mappable(&self) -> Map<String, JsonValue> {
        self.map_repl(None, None)
    }

    /// The weak form of this map, with optional key and value substitution.
    pub fn map_repl(
        &self,
        replk: Option<KeyRepl<'_>>,
        replv: Option<ValueRepl<'_>>,
    ) -> Map<String, JsonValue> {
        self.iter()
            .map(|(k, v)| {
                let key = replk
                    .and_then(|f| f(k.as_str()))
                    .unwrap_or_else(|| k.to_string());
                (key, v.map_repl(replk, replv))
            })
            .collect()
    }

    /// Decode a plain weak map. Signature keys are not interpreted at this level.
    pub fn from_mappable(weak: &Map<String, JsonValue>) -> ValueResult<Self> {
        Self::from_map_repl(weak, None, None)
    }

    /// Decode a plain weak map with optional key and value substitution.
    pub fn from_map_repl(
        weak: &Map<String, JsonValue>,
        replk: Option<KeyRepl<'_>>,
        replv: Option<WeakValueRepl<'_>>,
    ) -> ValueResult<Self> {
        let mut map = PropertyMap::new();
        for (k, v) in weak {
            let key = replk.and_then(|f| f(k)).unwrap_or_else(|| k.clone());
            map.insert(key, Value::from_map_repl(v, replk, replv)?);
        }
        Ok(map)
    }
}

/// The sentinel a computed value with this element flattens to. Elements
/// without a sentinel of their own use the string sentinel.
fn sentinel_for(element: &Value) -> UnknownSentinel {
    match element {
        Value::Bool(_) => UnknownSentinel::Bool,
        Value::Number(_) => UnknownSentinel::Number,
        Value::Array(_) => UnknownSentinel::Array,
        Value::Object(_) => UnknownSentinel::Object,
        Value::Asset(_) => UnknownSentinel::Asset,
        Value::Archive(_) => UnknownSentinel::Archive,
        _ => UnknownSentinel::String,
    }
}

fn zero_of(sentinel: UnknownSentinel) -> ValueResult<Value> {
    Ok(match sentinel {
        UnknownSentinel::Bool => Value::Bool(false),
        UnknownSentinel::Number => Value::Number(0.0),
        UnknownSentinel::String => Value::String(String::new()),
        UnknownSentinel::Array => Value::Array(Vec::new()),
        UnknownSentinel::Object => Value::Object(PropertyMap::new()),
        UnknownSentinel::Asset => Value::Asset(Asset::from_text("")),
        UnknownSentinel::Archive => Value::Archive(Archive::from_assets(BTreeMap::new())?),
    })
}

fn encode_secret(inner: JsonValue) -> JsonValue {
    let mut map = Signature::Secret.new_map();
    map.insert(SECRET_VALUE_KEY.into(), inner);
    JsonValue::Object(map)
}

fn encode_reference(r: &ResourceReference) -> Map<String, JsonValue> {
    let mut map = Signature::ResourceReference.new_map();
    map.insert(
        REFERENCE_URN_KEY.into(),
        JsonValue::String(r.urn.as_str().to_string()),
    );
    match r.id.as_ref() {
        Value::Null => {}
        Value::Computed { .. } | Value::Output { known: false, .. } => {
            map.insert(
                REFERENCE_ID_KEY.into(),
                JsonValue::String(UnknownSentinel::String.as_str().to_string()),
            );
        }
        other => {
            map.insert(REFERENCE_ID_KEY.into(), other.mappable());
        }
    }
    if !r.package_version.is_empty() {
        map.insert(
            REFERENCE_PACKAGE_VERSION_KEY.into(),
            JsonValue::String(r.package_version.clone()),
        );
    }
    map
}

fn decode_object(
    map: &Map<String, JsonValue>,
    replk: Option<KeyRepl<'_>>,
    replv: Option<WeakValueRepl<'_>>,
) -> ValueResult<Value> {
    let sig = match Signature::of(map) {
        None => return Ok(Value::Object(PropertyMap::from_map_repl(map, replk, replv)?)),
        Some(sig) => sig?,
    };
    match sig {
        Signature::Asset => Asset::deserialize(map)?
            .map(Value::Asset)
            .ok_or_else(|| ValueError::malformed("asset", "missing asset signature")),
        Signature::Archive => Archive::deserialize(map)?
            .map(Value::Archive)
            .ok_or_else(|| ValueError::malformed("archive", "missing archive signature")),
        Signature::Secret => {
            let inner = map
                .get(SECRET_VALUE_KEY)
                .ok_or_else(|| ValueError::malformed("secret", "missing 'value'"))?;
            Ok(Value::secret(Value::from_map_repl(inner, replk, replv)?))
        }
        Signature::ResourceReference => decode_reference(map).map(Value::ResourceReference),
    }
}

fn decode_reference(map: &Map<String, JsonValue>) -> ValueResult<ResourceReference> {
    let urn = match map.get(REFERENCE_URN_KEY) {
        Some(JsonValue::String(s)) => Urn::from(s.as_str()),
        Some(other) => {
            return Err(ValueError::malformed(
                "resource reference",
                format!("'urn' must be a string, found {other}"),
            ))
        }
        None => return Err(ValueError::malformed("resource reference", "missing 'urn'")),
    };
    let id = match optional_string(map, REFERENCE_ID_KEY)? {
        None => Value::Null,
        Some(s) if s == UnknownSentinel::String.as_str() => Value::computed(Value::from("")),
        Some(s) => Value::String(s.to_string()),
    };
    let package_version = optional_string(map, REFERENCE_PACKAGE_VERSION_KEY)?.unwrap_or_default();
    Ok(ResourceReference::new(urn, id, package_version))
}

fn optional_string<'a>(map: &'a Map<String, JsonValue>, key: &str) -> ValueResult<Option<&'a str>> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(ValueError::malformed(
            "resource reference",
            format!("'{key}' must be a string, found {other}"),
        )),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.mappable().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let weak = JsonValue::deserialize(deserializer)?;
        Value::from_mappable(&weak).map_err(D::Error::custom)
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.mappable().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let weak = Map::<String, JsonValue>::deserialize(deserializer)?;
        PropertyMap::from_mappable(&weak).map_err(D::Error::custom)
    }
}

/// Returns `true` if the weak map is tagged with any signature.
pub fn is_signed(map: &Map<String, JsonValue>) -> bool {
    map.contains_key(SIG_KEY)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn urn() -> Urn {
        Urn::new("dev", "proj", Some("parent:Type"), "pkg:mod:Res", "res")
    }

    fn roundtrip(v: &Value) -> Value {
        let text = serde_json::to_string(v).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn plain_values_map_directly() {
        let map: PropertyMap = [
            ("b", Value::from(true)),
            ("n", Value::from(42.5)),
            ("s", Value::from("x")),
            ("a", Value::Array(vec![Value::Null, Value::from(1)])),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            Value::Object(map.clone()).mappable(),
            json!({"a": [null, 1.0], "b": true, "n": 42.5, "s": "x"})
        );
        assert_eq!(roundtrip(&Value::Object(map.clone())), Value::Object(map));
    }

    #[test]
    fn non_finite_numbers_become_null() {
        assert_eq!(Value::from(f64::NAN).mappable(), JsonValue::Null);
        assert_eq!(Value::from(f64::INFINITY).mappable(), JsonValue::Null);
    }

    #[test]
    fn secret_encoding() {
        let v = Value::secret(Value::from("pw"));
        let weak = v.mappable();
        assert_eq!(
            weak,
            json!({SIG_KEY: Signature::Secret.as_str(), "value": "pw"})
        );
        assert_eq!(Value::from_mappable(&weak).unwrap(), v);
    }

    #[test]
    fn secret_without_value_is_malformed() {
        let weak = json!({SIG_KEY: Signature::Secret.as_str()});
        match Value::from_mappable(&weak) {
            Err(ValueError::Malformed { what, .. }) => assert_eq!(what, "secret"),
            other => panic!("expected malformed secret, got {:?}", other),
        }
    }

    #[test]
    fn unknown_signature_is_rejected() {
        let weak = json!({SIG_KEY: "ffffffffffffffffffffffffffffffff"});
        assert!(matches!(
            Value::from_mappable(&weak),
            Err(ValueError::Type(_))
        ));
    }

    #[test]
    fn resource_reference_encoding() {
        let v = Value::resource_reference(urn(), Value::from("i-123"), "4.5.6");
        let weak = v.mappable();
        assert_eq!(
            weak,
            json!({
                SIG_KEY: Signature::ResourceReference.as_str(),
                "urn": urn().as_str(),
                "id": "i-123",
                "packageVersion": "4.5.6",
            })
        );
        assert_eq!(Value::from_mappable(&weak).unwrap(), v);
    }

    #[test]
    fn resource_reference_optional_fields() {
        let bare = Value::resource_reference(urn(), Value::Null, "");
        let weak = bare.mappable();
        assert_eq!(
            weak,
            json!({SIG_KEY: Signature::ResourceReference.as_str(), "urn": urn().as_str()})
        );
        assert_eq!(Value::from_mappable(&weak).unwrap(), bare);

        let unknown = Value::resource_reference(urn(), Value::computed(Value::from("")), "");
        assert_eq!(roundtrip(&unknown), unknown);
    }

    #[test]
    fn resource_reference_rejects_bad_fields() {
        let sig = Signature::ResourceReference.as_str();
        for weak in [
            json!({SIG_KEY: sig}),
            json!({SIG_KEY: sig, "urn": 7}),
            json!({SIG_KEY: sig, "urn": "u", "id": 7}),
            json!({SIG_KEY: sig, "urn": "u", "packageVersion": true}),
        ] {
            assert!(
                matches!(Value::from_mappable(&weak), Err(ValueError::Malformed { .. })),
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn computed_values_use_sentinels() {
        let cases = [
            (Value::from(true), UnknownSentinel::Bool, Value::from(false)),
            (Value::from(3), UnknownSentinel::Number, Value::from(0.0)),
            (Value::from("s"), UnknownSentinel::String, Value::from("")),
            (Value::Array(vec![Value::Null]), UnknownSentinel::Array, Value::Array(vec![])),
            (
                Value::Object(PropertyMap::new()),
                UnknownSentinel::Object,
                Value::Object(PropertyMap::new()),
            ),
        ];
        for (element, sentinel, zero) in cases {
            let weak = Value::computed(element).mappable();
            assert_eq!(weak, JsonValue::String(sentinel.as_str().into()));
            assert_eq!(Value::from_mappable(&weak).unwrap(), Value::computed(zero));
        }
        assert_eq!(
            Value::computed(Value::Null).mappable(),
            JsonValue::String(UnknownSentinel::String.as_str().into())
        );
    }

    #[test]
    fn computed_asset_and_archive_decode_to_empty_contents() {
        let asset = Value::from_mappable(&json!(UnknownSentinel::Asset.as_str())).unwrap();
        match asset {
            Value::Computed { element } => assert_eq!(element.as_asset().and_then(Asset::text), Some("")),
            other => panic!("expected computed asset, got {:?}", other),
        }
        let archive = Value::from_mappable(&json!(UnknownSentinel::Archive.as_str())).unwrap();
        match archive {
            Value::Computed { element } => assert!(element.is_archive()),
            other => panic!("expected computed archive, got {:?}", other),
        }
    }

    #[test]
    fn outputs_flatten_lossily() {
        let unknown = Value::unknown_output(Value::from(1));
        assert_eq!(roundtrip(&unknown), Value::computed(Value::from(0.0)));

        let known = Value::output(Value::from("v"), true, false, vec![urn()]);
        assert_eq!(roundtrip(&known), Value::from("v"));

        let secret = Value::output(Value::from("v"), true, true, vec![]);
        assert_eq!(roundtrip(&secret), Value::secret(Value::from("v")));
    }

    #[test]
    fn assets_embed_as_signed_maps() {
        let v = Value::from(Asset::from_text("a test asset"));
        let weak = v.mappable();
        let map = weak.as_object().unwrap();
        assert!(is_signed(map));
        assert!(Signature::Asset.tags(map));
        assert_eq!(Value::from_mappable(&weak).unwrap(), v);
    }

    #[test]
    fn key_and_value_substitution() {
        let map: PropertyMap = [
            ("first_name", Value::from("ada")),
            ("token", Value::secret(Value::from("t"))),
        ]
        .into_iter()
        .collect();
        let upper = |k: &str| Some(k.to_uppercase());
        let redact = |v: &Value| v.is_secret().then(|| json!("***"));
        let weak = map.map_repl(Some(&upper), Some(&redact));
        assert_eq!(
            JsonValue::Object(weak),
            json!({"FIRST_NAME": "ada", "TOKEN": "***"})
        );

        let weak = json!({"count": "7", "name": "x"});
        let lower = |k: &str| Some(format!("{k}_"));
        let numeric = |v: &JsonValue| {
            v.as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .map(Value::from)
        };
        let decoded = PropertyMap::from_map_repl(weak.as_object().unwrap(), Some(&lower), Some(&numeric))
            .unwrap();
        assert_eq!(decoded.get("count_"), Some(&Value::from(7.0)));
        assert_eq!(decoded.get("name_"), Some(&Value::from("x")));
    }

    #[test]
    fn nested_secrets_roundtrip() {
        let inner: PropertyMap = [("k", Value::secret(Value::Array(vec![Value::from(1)])))]
            .into_iter()
            .collect();
        let v = Value::Array(vec![Value::Object(inner), Value::secret(Value::Null)]);
        assert_eq!(roundtrip(&v), v);
    }
}
