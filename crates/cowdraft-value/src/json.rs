//! serde / JSON interop
//!
//! Values convert to and from `serde_json::Value`, and any `Serialize` type
//! can be lowered into a fresh, unfrozen tree.

use crate::container::{List, Map};
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Integers outside the `i64` range (large `u64`) become `Float` and may
/// lose precision.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Self::List(List::from_vec(items.into_iter().map(Self::from).collect()))
            }
            serde_json::Value::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect::<Map>(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(list) => serializer.collect_seq(list.iter()),
            Self::Map(map) => serializer.collect_map(map.iter()),
            Self::Opaque(opaque) => Err(S::Error::custom(format!(
                "opaque value of type {} cannot be serialized",
                opaque.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl Value {
    /// Render as a JSON document
    ///
    /// # Errors
    /// Fails if the tree contains an opaque value
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Lower any serializable value into a fresh, unfrozen tree
///
/// # Errors
/// Returns the serializer's error
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value).map(Value::from)
}

/// Rebuild a typed value from a tree
///
/// # Errors
/// Fails if the tree does not match `T` or contains an opaque value
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opaque::Opaque;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        foo: String,
        bar: String,
    }

    #[test]
    fn json_conversion_preserves_shape() {
        let value = Value::from(json!({"b": 1, "a": [true, null, 1.5, "s"]}));
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b"), Some(&Value::Int(1)));
        assert_eq!(value.get_path(&"a[2]".parse().unwrap()), Some(&Value::Float(1.5)));
        assert_eq!(value.to_json().unwrap(), json!({"b": 1, "a": [true, null, 1.5, "s"]}));
    }

    #[test]
    fn integers_beyond_i64_fall_back_to_float() {
        assert_eq!(Value::from(json!(i64::MAX)), Value::Int(i64::MAX));
        let big = Value::from(json!(u64::MAX));
        assert_eq!(big.kind(), crate::value::ValueKind::Float);
        assert!(big.as_f64().is_some_and(|f| f > 1.8e19));
    }

    #[test]
    fn typed_round_trip() {
        let item = Item {
            id: "i1".into(),
            foo: "foo".into(),
            bar: "bar".into(),
        };
        let value = to_value(&item).unwrap();
        assert_eq!(value.get("foo"), Some(&Value::from("foo")));
        assert_eq!(from_value::<Item>(&value).unwrap(), item);
    }

    #[test]
    fn opaque_refuses_to_serialize() {
        let value: Value = Opaque::new(7u32).into();
        let err = value.to_json().unwrap_err();
        assert!(err.to_string().contains("opaque value"));
    }

    #[test]
    fn deserialize_from_json_text() {
        let value: Value = serde_json::from_str(r#"{"items": [{"id": "i1"}]}"#).unwrap();
        assert_eq!(
            value.get_path(&"items[0].id".parse().unwrap()),
            Some(&Value::from("i1"))
        );
    }
}
