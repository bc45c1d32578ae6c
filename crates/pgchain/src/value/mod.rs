//! Dynamically typed values for bound arguments and decoded columns.
//!
//! [`Value`] is a closed set of the shapes pgchain moves between Rust and Postgres. It renders
//! itself for [`Command::pp`](crate::Command::pp) through `Display`, and is bound or decoded
//! through the adapters in [`pg`].

mod pg;

pub(crate) use pg::{ValueHolder, ValueParam};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single bound argument or column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the stored type, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Build a list value from anything convertible.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<Value>` from heterogeneous expressions.
///
/// ```ignore
/// let row = pgchain::vals!["Ryan Bryan", 4, "mc@ortserga.com"];
/// ```
#[macro_export]
macro_rules! vals {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

macro_rules! from_int {
    ($($ty:ty),+) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(i64::from(v))
            }
        })+
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Plain textual form used by debug rendering. Strings are neither quoted nor escaped.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => {
                f.write_str("\\x")?;
                v.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
            Value::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Value::Map(_) => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            // A number when f64 holds it exactly, the decimal text otherwise.
            Value::Decimal(v) => match v.to_f64() {
                Some(f) if f.to_string() == v.normalize().to_string() => {
                    serializer.serialize_f64(f)
                }
                _ => serializer.serialize_str(&v.to_string()),
            },
            Value::Text(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_bytes(v),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_unquoted() {
        assert_eq!(Value::from("Chamber Italian").to_string(), "Chamber Italian");
        assert_eq!(Value::from(133).to_string(), "133");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn display_bytes_as_hex() {
        assert_eq!(Value::from(vec![0xde_u8, 0xad]).to_string(), "\\xdead");
    }

    #[test]
    fn display_list_as_array_literal() {
        assert_eq!(Value::list([1, 2, 3]).to_string(), "{1,2,3}");
    }

    #[test]
    fn display_map_as_json() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), Value::from(1));
        assert_eq!(Value::Map(m).to_string(), r#"{"a":1}"#);
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn vals_macro_mixes_types() {
        let row = crate::vals!["Ryan Bryan", 4, "mc@ortserga.com"];
        assert_eq!(
            row,
            vec![
                Value::Text("Ryan Bryan".into()),
                Value::Int(4),
                Value::Text("mc@ortserga.com".into()),
            ]
        );
        assert!(crate::vals![].is_empty());
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let v = Value::from(serde_json::json!({"tags": ["a", "b"], "n": 1.5}));
        let Value::Map(m) = v else {
            panic!("expected map");
        };
        assert_eq!(m["tags"], Value::list(["a", "b"]));
        assert_eq!(m["n"], Value::Float(1.5));
    }

    #[test]
    fn serde_round_trips_through_json() {
        let v = Value::list([Value::from(1), Value::from("x"), Value::Null]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"[1,"x",null]"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn decimals_serialize_without_losing_digits() {
        let exact: Decimal = "7.25".parse().unwrap();
        assert_eq!(
            serde_json::to_value(Value::Decimal(exact)).unwrap(),
            serde_json::json!(7.25)
        );

        let wide: Decimal = "12345678901234567890.123".parse().unwrap();
        assert_eq!(
            serde_json::to_value(Value::Decimal(wide)).unwrap(),
            serde_json::json!("12345678901234567890.123")
        );
    }
}
