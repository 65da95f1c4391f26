//! The closed runtime value universe.
//!
//! Collection variants (Array, Map) are wrapped in `Rc` for cheap cloning via
//! reference counting; every value is immutable once constructed, so sharing
//! is safe by construction.

use std::cmp::Ordering;
use std::fmt::{self, Write};
use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};
use serde::{Serialize, Serializer};

use crate::types::TypeExpr;

/// Insertion-ordered map with hashable keys.
pub type ValueMap = IndexMap<MapKey, Value>;

/// A runtime value. Integers are arbitrary-precision, like the presets this
/// engine hosts expect; arithmetic never overflows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(BigInt),
    Float(f64),
    Boolean(bool),
    String(String),
    Array(Rc<Vec<Value>>),
    Map(Rc<ValueMap>),
    /// A function name used as a first-class value, e.g. `%upper` passed to
    /// `%array_apply`. Dispatched to a custom or registered function at
    /// evaluation.
    Lambda(LambdaRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaRef {
    pub name: String,
}

/// A map key. Only hashable values (Integer, String, Boolean) may key a Map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Integer(BigInt),
    Boolean(bool),
    String(String),
}

impl MapKey {
    /// Downcast a value to a key. `None` for non-hashable values.
    pub fn from_value(value: &Value) -> Option<MapKey> {
        match value {
            Value::Integer(n) => Some(MapKey::Integer(n.clone())),
            Value::Boolean(b) => Some(MapKey::Boolean(*b)),
            Value::String(s) => Some(MapKey::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Integer(n) => Value::Integer(n.clone()),
            MapKey::Boolean(b) => Value::Boolean(*b),
            MapKey::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Integer(n) => write!(f, "{n}"),
            MapKey::Boolean(b) => f.write_str(if *b { "True" } else { "False" }),
            MapKey::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for MapKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MapKey::Integer(n) => match n.to_i64() {
                Some(v) => serializer.serialize_i64(v),
                None => serializer.collect_str(n),
            },
            MapKey::Boolean(b) => serializer.serialize_bool(*b),
            MapKey::String(s) => serializer.serialize_str(s),
        }
    }
}

/// Lossy conversion for mixed Integer/Float arithmetic and comparisons.
/// Values beyond f64 range saturate to the signed infinity.
pub(crate) fn bigint_to_f64(n: &BigInt) -> f64 {
    n.to_f64().unwrap_or(if n.sign() == Sign::Minus {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    })
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(values))
    }

    pub fn map(map: ValueMap) -> Value {
        Value::Map(Rc::new(map))
    }

    pub fn lambda(name: impl Into<String>) -> Value {
        Value::Lambda(LambdaRef { name: name.into() })
    }

    /// The concrete static type of this value.
    pub fn type_of(&self) -> TypeExpr {
        match self {
            Value::Integer(_) => TypeExpr::Integer,
            Value::Float(_) => TypeExpr::Float,
            Value::Boolean(_) => TypeExpr::Boolean,
            Value::String(_) => TypeExpr::String,
            Value::Array(_) => TypeExpr::Array,
            Value::Map(_) => TypeExpr::Map,
            Value::Lambda(_) => TypeExpr::Lambda(0),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Lambda(_) => "Lambda",
        }
    }

    /// Python-style truthiness: zero, empty and `False` are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(n) => !n.is_zero(),
            Value::Float(x) => *x != 0.0,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Array(values) => !values.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Lambda(_) => true,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(bigint_to_f64(n)),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Equality with numeric cross-type coercion (`1 == 1.0`), applied
    /// recursively through Arrays and Map values. Map keys compare exactly.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                // both sides are numeric here, as_f64 cannot miss
                self.as_f64() == other.as_f64()
            }
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other_v| v.loose_eq(other_v)))
            }
            (Value::Lambda(a), Value::Lambda(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering for `%lt`/`%gt` and friends. Numerics compare across Integer
    /// and Float; Strings, Booleans and Arrays (lexicographically) compare
    /// within their own kind. Everything else is unorderable (`None`).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => {}
                        unequal => return Some(unequal),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// Element-form rendering: like `Display`, but Strings are double-quoted
    /// and escaped. This is what containers use for their elements.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.fmt_repr(&mut out);
        out
    }

    fn fmt_repr(&self, f: &mut impl Write) -> fmt::Result {
        match self {
            Value::String(s) => write_escaped(f, s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => f.write_str(if *b { "True" } else { "False" }),
            Value::Array(values) => {
                f.write_char('[')?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    value.fmt_repr(f)?;
                }
                f.write_char(']')
            }
            Value::Map(map) => {
                f.write_char('{')?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    key.to_value().fmt_repr(f)?;
                    f.write_str(": ")?;
                    value.fmt_repr(f)?;
                }
                f.write_char('}')
            }
            Value::Lambda(lambda) => write!(f, "%{}", lambda.name),
        }
    }

    /// Convert to a `serde_json::Value` for host-side consumption. Map keys
    /// become their display strings; `NaN`/infinite Floats become null, as do
    /// Integers beyond f64 range once they leave the i64 fast path.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Integer(n) => match n.to_i64() {
                Some(v) => serde_json::Value::from(v),
                None => serde_json::Number::from_f64(bigint_to_f64(n))
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::from(*b),
            Value::String(s) => serde_json::Value::from(s.as_str()),
            Value::Array(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Lambda(lambda) => serde_json::Value::from(format!("%{}", lambda.name)),
        }
    }
}

fn write_escaped(f: &mut impl Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Display is the concatenation form: Strings render raw, Booleans render
/// `True`/`False`, containers render JSON-like with double-quoted strings.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => other.fmt_repr(f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Integer(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Value {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Value {
        Value::array(values)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Value {
        Value::map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_strings_raw_and_elements_quoted() {
        let array = Value::array(vec![Value::from("a"), Value::from(1), Value::from(true)]);
        assert_eq!(array.to_string(), r#"["a", 1, True]"#);
        assert_eq!(Value::from("a").to_string(), "a");
        assert_eq!(Value::from("a").repr(), r#""a""#);
    }

    #[test]
    fn display_renders_maps_in_insertion_order() {
        let mut map = ValueMap::new();
        map.insert(MapKey::String("Key1".into()), Value::from("Value1"));
        map.insert(MapKey::Integer(BigInt::from(2)), Value::from(2.5));
        assert_eq!(
            Value::map(map).to_string(),
            r#"{"Key1": "Value1", 2: 2.5}"#
        );
    }

    #[test]
    fn whole_floats_render_without_trailing_zero() {
        assert_eq!(Value::from(2.0).to_string(), "2");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn loose_eq_coerces_numerics() {
        assert!(Value::from(1).loose_eq(&Value::from(1.0)));
        assert!(!Value::from(1).loose_eq(&Value::from("1")));
        assert!(Value::array(vec![Value::from(1)]).loose_eq(&Value::array(vec![Value::from(1.0)])));
    }

    #[test]
    fn compare_is_none_across_kinds() {
        assert_eq!(Value::from("a").compare(&Value::from(1)), None);
        assert_eq!(
            Value::from(1).compare(&Value::from(2.5)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn arrays_compare_lexicographically() {
        let short = Value::array(vec![Value::from(1)]);
        let long = Value::array(vec![Value::from(1), Value::from(2)]);
        assert_eq!(short.compare(&long), Some(Ordering::Less));
    }

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(!Value::from("").truthy());
        assert!(!Value::from(0).truthy());
        assert!(!Value::array(vec![]).truthy());
        assert!(Value::from("x").truthy());
    }

    #[test]
    fn to_json_stringifies_map_keys() {
        let mut map = ValueMap::new();
        map.insert(MapKey::Integer(BigInt::from(1)), Value::from("a"));
        let json = Value::map(map).to_json();
        assert_eq!(json, serde_json::json!({"1": "a"}));
    }

    #[test]
    fn integers_beyond_i64_still_render_exactly() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            Value::from(big).to_string(),
            "123456789012345678901234567890"
        );
    }
}
