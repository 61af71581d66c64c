//! Typed, read-only views over JSON documents.
//!
//! The selection engine never looks at a concrete document type. It works
//! through [`JsonValue`], a small capability set (kind, scalar accessors,
//! indexed and named lookup, enumeration) implemented here for
//! `serde_json::Value` and for the crate's own owned [`Value`].
//!
//! # Examples
//!
//! ```
//! use jsonsift::value::{JsonValue, Kind, Value};
//! use serde_json::json;
//!
//! let doc = json!({"tags": ["a", "b"]});
//! assert_eq!(doc.kind(), Kind::Object);
//! assert_eq!(doc.get_member("tags").and_then(|t| t.len()), Some(2));
//!
//! let owned = Value::from(doc.clone());
//! assert_eq!(owned.get_member("tags").and_then(|t| t.get_index(1)).and_then(|v| v.as_str()), Some("b"));
//! ```

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use rust_decimal::{Decimal, prelude::FromPrimitive};

/// The kind of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    /// Human-readable kind name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only typed access to a JSON value.
///
/// Implementations never mutate the document. Borrowed results (`&Self`)
/// live as long as the value they were obtained from.
pub trait JsonValue {
    fn kind(&self) -> Kind;

    fn as_bool(&self) -> Option<bool>;

    /// Integer value, if the number is an integer that fits in `i64`.
    fn as_i64(&self) -> Option<i64>;

    fn as_f64(&self) -> Option<f64>;

    fn as_str(&self) -> Option<&str>;

    /// Element count for arrays, member count for objects, `None` otherwise.
    fn len(&self) -> Option<usize>;

    fn get_index(&self, index: usize) -> Option<&Self>;

    fn get_member(&self, name: &str) -> Option<&Self>;

    /// Array elements in order. Empty for every other kind.
    fn elements(&self) -> Box<dyn Iterator<Item = &Self> + '_>;

    /// Object members in document order. Empty for every other kind.
    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_>;

    /// JMESPath falsiness: `null`, `false`, `""`, `[]` and `{}`.
    ///
    /// Numbers are never false, zero included.
    fn is_false(&self) -> bool {
        match self.kind() {
            Kind::Null => true,
            Kind::Bool => self.as_bool() == Some(false),
            Kind::Number => false,
            Kind::String => self.as_str().is_some_and(str::is_empty),
            Kind::Array | Kind::Object => self.len() == Some(0),
        }
    }

    /// Copy this view into an owned [`Value`].
    fn to_value(&self) -> Value {
        match self.kind() {
            Kind::Null => Value::Null,
            Kind::Bool => Value::Boolean(self.as_bool().unwrap_or_default()),
            Kind::Number => match self.as_i64() {
                Some(n) => Value::Integer(n),
                None => Value::Float(self.as_f64().unwrap_or(f64::NAN)),
            },
            Kind::String => Value::String(self.as_str().unwrap_or_default().to_string()),
            Kind::Array => Value::Array(self.elements().map(|v| v.to_value()).collect()),
            Kind::Object => Value::Object(
                self.members()
                    .map(|(k, v)| (k.to_string(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

/// An owned JSON value.
///
/// Keeps the distinction between integers and floats, which matters for exact
/// comparisons. Object members are kept in key order so that enumeration is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,

    Boolean(bool),

    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    String(String),

    Array(Vec<Value>),

    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        !self.is_false()
    }
}

impl JsonValue for Value {
    fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Boolean(_) => Kind::Bool,
            Value::Float(_) | Value::Integer(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn len(&self) -> Option<usize> {
        match self {
            Value::Array(arr) => Some(arr.len()),
            Value::Object(obj) => Some(obj.len()),
            _ => None,
        }
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        match self {
            Value::Array(arr) => arr.get(index),
            _ => None,
        }
    }

    fn get_member(&self, name: &str) -> Option<&Self> {
        match self {
            Value::Object(obj) => obj.get(name),
            _ => None,
        }
    }

    fn elements(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        match self {
            Value::Array(arr) => Box::new(arr.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        match self {
            Value::Object(obj) => Box::new(obj.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl JsonValue for serde_json::Value {
    fn kind(&self) -> Kind {
        use serde_json::Value::*;
        match self {
            Null => Kind::Null,
            Bool(_) => Kind::Bool,
            Number(_) => Kind::Number,
            String(_) => Kind::String,
            Array(_) => Kind::Array,
            Object(_) => Kind::Object,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        serde_json::Value::as_bool(self)
    }

    fn as_i64(&self) -> Option<i64> {
        serde_json::Value::as_i64(self)
    }

    fn as_f64(&self) -> Option<f64> {
        serde_json::Value::as_f64(self)
    }

    fn as_str(&self) -> Option<&str> {
        serde_json::Value::as_str(self)
    }

    fn len(&self) -> Option<usize> {
        match self {
            serde_json::Value::Array(arr) => Some(arr.len()),
            serde_json::Value::Object(obj) => Some(obj.len()),
            _ => None,
        }
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_array().and_then(|arr| arr.get(index))
    }

    fn get_member(&self, name: &str) -> Option<&Self> {
        self.as_object().and_then(|obj| obj.get(name))
    }

    fn elements(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        match self {
            serde_json::Value::Array(arr) => Box::new(arr.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        match self {
            serde_json::Value::Object(obj) => Box::new(obj.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }
}

/// Deep equality across two views, possibly of different document types.
///
/// Numbers compare by numeric value, so `1` equals `1.0`.
pub fn json_equal<L, R>(left: &L, right: &R) -> bool
where
    L: JsonValue + ?Sized,
    R: JsonValue + ?Sized,
{
    if left.kind() != right.kind() {
        return false;
    }
    match left.kind() {
        Kind::Null => true,
        Kind::Bool => left.as_bool() == right.as_bool(),
        Kind::Number => compare_numbers(left, right) == Some(Ordering::Equal),
        Kind::String => left.as_str() == right.as_str(),
        Kind::Array => {
            left.len() == right.len()
                && left
                    .elements()
                    .zip(right.elements())
                    .all(|(l, r)| json_equal(l, r))
        }
        Kind::Object => {
            left.len() == right.len()
                && left.members().all(|(name, l)| {
                    right
                        .get_member(name)
                        .is_some_and(|r| json_equal(l, r))
                })
        }
    }
}

/// Compare two numeric views. `None` when either side is not a number or the
/// comparison is undefined (NaN).
///
/// Integer against float goes through `Decimal` so large integers are not
/// rounded before comparing.
pub fn compare_numbers<L, R>(left: &L, right: &R) -> Option<Ordering>
where
    L: JsonValue + ?Sized,
    R: JsonValue + ?Sized,
{
    if left.kind() != Kind::Number || right.kind() != Kind::Number {
        return None;
    }
    match (left.as_i64(), right.as_i64()) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        (Some(a), None) => {
            let b = right.as_f64()?;
            mixed_cmp(a, b)
        }
        (None, Some(b)) => {
            let a = left.as_f64()?;
            mixed_cmp(b, a).map(Ordering::reverse)
        }
        (None, None) => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn mixed_cmp(int: i64, float: f64) -> Option<Ordering> {
    if let Some(id) = Decimal::from_i64(int)
        && let Some(fd) = Decimal::from_f64(float)
    {
        return Some(id.cmp(&fd));
    }
    (int as f64).partial_cmp(&float)
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values_follow_jmespath_rules() {
        for v in [json!(null), json!(false), json!(""), json!([]), json!({})] {
            assert!(v.is_false(), "{v} should be false");
        }
        for v in [json!(0), json!(0.0), json!(true), json!(" "), json!([0]), json!({"a": null})] {
            assert!(!v.is_false(), "{v} should be true");
        }
    }

    #[test]
    fn equality_across_document_types() {
        let doc = json!({"a": [1, 2.5, "x"], "b": {"c": null}});
        let owned = Value::from(doc.clone());
        assert!(json_equal(&doc, &owned));
        assert!(!json_equal(&doc, &Value::Null));
        assert!(json_equal(&json!(1), &json!(1.0)));
    }

    #[test]
    fn mixed_number_comparison() {
        assert_eq!(compare_numbers(&json!(2), &json!(2.5)), Some(Ordering::Less));
        assert_eq!(compare_numbers(&json!(3.5), &json!(3)), Some(Ordering::Greater));
        assert_eq!(compare_numbers(&json!("3"), &json!(3)), None);
    }

    #[test]
    fn conversion_keeps_integers() {
        let owned = Value::from(json!({"n": 7, "f": 1.5}));
        assert_eq!(owned.get_member("n"), Some(&Value::Integer(7)));
        assert_eq!(owned.get_member("f"), Some(&Value::Float(1.5)));
        assert_eq!(serde_json::Value::from(owned), json!({"n": 7, "f": 1.5}));
    }
}
