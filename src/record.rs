// src/record.rs
//! Schema-less dataset rows.
//!
//! A [`Record`] is an insertion-ordered map from field name to a scalar
//! [`Value`]. Datasets define their own field sets; nothing here enforces a
//! schema. Equality between records is per field and ignores field order.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Scalar field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Value {
    /// Convert an arbitrary JSON value. Arrays and objects are kept as their
    /// compact JSON text.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::Text(s),
            nested => Value::Text(nested.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self { Value::Number(n.into()) }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Value::Number(n.into()) }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self { Value::Number(n.into()) }
}

/// Non-finite floats have no JSON representation and become `Null`.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self { Value::Number(n) }
}

/// One row of dataset data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    pub fn new() -> Self { Self(IndexMap::new()) }

    pub fn with_capacity(n: usize) -> Self { Self(IndexMap::with_capacity(n)) }

    /// Build from a JSON object, keeping the object's key order.
    pub fn from_json_object(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect()
    }

    /// Insert or overwrite a field. A new field goes to the end; an existing
    /// one keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> { self.0.get(name) }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> { self.0.get_mut(name) }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Value> { self.0.shift_remove(name) }

    pub fn contains_key(&self, name: &str) -> bool { self.0.contains_key(name) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> Vec<String> { self.0.keys().cloned().collect() }

    /// True when both records agree on every named field. A field missing
    /// from both sides counts as agreement.
    pub fn agrees_on<S: AsRef<str>>(&self, other: &Record, names: &[S]) -> bool {
        names.iter().all(|n| self.get(n.as_ref()) == other.get(n.as_ref()))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_field_order() {
        let a = record! { "a" => 1, "b" => "x" };
        let b = record! { "b" => "x", "a" => 1 };
        assert_eq!(a, b);
        assert_eq!(a.field_names(), vec!["a", "b"]);
        assert_eq!(b.field_names(), vec!["b", "a"]);
    }

    #[test]
    fn json_line_keeps_types_and_order() {
        let r = record! { "site" => "Helena", "aqi" => 42, "ok" => true, "gone" => Value::Null, "pm" => 3.5 };
        let line = serde_json::to_string(&r).unwrap();
        assert_eq!(line, r#"{"site":"Helena","aqi":42,"ok":true,"gone":null,"pm":3.5}"#);

        let back: Record = serde_json::from_str(&line).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.field_names(), r.field_names());
    }

    #[test]
    fn numbers_and_numeric_text_stay_distinct() {
        let text: Record = serde_json::from_str(r#"{"n":"42"}"#).unwrap();
        let num: Record = serde_json::from_str(r#"{"n":42}"#).unwrap();
        assert_ne!(text, num);
        assert_eq!(text.get("n").and_then(Value::as_str), Some("42"));
    }

    #[test]
    fn nested_json_becomes_text() {
        let raw = serde_json::json!({ "geo": { "x": 1 }, "tags": [1, 2] });
        let serde_json::Value::Object(map) = raw else { unreachable!() };
        let r = Record::from_json_object(map);
        assert_eq!(r.get("geo"), Some(&Value::Text(s!(r#"{"x":1}"#))));
        assert_eq!(r.get("tags"), Some(&Value::Text(s!("[1,2]"))));
    }

    #[test]
    fn agrees_on_treats_missing_fields() {
        let a = record! { "k" => 1 };
        let b = record! { "k" => 1, "extra" => 2 };
        assert!(a.agrees_on(&b, &["k"]));
        assert!(a.agrees_on(&b, &["nowhere"]));
        assert!(!a.agrees_on(&b, &["extra"]));
    }

    #[test]
    fn non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
    }
}
