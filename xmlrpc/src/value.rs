//! The XML-RPC value model.
//!
//! # Design
//! `Value` is the single currency between the encoder and the decoder. Only
//! the five shapes the ERP actually exchanges are modelled; everything a
//! caller passes in is coerced into one of them through the `From` impls
//! below, so call sites read like plain Rust literals.

use std::fmt;

/// Any value that can travel inside an XML-RPC document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Double(f64),
    Array(Vec<Value>),
    /// Members in document order. Names may repeat; lookups take the first.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Build a `Struct` from ordered `(name, value)` pairs.
    pub fn structure<K, V, I>(members: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Struct(
            members
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// First member called `name`, if this is a `Struct`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_struct()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// The wire tag of this variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Struct(members) => {
                write!(f, "{{")?;
                for (i, (k, v)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(items: &[T]) -> Self {
        Value::Array(items.iter().cloned().map(Into::into).collect())
    }
}

/// Coerce loosely-typed JSON into a `Value`. Whole numbers become `Int`,
/// other numbers `Double`; booleans and null fall back to their display text.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => match n.as_f64() {
                    Some(f) => Value::Double(f),
                    None => Value::Str(n.to_string()),
                },
            },
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::structure(map),
            other => Value::Str(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_first_occurrence() {
        let v = Value::Struct(vec![
            ("a".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Int(2)),
        ]);
        assert_eq!(v.get("a"), Some(&Value::Int(1)));
        assert_eq!(v.get("b"), None);
        assert_eq!(Value::Int(1).get("a"), None);
    }

    #[test]
    fn native_coercion() {
        assert_eq!(Value::from("x"), Value::Str("x".to_string()));
        assert_eq!(Value::from(7), Value::Int(7));
        assert_eq!(Value::from(2.5), Value::Double(2.5));
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn json_coercion_keeps_key_order() {
        let mut map = serde_json::Map::new();
        map.insert("product_id".to_string(), json!(4));
        map.insert("name".to_string(), json!("[A1] Thing"));
        let v = Value::from(serde_json::Value::Object(map));
        let members = v.as_struct().unwrap();
        assert_eq!(members[0].0, "product_id");
        assert_eq!(members[1].0, "name");
    }

    #[test]
    fn json_fallback_is_display_text() {
        assert_eq!(Value::from(json!(true)), Value::Str("true".to_string()));
        assert_eq!(Value::from(json!(null)), Value::Str("null".to_string()));
        assert_eq!(Value::from(json!(1.5)), Value::Double(1.5));
    }

    #[test]
    fn display_is_readable() {
        let v = Value::structure([("ids", Value::from(vec![1, 2])), ("n", Value::from("x"))]);
        assert_eq!(v.to_string(), r#"{ids: [1, 2], n: "x"}"#);
    }
}
