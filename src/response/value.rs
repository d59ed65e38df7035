//! Dynamically shaped decoded value, used by custom commands

use bytes::Bytes;

/// Owned, decoded form of any raw response
///
/// `Nil` only appears nested inside collections. A nil at the top level
/// decodes to an absent [`Reply`](super::Reply) instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Okay,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Bytes(Bytes),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

impl Value {
    /// Text content of string-like values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Okay => Some("OK"),
            _ => None,
        }
    }

    /// Integer content
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Elements of an array or set
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }
}
