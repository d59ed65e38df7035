//! Raw response types
//!
//! Defines the payload shapes the engine hands back on a success completion

use bytes::Bytes;
use std::fmt;

/// Raw response produced by the engine
///
/// Owned by the decoder once delivered. Decoders copy out what they keep,
/// nothing holds on to a `RawResponse` after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// No value: missing key, empty pop, null bulk string
    Nil,

    /// Status reply `+OK`
    Okay,

    /// Integer reply
    Int(i64),

    /// RESP3 double
    Double(f64),

    /// RESP3 boolean
    Bool(bool),

    /// Binary-safe string
    BulkString(Bytes),

    /// Status reply other than OK
    SimpleString(String),

    /// RESP3 verbatim string, format prefix already stripped
    VerbatimString(String),

    /// Ordered sequence
    Array(Vec<RawResponse>),

    /// Key/value pairs in wire order
    Map(Vec<(RawResponse, RawResponse)>),

    /// Unordered collection
    Set(Vec<RawResponse>),
}

impl RawResponse {
    /// Create a bulk string from bytes
    pub fn bulk_string(b: impl Into<Bytes>) -> Self {
        RawResponse::BulkString(b.into())
    }

    /// Create a status reply
    pub fn simple_string(s: impl Into<String>) -> Self {
        RawResponse::SimpleString(s.into())
    }

    /// Create an array of bulk strings
    pub fn bulk_array<I, B>(items: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        RawResponse::Array(items.into_iter().map(RawResponse::bulk_string).collect())
    }

    /// Check if this is the nil marker
    pub fn is_nil(&self) -> bool {
        matches!(self, RawResponse::Nil)
    }

    /// Name of the shape, used in decode errors and logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawResponse::Nil => "nil",
            RawResponse::Okay => "ok",
            RawResponse::Int(_) => "integer",
            RawResponse::Double(_) => "double",
            RawResponse::Bool(_) => "boolean",
            RawResponse::BulkString(_) => "bulk string",
            RawResponse::SimpleString(_) => "simple string",
            RawResponse::VerbatimString(_) => "verbatim string",
            RawResponse::Array(_) => "array",
            RawResponse::Map(_) => "map",
            RawResponse::Set(_) => "set",
        }
    }
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawResponse::Nil => write!(f, "Nil"),
            RawResponse::Okay => write!(f, "Okay"),
            RawResponse::Int(i) => write!(f, "Int({})", i),
            RawResponse::Double(d) => write!(f, "Double({})", d),
            RawResponse::Bool(b) => write!(f, "Bool({})", b),
            RawResponse::BulkString(b) => write!(f, "BulkString({} bytes)", b.len()),
            RawResponse::SimpleString(s) => write!(f, "SimpleString({})", s),
            RawResponse::VerbatimString(s) => write!(f, "VerbatimString({} chars)", s.len()),
            RawResponse::Array(arr) => write!(f, "Array({} elements)", arr.len()),
            RawResponse::Map(pairs) => write!(f, "Map({} entries)", pairs.len()),
            RawResponse::Set(items) => write!(f, "Set({} elements)", items.len()),
        }
    }
}
