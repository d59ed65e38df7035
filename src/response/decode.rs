//! Response decoders, one per target shape
//!
//! A top-level shape mismatch is a [`DecodeError`]. A nil marker is an absent
//! [`Reply`] holding the shape's zero value. An element of a collection that
//! fails its own decode makes the whole collection absent instead of failing
//! the call.

use super::{Reply, Value};
use crate::error::DecodeError;
use crate::protocol::RawResponse;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Key of the sorted set that was popped, the popped member and its score
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyWithMemberAndScore {
    pub key: String,
    pub member: String,
    pub score: f64,
}

impl KeyWithMemberAndScore {
    pub fn new(key: impl Into<String>, member: impl Into<String>, score: f64) -> Self {
        KeyWithMemberAndScore {
            key: key.into(),
            member: member.into(),
            score,
        }
    }
}

/// Debug rendering of a raw payload, Base64 encoded for log lines
pub(crate) fn encode_for_log(raw: &RawResponse) -> String {
    general_purpose::STANDARD.encode(format!("{:?}", raw).as_bytes())
}

pub(crate) fn text(raw: &RawResponse, expected: &'static str) -> Result<String, DecodeError> {
    match raw {
        RawResponse::BulkString(b) => std::str::from_utf8(b)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8),
        RawResponse::SimpleString(s) | RawResponse::VerbatimString(s) => Ok(s.clone()),
        RawResponse::Okay => Ok("OK".to_string()),
        other => Err(DecodeError::shape(expected, other.kind_name())),
    }
}

fn nilable_text(raw: &RawResponse) -> Result<Reply<String>, DecodeError> {
    match raw {
        RawResponse::Nil => Ok(Reply::absent()),
        other => text(other, "string").map(Reply::present),
    }
}

fn integer(raw: &RawResponse) -> Result<i64, DecodeError> {
    match raw {
        RawResponse::Int(i) => Ok(*i),
        other => Err(DecodeError::shape("integer", other.kind_name())),
    }
}

/// Integer, also accepting a decimal string as some replies encode counts that way
pub(crate) fn numeric_integer(raw: &RawResponse) -> Result<i64, DecodeError> {
    match raw {
        RawResponse::Int(i) => Ok(*i),
        RawResponse::BulkString(_) | RawResponse::SimpleString(_) => {
            let s = text(raw, "integer")?;
            s.parse::<i64>().map_err(|_| DecodeError::InvalidNumber(s))
        }
        other => Err(DecodeError::shape("integer", other.kind_name())),
    }
}

fn float(raw: &RawResponse) -> Result<f64, DecodeError> {
    match raw {
        RawResponse::Double(d) => Ok(*d),
        RawResponse::Int(i) => Ok(*i as f64),
        RawResponse::BulkString(_) | RawResponse::SimpleString(_) => {
            let s = text(raw, "float")?;
            s.parse::<f64>().map_err(|_| DecodeError::InvalidNumber(s))
        }
        other => Err(DecodeError::shape("float", other.kind_name())),
    }
}

fn boolean(raw: &RawResponse) -> Result<bool, DecodeError> {
    match raw {
        RawResponse::Bool(b) => Ok(*b),
        RawResponse::Int(0) => Ok(false),
        RawResponse::Int(1) => Ok(true),
        RawResponse::Int(i) => Err(DecodeError::InvalidNumber(i.to_string())),
        other => Err(DecodeError::shape("boolean", other.kind_name())),
    }
}

fn elements(raw: &RawResponse) -> Option<&[RawResponse]> {
    match raw {
        RawResponse::Array(items) | RawResponse::Set(items) => Some(items),
        _ => None,
    }
}

/// Key/value pairs of a RESP3 map or a flat RESP2 array of even length
fn pairs(raw: &RawResponse) -> Option<Vec<(&RawResponse, &RawResponse)>> {
    match raw {
        RawResponse::Map(entries) => Some(entries.iter().map(|(k, v)| (k, v)).collect()),
        RawResponse::Array(items) if items.len() % 2 == 0 => {
            Some(items.chunks(2).map(|pair| (&pair[0], &pair[1])).collect())
        }
        _ => None,
    }
}

/// Decode every element, or return `None` at the first element that fails
pub(crate) fn collect_soft<'a, I, T, F>(items: I, context: &'static str, mut element: F) -> Option<Vec<T>>
where
    I: IntoIterator<Item = &'a RawResponse>,
    F: FnMut(&'a RawResponse) -> Result<T, DecodeError>,
{
    let mut out = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match element(item) {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!(
                    context = context,
                    index = index,
                    error = %e,
                    "Dropping undecodable collection element (B64): {}",
                    encode_for_log(item)
                );
                return None;
            }
        }
    }
    Some(out)
}

fn soft<T: Default>(decoded: Option<T>) -> Reply<T> {
    decoded.map(Reply::present).unwrap_or_else(Reply::absent)
}

/// String-like reply
pub fn decode_string(raw: RawResponse) -> Result<Reply<String>, DecodeError> {
    nilable_text(&raw)
}

/// Binary-safe string reply
pub fn decode_bytes(raw: RawResponse) -> Result<Reply<Bytes>, DecodeError> {
    match raw {
        RawResponse::Nil => Ok(Reply::absent()),
        RawResponse::BulkString(b) => Ok(Reply::present(b)),
        RawResponse::SimpleString(s) | RawResponse::VerbatimString(s) => {
            Ok(Reply::present(Bytes::from(s)))
        }
        RawResponse::Okay => Ok(Reply::present(Bytes::from_static(b"OK"))),
        other => Err(DecodeError::shape("bytes", other.kind_name())),
    }
}

/// Integer reply
pub fn decode_int(raw: RawResponse) -> Result<Reply<i64>, DecodeError> {
    match raw {
        RawResponse::Nil => Ok(Reply::absent()),
        other => integer(&other).map(Reply::present),
    }
}

/// Floating point reply, numeric strings are parsed
pub fn decode_float(raw: RawResponse) -> Result<Reply<f64>, DecodeError> {
    match raw {
        RawResponse::Nil => Ok(Reply::absent()),
        other => float(&other).map(Reply::present),
    }
}

/// Boolean reply, integer 0/1 are accepted
pub fn decode_bool(raw: RawResponse) -> Result<Reply<bool>, DecodeError> {
    match raw {
        RawResponse::Nil => Ok(Reply::absent()),
        other => boolean(&other).map(Reply::present),
    }
}

/// `+OK` status reply
pub fn decode_ok(raw: RawResponse) -> Result<Reply<String>, DecodeError> {
    match raw {
        RawResponse::Okay => Ok(Reply::present("OK".to_string())),
        RawResponse::SimpleString(s) if s.eq_ignore_ascii_case("OK") => Ok(Reply::present(s)),
        RawResponse::Nil => Ok(Reply::absent()),
        other => Err(DecodeError::shape("ok", other.kind_name())),
    }
}

/// Ordered sequence of nilable strings
pub fn decode_string_array(raw: RawResponse) -> Result<Reply<Vec<Reply<String>>>, DecodeError> {
    if raw.is_nil() {
        return Ok(Reply::absent());
    }
    let items = elements(&raw).ok_or_else(|| DecodeError::shape("array", raw.kind_name()))?;
    Ok(soft(collect_soft(items, "string array", nilable_text)))
}

/// Unordered collection of strings
pub fn decode_string_set(raw: RawResponse) -> Result<Reply<HashSet<Reply<String>>>, DecodeError> {
    if raw.is_nil() {
        return Ok(Reply::absent());
    }
    let items = elements(&raw).ok_or_else(|| DecodeError::shape("set", raw.kind_name()))?;
    let members = collect_soft(items, "string set", nilable_text)
        .map(|members| members.into_iter().collect::<HashSet<_>>());
    Ok(soft(members))
}

/// Ordered sequence of booleans
pub fn decode_bool_array(raw: RawResponse) -> Result<Reply<Vec<Reply<bool>>>, DecodeError> {
    if raw.is_nil() {
        return Ok(Reply::absent());
    }
    let items = elements(&raw).ok_or_else(|| DecodeError::shape("array", raw.kind_name()))?;
    let flags = collect_soft(items, "boolean array", |item| match item {
        RawResponse::Nil => Ok(Reply::absent()),
        other => boolean(other).map(Reply::present),
    });
    Ok(soft(flags))
}

/// String to string mapping
pub fn decode_string_map(raw: RawResponse) -> Result<Reply<HashMap<String, String>>, DecodeError> {
    if raw.is_nil() {
        return Ok(Reply::absent());
    }
    let entries = pairs(&raw).ok_or_else(|| DecodeError::shape("map", raw.kind_name()))?;
    let mut decoded = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        match (text(key, "string"), text(value, "string")) {
            (Ok(k), Ok(v)) => {
                decoded.insert(k, v);
            }
            _ => {
                warn!("Dropping undecodable map entry (B64): {}", encode_for_log(key));
                return Ok(Reply::absent());
            }
        }
    }
    Ok(Reply::present(decoded))
}

/// Member to score mapping, as returned by ZPOPMIN/ZPOPMAX
pub fn decode_member_scores(raw: RawResponse) -> Result<Reply<HashMap<String, f64>>, DecodeError> {
    if raw.is_nil() {
        return Ok(Reply::absent());
    }
    let entries = pairs(&raw).ok_or_else(|| DecodeError::shape("map", raw.kind_name()))?;
    let mut decoded = HashMap::with_capacity(entries.len());
    for (member, score) in entries {
        match (text(member, "string"), float(score)) {
            (Ok(m), Ok(s)) => {
                decoded.insert(m, s);
            }
            _ => {
                warn!("Dropping undecodable member score (B64): {}", encode_for_log(member));
                return Ok(Reply::absent());
            }
        }
    }
    Ok(Reply::present(decoded))
}

/// Positional `[key, member, score]` record from BZPOPMIN/BZPOPMAX
pub fn decode_key_with_member_and_score(
    raw: RawResponse,
) -> Result<Reply<KeyWithMemberAndScore>, DecodeError> {
    if raw.is_nil() {
        return Ok(Reply::absent());
    }
    match elements(&raw) {
        Some([key, member, score]) => Ok(Reply::present(KeyWithMemberAndScore {
            key: text(key, "string")?,
            member: text(member, "string")?,
            score: float(score)?,
        })),
        _ => Err(DecodeError::shape("three element array", raw.kind_name())),
    }
}

fn value_of(raw: &RawResponse) -> Value {
    match raw {
        RawResponse::Nil => Value::Nil,
        RawResponse::Okay => Value::Okay,
        RawResponse::Int(i) => Value::Int(*i),
        RawResponse::Double(d) => Value::Float(*d),
        RawResponse::Bool(b) => Value::Bool(*b),
        RawResponse::BulkString(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.clone()),
        },
        RawResponse::SimpleString(s) | RawResponse::VerbatimString(s) => Value::String(s.clone()),
        RawResponse::Array(items) => Value::Array(items.iter().map(value_of).collect()),
        RawResponse::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (value_of(k), value_of(v)))
                .collect(),
        ),
        RawResponse::Set(items) => Value::Set(items.iter().map(value_of).collect()),
    }
}

/// Any shape, for commands whose reply shape is not known statically
pub fn decode_value(raw: RawResponse) -> Result<Reply<Value>, DecodeError> {
    match raw {
        RawResponse::Nil => Ok(Reply::absent()),
        other => Ok(Reply::present(value_of(&other))),
    }
}
