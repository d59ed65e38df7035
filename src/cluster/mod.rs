//! Cluster routing and result reconciliation
//!
//! A command sent with a route answers either with one node's value or with
//! a map of per-node values. Which one is decided by the route alone, never
//! by looking at the shape of the payload.

mod route;
mod router;
mod topology;

pub use route::{Route, SlotScope};
pub use router::{key_slot, RouteSelector, SLOT_COUNT};
pub use topology::{ClusterNode, ClusterTopology, NodeAddress, NodeRole, SharedTopology, SlotRange};

use crate::error::DecodeError;
use crate::protocol::RawResponse;
use crate::response::Reply;
use std::collections::BTreeMap;
use tracing::warn;

/// Whether a cluster value came from one node or several
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    SingleNode,
    MultiNode,
}

/// Answer to a routed command
///
/// `MultiNode` maps node identity (`host:port` or hostname, as reported by
/// the engine) to that node's reply. A node answering nil keeps its entry,
/// with an absent reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterValue<T> {
    SingleNode(Reply<T>),
    MultiNode(Reply<BTreeMap<String, Reply<T>>>),
}

impl<T> ClusterValue<T> {
    pub fn single(value: T) -> Self {
        ClusterValue::SingleNode(Reply::present(value))
    }

    pub fn multi(values: BTreeMap<String, T>) -> Self {
        ClusterValue::MultiNode(Reply::present(
            values.into_iter().map(|(node, v)| (node, Reply::present(v))).collect(),
        ))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ClusterValue::SingleNode(_) => ValueKind::SingleNode,
            ClusterValue::MultiNode(_) => ValueKind::MultiNode,
        }
    }

    pub fn is_single_value(&self) -> bool {
        self.kind() == ValueKind::SingleNode
    }

    pub fn is_multi_value(&self) -> bool {
        self.kind() == ValueKind::MultiNode
    }

    /// True iff the underlying reply is absent
    ///
    /// A present per-node map whose values are empty collections is not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            ClusterValue::SingleNode(reply) => reply.is_absent(),
            ClusterValue::MultiNode(reply) => reply.is_absent(),
        }
    }

    /// The single node's value, if this is a present single-node answer
    pub fn single_value(&self) -> Option<&T> {
        match self {
            ClusterValue::SingleNode(reply) => reply.as_option(),
            ClusterValue::MultiNode(_) => None,
        }
    }

    /// The per-node map, if this is a present multi-node answer
    pub fn multi_value(&self) -> Option<&BTreeMap<String, Reply<T>>> {
        match self {
            ClusterValue::SingleNode(_) => None,
            ClusterValue::MultiNode(reply) => reply.as_option(),
        }
    }

    /// Reply of `node` in a multi-node answer, absent when the node answered nil
    pub fn node_reply(&self, node: &str) -> Option<&Reply<T>> {
        self.multi_value().and_then(|values| values.get(node))
    }

    /// Value reported by `node`, `None` when missing or nil
    pub fn get(&self, node: &str) -> Option<&T> {
        self.node_reply(node).and_then(Reply::as_option)
    }

    /// Every reply with the node it came from, `None` for a single-node answer
    ///
    /// An absent single-node answer yields nothing. Nil nodes of a multi-node
    /// answer are yielded with their absent reply.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Reply<T>)> + '_> {
        match self {
            ClusterValue::SingleNode(reply) if reply.is_absent() => Box::new(std::iter::empty()),
            ClusterValue::SingleNode(reply) => Box::new(std::iter::once((None, reply))),
            ClusterValue::MultiNode(reply) => Box::new(
                reply
                    .as_option()
                    .into_iter()
                    .flat_map(|values| values.iter().map(|(node, v)| (Some(node.as_str()), v))),
            ),
        }
    }
}

impl<T: Default> ClusterValue<T> {
    /// An absent answer of the given kind
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::SingleNode => ClusterValue::SingleNode(Reply::absent()),
            ValueKind::MultiNode => ClusterValue::MultiNode(Reply::absent()),
        }
    }

    /// Transform every value, absence and kind are preserved
    pub fn map<U: Default, F: FnMut(T) -> U>(self, mut f: F) -> ClusterValue<U> {
        match self {
            ClusterValue::SingleNode(reply) => ClusterValue::SingleNode(reply.map(f)),
            ClusterValue::MultiNode(reply) => ClusterValue::MultiNode(reply.map(|values| {
                values
                    .into_iter()
                    .map(|(node, v)| (node, v.map(&mut f)))
                    .collect()
            })),
        }
    }
}

/// Classify and decode a routed answer
///
/// Single-destination routes always give `SingleNode`, even when the decoded
/// value is itself a map. Fan-out routes always give `MultiNode`, even with a
/// single node in the cluster; the raw answer must then be a map of node
/// identity to per-node payload.
///
/// A node answering nil keeps an absent entry. Only a payload that fails to
/// decode makes the whole per-node map absent.
pub fn reconcile<T, F>(raw: RawResponse, route: &Route, decode: F) -> Result<ClusterValue<T>, DecodeError>
where
    T: Default,
    F: Fn(RawResponse) -> Result<Reply<T>, DecodeError>,
{
    if !route.is_fan_out() {
        return decode(raw).map(ClusterValue::SingleNode);
    }

    let entries = match raw {
        RawResponse::Nil => return Ok(ClusterValue::empty(ValueKind::MultiNode)),
        RawResponse::Map(entries) => entries,
        other => return Err(DecodeError::UnexpectedShape {
            expected: "node map",
            found: other.kind_name(),
        }),
    };

    let mut values = BTreeMap::new();
    for (node, payload) in entries {
        let node = match node {
            RawResponse::BulkString(b) => String::from_utf8(b.to_vec()).map_err(|_| DecodeError::InvalidUtf8)?,
            RawResponse::SimpleString(s) => s,
            other => return Err(DecodeError::UnexpectedShape {
                expected: "node address",
                found: other.kind_name(),
            }),
        };
        match decode(payload) {
            Ok(reply) => {
                values.insert(node, reply);
            }
            Err(e) => {
                warn!(node = %node, error = %e, "Undecodable payload in a multi-node reply");
                return Ok(ClusterValue::empty(ValueKind::MultiNode));
            }
        }
    }

    Ok(ClusterValue::MultiNode(Reply::present(values)))
}
