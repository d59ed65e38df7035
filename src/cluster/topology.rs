//! Cluster topology snapshot
//!
//! The engine owns the live topology. The client core only reads snapshots
//! of it, which may lag behind the real cluster.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Network address of one cluster node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        NodeAddress {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("missing port in node address '{}'", s))?;
        if host.is_empty() {
            return Err(format!("missing host in node address '{}'", s));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("invalid port in node address '{}'", s))?;
        Ok(NodeAddress::new(host, port))
    }
}

/// Role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Primary,
    Replica,
}

/// Inclusive range of hash slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange {
    pub start: u16,
    pub end: u16,
}

impl SlotRange {
    pub fn new(start: u16, end: u16) -> Self {
        SlotRange { start, end }
    }

    pub fn contains(&self, slot: u16) -> bool {
        self.start <= slot && slot <= self.end
    }
}

/// One node and the slots it serves
///
/// Replicas list the slots of the primary they follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    pub address: NodeAddress,
    pub role: NodeRole,
    #[serde(default)]
    pub slots: Vec<SlotRange>,
}

impl ClusterNode {
    pub fn primary(address: NodeAddress, slots: Vec<SlotRange>) -> Self {
        ClusterNode {
            address,
            role: NodeRole::Primary,
            slots,
        }
    }

    pub fn replica(address: NodeAddress, slots: Vec<SlotRange>) -> Self {
        ClusterNode {
            address,
            role: NodeRole::Replica,
            slots,
        }
    }

    pub fn serves(&self, slot: u16) -> bool {
        self.slots.iter().any(|range| range.contains(slot))
    }
}

/// Point-in-time view of the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterTopology {
    #[serde(default)]
    pub nodes: Vec<ClusterNode>,
}

impl ClusterTopology {
    pub fn new(nodes: Vec<ClusterNode>) -> Self {
        ClusterTopology { nodes }
    }

    /// Load a topology description from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// True for a standalone deployment or before the engine learned the layout
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn primaries(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().filter(|n| n.role == NodeRole::Primary)
    }

    pub fn replicas(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().filter(|n| n.role == NodeRole::Replica)
    }

    /// Nodes of either role serving `slot`
    pub fn owners_of(&self, slot: u16) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().filter(move |n| n.serves(slot))
    }
}

/// Topology shared between an engine and the executor
///
/// Readers take a cheap `Arc` snapshot and never hold the lock.
#[derive(Debug, Clone, Default)]
pub struct SharedTopology {
    inner: Arc<RwLock<Arc<ClusterTopology>>>,
}

impl SharedTopology {
    pub fn new(topology: ClusterTopology) -> Self {
        SharedTopology {
            inner: Arc::new(RwLock::new(Arc::new(topology))),
        }
    }

    pub fn snapshot(&self) -> Arc<ClusterTopology> {
        self.inner.read().clone()
    }

    pub fn replace(&self, topology: ClusterTopology) {
        *self.inner.write() = Arc::new(topology);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_and_display() {
        let addr: NodeAddress = "10.0.0.1:7000".parse().unwrap();
        assert_eq!(addr, NodeAddress::new("10.0.0.1", 7000));
        assert_eq!(addr.to_string(), "10.0.0.1:7000");

        assert!("10.0.0.1".parse::<NodeAddress>().is_err());
        assert!(":7000".parse::<NodeAddress>().is_err());
        assert!("host:99999".parse::<NodeAddress>().is_err());
    }

    #[test]
    fn test_topology_from_json() {
        let json = r#"{
            "nodes": [
                {"address": {"host": "a", "port": 7000}, "role": "primary",
                 "slots": [{"start": 0, "end": 8191}]},
                {"address": {"host": "b", "port": 7001}, "role": "primary",
                 "slots": [{"start": 8192, "end": 16383}]},
                {"address": {"host": "c", "port": 7002}, "role": "replica",
                 "slots": [{"start": 0, "end": 8191}]}
            ]
        }"#;
        let topology = ClusterTopology::from_json(json).unwrap();
        assert_eq!(topology.primaries().count(), 2);
        assert_eq!(topology.replicas().count(), 1);
        assert_eq!(topology.owners_of(100).count(), 2);
        assert_eq!(topology.owners_of(9000).count(), 1);
    }

    #[test]
    fn test_shared_topology_snapshot_is_stable() {
        let shared = SharedTopology::default();
        let before = shared.snapshot();
        shared.replace(ClusterTopology::new(vec![ClusterNode::primary(
            NodeAddress::new("a", 1),
            vec![SlotRange::new(0, 16383)],
        )]));
        assert!(before.is_empty());
        assert_eq!(shared.snapshot().nodes.len(), 1);
    }
}
