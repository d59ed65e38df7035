//! Route resolution
//!
//! Maps a logical route onto concrete destinations using the standard
//! 16384-slot hashing scheme (CRC16/XMODEM of the key or of its hash tag).

use super::route::{Route, SlotScope};
use super::topology::{ClusterNode, ClusterTopology, NodeAddress};
use rand::seq::IteratorRandom;
use std::collections::BTreeSet;

/// Number of hash slots in a cluster
pub const SLOT_COUNT: u16 = 16384;

/// CRC16/XMODEM (polynomial 0x1021, initial value 0)
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Part of the key that is hashed
///
/// If the key holds a `{...}` section with at least one byte between the
/// first `{` and the next `}`, only that section is hashed.
fn hash_tag(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|&b| b == b'{') {
        if let Some(len) = key[open + 1..].iter().position(|&b| b == b'}') {
            if len > 0 {
                return &key[open + 1..open + 1 + len];
            }
        }
    }
    key
}

/// Hash slot of a key
///
/// Multi-key commands require every key to map to the same slot. Callers
/// check that before routing; the selector does not.
pub fn key_slot(key: &[u8]) -> u16 {
    crc16(hash_tag(key)) % SLOT_COUNT
}

/// Resolves routes against a topology snapshot
#[derive(Debug, Clone, Default)]
pub struct RouteSelector;

impl RouteSelector {
    pub fn new() -> Self {
        RouteSelector
    }

    /// Destinations of `route` in `topology`
    ///
    /// Returns an empty set when nothing in the snapshot serves the route.
    /// `ByAddress` resolves to its address even if the snapshot lacks it.
    pub fn resolve(&self, route: &Route, topology: &ClusterTopology) -> BTreeSet<NodeAddress> {
        match route {
            Route::AllNodes => topology.nodes.iter().map(|n| n.address.clone()).collect(),
            Route::AllPrimaries => topology.primaries().map(|n| n.address.clone()).collect(),
            Route::Random => topology
                .nodes
                .iter()
                .choose(&mut rand::thread_rng())
                .map(|n| n.address.clone())
                .into_iter()
                .collect(),
            Route::SlotId(slot, scope) => self.resolve_slot(*slot, *scope, topology),
            Route::SlotKey(key, scope) => self.resolve_slot(key_slot(key), *scope, topology),
            Route::ByAddress { host, port } => {
                BTreeSet::from([NodeAddress::new(host.clone(), *port)])
            }
        }
    }

    fn resolve_slot(&self, slot: u16, scope: SlotScope, topology: &ClusterTopology) -> BTreeSet<NodeAddress> {
        if slot >= SLOT_COUNT {
            return BTreeSet::new();
        }

        let primary = || {
            topology
                .primaries()
                .find(|n| n.serves(slot))
                .map(|n| n.address.clone())
        };

        let chosen = match scope {
            SlotScope::Primary => primary(),
            SlotScope::Replica => topology
                .replicas()
                .filter(|n| n.serves(slot))
                .choose(&mut rand::thread_rng())
                .map(|n: &ClusterNode| n.address.clone())
                .or_else(primary),
        };

        chosen.into_iter().collect()
    }
}
