//! Routing intents

use super::topology::NodeAddress;
use bytes::Bytes;
use std::fmt;

/// Which copy of a slot a slot-based route targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotScope {
    Primary,
    /// A replica of the slot, falling back to the primary when none is known
    Replica,
}

/// Logical description of which node(s) a command targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Every node of the cluster
    AllNodes,

    /// Every primary
    AllPrimaries,

    /// One node picked per call
    Random,

    /// The node owning a slot
    SlotId(u16, SlotScope),

    /// The node owning the slot of a key
    SlotKey(Bytes, SlotScope),

    /// One explicit node
    ByAddress { host: String, port: u16 },
}

impl Route {
    pub fn slot_key(key: impl Into<Bytes>) -> Self {
        Route::SlotKey(key.into(), SlotScope::Primary)
    }

    pub fn by_address(host: impl Into<String>, port: u16) -> Self {
        Route::ByAddress {
            host: host.into(),
            port,
        }
    }

    /// True for routes answered by several nodes, whatever the node count
    pub fn is_fan_out(&self) -> bool {
        matches!(self, Route::AllNodes | Route::AllPrimaries)
    }
}

impl From<NodeAddress> for Route {
    fn from(address: NodeAddress) -> Self {
        Route::ByAddress {
            host: address.host,
            port: address.port,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::AllNodes => write!(f, "AllNodes"),
            Route::AllPrimaries => write!(f, "AllPrimaries"),
            Route::Random => write!(f, "Random"),
            Route::SlotId(slot, scope) => write!(f, "SlotId({}, {:?})", slot, scope),
            Route::SlotKey(key, scope) => {
                write!(f, "SlotKey({}, {:?})", String::from_utf8_lossy(key), scope)
            }
            Route::ByAddress { host, port } => write!(f, "ByAddress({}:{})", host, port),
        }
    }
}
