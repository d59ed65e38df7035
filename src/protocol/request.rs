//! Request opcodes and the submission passed across the engine boundary

use crate::cluster::{NodeAddress, Route};
use bytes::Bytes;
use std::fmt;

/// Enumerated command opcode understood by the engine
///
/// The numeric values are part of the boundary contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestType {
    InvalidRequest = 0,
    CustomCommand = 1,
    Get = 2,
    Set = 3,
    Ping = 4,
    Info = 5,
    SAdd = 51,
    SRem = 52,
    SMembers = 53,
    SCard = 54,
    ZAdd = 61,
    ZScore = 67,
    Echo = 70,
    ZPopMin = 71,
    SIsMember = 83,
    SInter = 94,
    SInterCard = 95,
    SMIsMember = 96,
    SPop = 97,
    SRandMember = 98,
    SMove = 99,
    BZPopMin = 100,
    XPending = 101,
}

impl RequestType {
    /// Command name as sent on the wire
    pub fn command_name(&self) -> &'static str {
        match self {
            RequestType::InvalidRequest => "INVALID",
            RequestType::CustomCommand => "CUSTOM",
            RequestType::Get => "GET",
            RequestType::Set => "SET",
            RequestType::Ping => "PING",
            RequestType::Info => "INFO",
            RequestType::SAdd => "SADD",
            RequestType::SRem => "SREM",
            RequestType::SMembers => "SMEMBERS",
            RequestType::SCard => "SCARD",
            RequestType::ZAdd => "ZADD",
            RequestType::ZScore => "ZSCORE",
            RequestType::Echo => "ECHO",
            RequestType::ZPopMin => "ZPOPMIN",
            RequestType::SIsMember => "SISMEMBER",
            RequestType::SInter => "SINTER",
            RequestType::SInterCard => "SINTERCARD",
            RequestType::SMIsMember => "SMISMEMBER",
            RequestType::SPop => "SPOP",
            RequestType::SRandMember => "SRANDMEMBER",
            RequestType::SMove => "SMOVE",
            RequestType::BZPopMin => "BZPOPMIN",
            RequestType::XPending => "XPENDING",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// Route plus the destinations the selector resolved it to
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDescriptor {
    /// Logical routing intent
    pub route: Route,

    /// Concrete nodes, empty when the topology is unknown and the engine decides
    pub destinations: Vec<NodeAddress>,
}

/// A command submitted to the engine
///
/// The engine borrows it for the duration of `submit` only and must copy
/// anything it needs afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// Opcode
    pub request_type: RequestType,

    /// Arguments, excluding the command name
    pub args: Vec<Bytes>,

    /// Optional explicit route
    pub route: Option<RouteDescriptor>,
}

impl CommandRequest {
    /// Create a request without a route
    pub fn new(request_type: RequestType, args: Vec<Bytes>) -> Self {
        CommandRequest {
            request_type,
            args,
            route: None,
        }
    }

    /// Argument at `index` as UTF-8, if present and valid
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(|a| std::str::from_utf8(a).ok())
    }
}
