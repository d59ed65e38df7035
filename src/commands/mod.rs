//! Typed command surface
//!
//! Each command is a thin marshal-call-decode shim over the executor. The
//! commands are grouped by data type, one file per group.

mod string;
mod set;
mod sorted_set;
mod stream;
mod server;

pub use stream::XPendingRange;

use crate::bridge::CommandExecutor;
use crate::cluster::key_slot;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::sync::Arc;

/// Client over a [`CommandExecutor`]
///
/// Cheap to clone; clones share the executor and may be used from any task.
#[derive(Debug, Clone)]
pub struct Client {
    executor: Arc<CommandExecutor>,
}

impl Client {
    pub fn new(executor: CommandExecutor) -> Self {
        Client {
            executor: Arc::new(executor),
        }
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Close the underlying executor, failing in-flight commands
    pub fn close(&self, reason: &str) {
        self.executor.close(reason);
    }

    /// Multi-key commands require every key in one slot when clustered
    fn ensure_same_slot(&self, keys: &[Bytes]) -> Result<()> {
        if !self.executor.is_cluster() {
            return Ok(());
        }

        let mut slots = keys.iter().map(|k| key_slot(k));
        if let Some(first) = slots.next() {
            if slots.any(|slot| slot != first) {
                return Err(Error::CrossSlot);
            }
        }
        Ok(())
    }
}

/// Copy caller-owned keys or values into request arguments
pub(crate) fn to_args<I, B>(items: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    items
        .into_iter()
        .map(|item| Bytes::copy_from_slice(item.as_ref()))
        .collect()
}

pub(crate) fn arg(item: impl AsRef<[u8]>) -> Bytes {
    Bytes::copy_from_slice(item.as_ref())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Small in-memory server answering through the threaded engine

    use super::Client;
    use crate::bridge::CommandExecutor;
    use crate::cluster::{ClusterTopology, SharedTopology};
    use crate::config::ExecutorConfig;
    use crate::engine::{EngineReply, Responder, ThreadedEngine};
    use crate::protocol::{CommandRequest, RawResponse, RequestType};
    use std::collections::{BTreeSet, HashMap};

    #[derive(Default)]
    pub(crate) struct FakeServer {
        strings: HashMap<String, String>,
        sets: HashMap<String, BTreeSet<String>>,
        zsets: HashMap<String, HashMap<String, f64>>,
    }

    fn bulk_set(members: impl IntoIterator<Item = String>) -> RawResponse {
        RawResponse::Set(members.into_iter().map(RawResponse::bulk_string).collect())
    }

    impl FakeServer {
        fn arg(request: &CommandRequest, index: usize) -> String {
            request.arg_str(index).unwrap_or_default().to_string()
        }

        fn intersection(&self, keys: &[String]) -> BTreeSet<String> {
            let mut sets = keys.iter().map(|k| self.sets.get(k).cloned().unwrap_or_default());
            let first = sets.next().unwrap_or_default();
            sets.fold(first, |acc, set| acc.intersection(&set).cloned().collect())
        }

        /// Remove up to `count` lowest scored members of `key`
        fn pop_min(&mut self, key: &str, count: usize) -> Vec<(String, f64)> {
            let zset = match self.zsets.get_mut(key) {
                Some(zset) => zset,
                None => return Vec::new(),
            };
            let mut members: Vec<(String, f64)> = zset.iter().map(|(m, s)| (m.clone(), *s)).collect();
            members.sort_by(|a, b| a.1.total_cmp(&b.1));
            members.truncate(count);
            for (member, _) in &members {
                zset.remove(member);
            }
            members
        }

        pub(crate) fn respond(&mut self, request: &CommandRequest) -> EngineReply {
            let args: Vec<String> = (0..request.args.len()).map(|i| Self::arg(request, i)).collect();
            let raw = match request.request_type {
                RequestType::Set => {
                    self.strings.insert(args[0].clone(), args[1].clone());
                    RawResponse::Okay
                }
                RequestType::Get => match self.strings.get(&args[0]) {
                    Some(value) => RawResponse::bulk_string(value.clone()),
                    None => RawResponse::Nil,
                },
                RequestType::SAdd => {
                    let set = self.sets.entry(args[0].clone()).or_default();
                    let added = args[1..].iter().filter(|m| set.insert((*m).clone())).count();
                    RawResponse::Int(added as i64)
                }
                RequestType::SRem => {
                    let removed = match self.sets.get_mut(&args[0]) {
                        Some(set) => args[1..].iter().filter(|m| set.remove(*m)).count(),
                        None => 0,
                    };
                    RawResponse::Int(removed as i64)
                }
                RequestType::SMembers => {
                    bulk_set(self.sets.get(&args[0]).cloned().unwrap_or_default())
                }
                RequestType::SCard => {
                    RawResponse::Int(self.sets.get(&args[0]).map_or(0, |s| s.len()) as i64)
                }
                RequestType::SIsMember => RawResponse::Bool(
                    self.sets.get(&args[0]).map_or(false, |s| s.contains(&args[1])),
                ),
                RequestType::SMIsMember => RawResponse::Array(
                    args[1..]
                        .iter()
                        .map(|m| RawResponse::Int(self.sets.get(&args[0]).map_or(0, |s| s.contains(m) as i64)))
                        .collect(),
                ),
                RequestType::SInter => bulk_set(self.intersection(&args)),
                RequestType::SInterCard => {
                    let numkeys: usize = args[0].parse().unwrap_or(0);
                    let keys = &args[1..1 + numkeys];
                    let limit = match args.get(1 + numkeys).map(String::as_str) {
                        Some("LIMIT") => args[2 + numkeys].parse().unwrap_or(0),
                        _ => 0,
                    };
                    let count = self.intersection(keys).len();
                    let count = if limit > 0 { count.min(limit) } else { count };
                    RawResponse::Int(count as i64)
                }
                RequestType::SMove => {
                    let moved = self.sets.get_mut(&args[0]).map_or(false, |s| s.remove(&args[2]));
                    if moved {
                        self.sets.entry(args[1].clone()).or_default().insert(args[2].clone());
                    }
                    RawResponse::Bool(moved)
                }
                RequestType::Ping => match &request.route {
                    Some(descriptor) if descriptor.route.is_fan_out() => RawResponse::Map(
                        descriptor
                            .destinations
                            .iter()
                            .map(|node| (RawResponse::bulk_string(node.to_string()), RawResponse::simple_string("PONG")))
                            .collect(),
                    ),
                    _ => match args.first() {
                        Some(message) => RawResponse::bulk_string(message.clone()),
                        None => RawResponse::simple_string("PONG"),
                    },
                },
                RequestType::Echo => RawResponse::bulk_string(args[0].clone()),
                RequestType::ZAdd => {
                    let zset = self.zsets.entry(args[0].clone()).or_default();
                    let added = args[1..]
                        .chunks(2)
                        .filter(|pair| zset.insert(pair[1].clone(), pair[0].parse().unwrap_or(0.0)).is_none())
                        .count();
                    RawResponse::Int(added as i64)
                }
                RequestType::ZScore => match self.zsets.get(&args[0]).and_then(|z| z.get(&args[1])) {
                    Some(score) => RawResponse::Double(*score),
                    None => RawResponse::Nil,
                },
                RequestType::ZPopMin => {
                    let count = args.get(1).and_then(|c| c.parse().ok()).unwrap_or(1);
                    RawResponse::Map(
                        self.pop_min(&args[0], count)
                            .into_iter()
                            .map(|(member, score)| (RawResponse::bulk_string(member), RawResponse::Double(score)))
                            .collect(),
                    )
                }
                RequestType::BZPopMin => {
                    let keys = &args[..args.len() - 1];
                    let popped = keys
                        .iter()
                        .find_map(|key| self.pop_min(key, 1).pop().map(|entry| (key.clone(), entry)));
                    match popped {
                        Some((key, (member, score))) => RawResponse::Array(vec![
                            RawResponse::bulk_string(key),
                            RawResponse::bulk_string(member),
                            RawResponse::Double(score),
                        ]),
                        None => RawResponse::Nil,
                    }
                }
                other => {
                    return EngineReply::failure(
                        crate::error::RequestErrorKind::Unspecified,
                        format!("ERR unknown command '{}'", other),
                    )
                }
            };
            EngineReply::Success(raw)
        }
    }

    /// Client over a threaded engine answering with `responder`
    pub(crate) fn scripted_client<R: Responder>(topology: ClusterTopology, responder: R) -> Client {
        let executor = CommandExecutor::connect(ExecutorConfig::default(), |sink| {
            ThreadedEngine::spawn(sink, SharedTopology::new(topology), responder)
        })
        .unwrap();
        Client::new(executor)
    }

    /// Client over a threaded engine backed by a fresh [`FakeServer`]
    pub(crate) fn fake_client(topology: ClusterTopology) -> Client {
        let mut server = FakeServer::default();
        scripted_client(topology, move |request: &CommandRequest| server.respond(request))
    }
}
