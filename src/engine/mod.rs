//! Native engine boundary
//!
//! The engine does the actual networking and cluster work. From the client
//! core it is a black box: it accepts submissions and later reports each one
//! through the [`CompletionSink`](crate::bridge::CompletionSink) it was
//! built with, on threads it owns.

mod threaded;

pub use threaded::{EngineReply, Responder, ThreadedEngine};

use crate::bridge::CorrelationHandle;
use crate::cluster::ClusterTopology;
use crate::protocol::CommandRequest;
use std::sync::Arc;

/// Contract every engine implements
pub trait NativeEngine: Send + Sync + 'static {
    /// Queue a request; must not block on its completion
    ///
    /// `request` is only borrowed for the call. The engine copies what it
    /// keeps and later completes `handle` exactly once.
    fn submit(&self, handle: CorrelationHandle, request: &CommandRequest);

    /// Current view of the cluster layout, empty when standalone or unknown
    fn topology(&self) -> Arc<ClusterTopology>;

    /// Stop accepting work; queued requests are still completed
    fn close(&self) {}
}
