//! Correlation bridge
//!
//! Turns the engine's fire-and-forget submission plus a later completion
//! callback into an awaitable result. Each submission gets a handle; the
//! engine reports back through a [`CompletionSink`] naming that handle.

mod table;
mod executor;

pub use executor::CommandExecutor;
pub use table::UnknownHandle;

pub(crate) use table::{Completion, CorrelationTable, Delivery};

use crate::error::{Error, RequestErrorKind};
use crate::protocol::RawResponse;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Opaque, pointer-sized token naming one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationHandle(usize);

impl CorrelationHandle {
    /// Rebuild a handle from the value carried across the boundary
    pub fn from_raw(raw: usize) -> Self {
        CorrelationHandle(raw)
    }

    pub fn into_raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for CorrelationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Completion entry points handed to the engine
///
/// May be cloned freely and called from any thread. Each handle must be
/// completed exactly once; completing an unknown handle is a breach of the
/// boundary contract and panics.
#[derive(Clone)]
pub struct CompletionSink {
    table: Arc<CorrelationTable>,
}

impl CompletionSink {
    pub(crate) fn new(table: Arc<CorrelationTable>) -> Self {
        CompletionSink { table }
    }

    /// Successful completion carrying the raw response
    pub fn success(&self, handle: CorrelationHandle, response: RawResponse) {
        self.deliver(handle, Ok(response));
    }

    /// Failed completion with the engine's message and category
    pub fn failure(&self, handle: CorrelationHandle, message: impl Into<String>, kind: RequestErrorKind) {
        self.deliver(
            handle,
            Err(Error::Request {
                kind,
                message: message.into(),
            }),
        );
    }

    fn deliver(&self, handle: CorrelationHandle, completion: Completion) {
        match self.table.complete(handle, completion) {
            Ok(Delivery::Delivered) => debug!(handle = %handle, "Completion delivered"),
            Ok(Delivery::ReceiverGone) => {
                debug!(handle = %handle, "Caller stopped waiting, completion discarded")
            }
            Ok(Delivery::Orphaned) => {
                warn!(handle = %handle, "Late completion for an abandoned request discarded")
            }
            Err(violation) => {
                error!(handle = %handle, "Protocol violation: {}", violation);
                panic!("{}", violation);
            }
        }
    }
}

impl fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSink")
            .field("in_flight", &self.table.len())
            .finish()
    }
}
