//! Correlation table
//!
//! Maps each in-flight handle to the single-slot channel of the caller
//! waiting on it. Locking is per shard and never spans an await.

use super::CorrelationHandle;
use crate::error::Error;
use crate::protocol::RawResponse;
use dashmap::DashMap;
use siphasher::sip::SipHasher13;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Outcome delivered to a waiting caller
pub(crate) type Completion = Result<RawResponse, Error>;

enum Slot {
    /// A caller waits on the receiving side
    Waiting(oneshot::Sender<Completion>),

    /// The caller gave up (deadline or close); the engine still owes a completion
    Orphaned,
}

type SlotMap = DashMap<CorrelationHandle, Slot, BuildHasherDefault<SipHasher13>>;

/// What happened to a completion handed to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,

    /// The caller's future was dropped before the completion arrived
    ReceiverGone,

    /// The caller had already been released; the completion is discarded
    Orphaned,
}

/// A completion named a handle the table does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("completion for unknown correlation handle {0}")]
pub struct UnknownHandle(pub CorrelationHandle);

pub(crate) struct CorrelationTable {
    slots: SlotMap,
    next: AtomicUsize,
}

impl CorrelationTable {
    pub(crate) fn new(shard_amount: usize) -> Self {
        CorrelationTable {
            slots: DashMap::with_capacity_and_hasher_and_shard_amount(
                64,
                BuildHasherDefault::<SipHasher13>::default(),
                shard_amount,
            ),
            // 0 is never handed out
            next: AtomicUsize::new(1),
        }
    }

    /// Allocate a handle and the channel its completion will arrive on
    ///
    /// Handles are never reused, so a stray second completion is always
    /// detected instead of reaching another caller.
    pub(crate) fn register(&self) -> (CorrelationHandle, oneshot::Receiver<Completion>) {
        let handle = CorrelationHandle(self.next.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.slots.insert(handle, Slot::Waiting(tx));
        (handle, rx)
    }

    /// Remove the entry for `handle` and signal its caller
    pub(crate) fn complete(
        &self,
        handle: CorrelationHandle,
        completion: Completion,
    ) -> Result<Delivery, UnknownHandle> {
        // The shard lock is released by `remove` before the send
        match self.slots.remove(&handle) {
            Some((_, Slot::Waiting(tx))) => match tx.send(completion) {
                Ok(()) => Ok(Delivery::Delivered),
                Err(_) => Ok(Delivery::ReceiverGone),
            },
            Some((_, Slot::Orphaned)) => Ok(Delivery::Orphaned),
            None => Err(UnknownHandle(handle)),
        }
    }

    /// Release the caller of `handle` without a completion
    ///
    /// Returns false when the completion already claimed the entry; the
    /// caller then receives that completion instead.
    pub(crate) fn abandon(&self, handle: CorrelationHandle) -> bool {
        match self.slots.get_mut(&handle) {
            Some(mut slot) if matches!(*slot, Slot::Waiting(_)) => {
                *slot = Slot::Orphaned;
                true
            }
            _ => false,
        }
    }

    /// Fail every waiting caller, returns how many were signalled
    pub(crate) fn fail_all(&self, error: &Error) -> usize {
        let mut failed = 0;
        for mut slot in self.slots.iter_mut() {
            if let Slot::Waiting(tx) = std::mem::replace(slot.value_mut(), Slot::Orphaned) {
                let _ = tx.send(Err(error.clone()));
                failed += 1;
            }
        }
        failed
    }

    /// Entries still awaiting a completion from the engine, orphaned ones included
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Entries with a caller still waiting
    pub(crate) fn waiting(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Waiting(_)))
            .count()
    }
}
