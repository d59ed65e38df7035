//! Stream consumer-group commands (XPENDING)

use super::{arg, Client};
use crate::error::Result;
use crate::protocol::RequestType;
use crate::response::{decode_pending_details, decode_pending_summary, PendingEntryDetail, PendingEntrySummary, Reply};
use bytes::Bytes;
use std::time::Duration;

/// Range options of the extended XPENDING form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPendingRange {
    /// Lowest id, `-` for the start of the stream
    pub start: String,
    /// Highest id, `+` for the end of the stream
    pub end: String,
    pub count: u64,
    /// Only entries idle for at least this long
    pub min_idle: Option<Duration>,
    /// Only entries owned by this consumer
    pub consumer: Option<String>,
}

impl XPendingRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>, count: u64) -> Self {
        XPendingRange {
            start: start.into(),
            end: end.into(),
            count,
            min_idle: None,
            consumer: None,
        }
    }

    /// Whole stream, at most `count` entries
    pub fn all(count: u64) -> Self {
        Self::new("-", "+", count)
    }

    pub fn with_min_idle(mut self, idle: Duration) -> Self {
        self.min_idle = Some(idle);
        self
    }

    pub fn with_consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = Some(consumer.into());
        self
    }

    fn to_args(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(6);
        if let Some(idle) = self.min_idle {
            args.push(Bytes::from_static(b"IDLE"));
            args.push(Bytes::from(idle.as_millis().to_string()));
        }
        args.push(arg(&self.start));
        args.push(arg(&self.end));
        args.push(Bytes::from(self.count.to_string()));
        if let Some(consumer) = &self.consumer {
            args.push(arg(consumer));
        }
        args
    }
}

impl Client {
    /// XPENDING key group
    pub async fn xpending(&self, key: impl AsRef<[u8]>, group: impl AsRef<[u8]>) -> Result<Reply<PendingEntrySummary>> {
        self.executor
            .execute(RequestType::XPending, vec![arg(key), arg(group)], decode_pending_summary)
            .await
    }

    /// XPENDING key group [IDLE min-idle-time] start end count [consumer]
    pub async fn xpending_range(
        &self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        range: &XPendingRange,
    ) -> Result<Reply<Vec<PendingEntryDetail>>> {
        let mut args = vec![arg(key), arg(group)];
        args.extend(range.to_args());
        self.executor
            .execute(RequestType::XPending, args, decode_pending_details)
            .await
    }
}
