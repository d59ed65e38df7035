//! Executor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of a [`CommandExecutor`](crate::CommandExecutor)
///
/// Every field has a default, so a partial JSON document is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Local deadline for one request; `None` waits for the engine forever
    pub request_timeout_ms: Option<u64>,

    /// Shards of the correlation table, 0 derives it from the CPU count
    pub correlation_shards: usize,
}

impl ExecutorConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the local deadline, rounded up to whole milliseconds
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.request_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Shard count actually used: a power of two, at least 2
    pub fn shard_amount(&self) -> usize {
        let requested = if self.correlation_shards == 0 {
            num_cpus::get() * 4
        } else {
            self.correlation_shards
        };
        requested.max(2).next_power_of_two()
    }
}
