//! FerrumLink - execution core of a clustered key-value client
//!
//! The networking engine is reached only through a fire-and-forget boundary.
//! This crate turns that boundary into awaitable, typed results:
//! - `bridge` correlates submissions with the engine's later completions
//! - `response` decodes raw answers into nilable typed replies
//! - `cluster` picks destination nodes and reconciles per-node answers
//! - `commands` is a typed command surface built on the above

pub mod protocol;
pub mod response;
pub mod cluster;
pub mod bridge;
pub mod engine;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

/// Re-export commonly used types
pub use bridge::{CommandExecutor, CompletionSink, CorrelationHandle};
pub use cluster::{ClusterTopology, ClusterValue, Route};
pub use commands::Client;
pub use config::ExecutorConfig;
pub use engine::NativeEngine;
pub use error::{DecodeError, Error, RequestErrorKind, Result};
pub use protocol::{RawResponse, RequestType};
pub use response::{Reply, Value};
