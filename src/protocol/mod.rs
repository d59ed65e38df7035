//! Engine boundary types
//!
//! The raw response model the engine produces and the request it consumes.
//! Nothing here depends on how responses are decoded or routed.

mod types;
mod request;

pub use types::RawResponse;
pub use request::{CommandRequest, RequestType, RouteDescriptor};
