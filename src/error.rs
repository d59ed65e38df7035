//! Error types
//!
//! Transport failures reported by the engine, local deadlines and decode
//! failures are kept apart so callers can tell them apart. A nil answer
//! is never an error: it is an absent [`Reply`](crate::Reply).

use std::fmt;
use std::time::Duration;

/// Failure category reported by the engine alongside a failure completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestErrorKind {
    /// Anything the engine does not classify further
    Unspecified = 0,

    /// A transaction was aborted by the server
    ExecAbort = 1,

    /// The engine gave up waiting for the server
    Timeout = 2,

    /// The connection to the node was lost
    Disconnect = 3,
}

impl RequestErrorKind {
    /// Map the raw boundary value, unknown values collapse to `Unspecified`
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => RequestErrorKind::ExecAbort,
            2 => RequestErrorKind::Timeout,
            3 => RequestErrorKind::Disconnect,
            _ => RequestErrorKind::Unspecified,
        }
    }
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestErrorKind::Unspecified => "request error",
            RequestErrorKind::ExecAbort => "exec aborted",
            RequestErrorKind::Timeout => "timeout",
            RequestErrorKind::Disconnect => "disconnected",
        };
        f.write_str(name)
    }
}

/// Raised when a raw response does not have the shape a decoder expects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected response shape: expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("invalid UTF-8 in response")]
    InvalidUtf8,
}

impl DecodeError {
    pub(crate) fn shape(expected: &'static str, found: &'static str) -> Self {
        DecodeError::UnexpectedShape { expected, found }
    }
}

/// Errors surfaced to callers of the executor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The engine completed the request with a failure
    #[error("{kind}: {message}")]
    Request {
        kind: RequestErrorKind,
        message: String,
    },

    /// The configured deadline elapsed before the engine answered
    #[error("request did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    /// The engine answered with a payload of the wrong shape
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The executor was closed before or while the request was in flight
    #[error("client is closing: {0}")]
    Closing(String),

    /// No node in the current topology serves the requested route
    #[error("no node serves route {0}")]
    Unroutable(String),

    /// A multi-key command was rejected locally, its keys span several slots
    #[error("CROSSSLOT keys in request don't hash to the same slot")]
    CrossSlot,
}

impl Error {
    /// The failure category, if this error came from the engine
    pub fn kind(&self) -> Option<RequestErrorKind> {
        match self {
            Error::Request { kind, .. } => Some(*kind),
            Error::DeadlineExceeded(_) => Some(RequestErrorKind::Timeout),
            _ => None,
        }
    }

    /// True for transport or engine failures, false for decode and local
    /// validation errors
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Request { .. } | Error::DeadlineExceeded(_) | Error::Closing(_)
        )
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
