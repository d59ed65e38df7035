//! Logger initialization
//!
//! The crate only emits `tracing` events. Installing a subscriber is left to
//! the embedding process; `init` is a convenience for binaries and tests.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Off => LevelFilter::OFF,
        }
    }

    fn from_filter(filter: LevelFilter) -> Self {
        [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
        .into_iter()
        .find(|level| level.to_filter() == filter)
        .unwrap_or(LogLevel::Off)
    }
}

/// Most verbose level `filter` lets through, `requested` when unknown
fn effective_level(filter: &EnvFilter, requested: LogLevel) -> LogLevel {
    filter
        .max_level_hint()
        .map(LogLevel::from_filter)
        .unwrap_or(requested)
}

static ACTIVE: OnceCell<LogLevel> = OnceCell::new();

/// Install a `fmt` subscriber once per process
///
/// `RUST_LOG` directives take precedence over `level` (default `Warn`).
/// Returns the most verbose level the installed filter enables. Later calls
/// do nothing and return the level computed by the first call.
pub fn init(level: Option<LogLevel>) -> LogLevel {
    *ACTIVE.get_or_init(|| {
        let level = level.unwrap_or(LogLevel::Warn);
        let filter = EnvFilter::builder()
            .with_default_directive(level.to_filter().into())
            .from_env_lossy();
        let effective = effective_level(&filter, level);

        // Another subscriber may already be installed by the host process
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        effective
    })
}
