//! Prometheus exporter for HAProxy stick-table statistics
//!
//! A background task polls the stats socket on a fixed delay, parses every
//! stick-table dump into a [`table::Generation`], publishes it atomically and
//! replays it into Prometheus metrics served over HTTP.

pub mod channel;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod storage;
pub mod table;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::channel::{ChannelAddress, ChannelError, ControlChannel, ControlChannelClient};
    pub use crate::collector::{CycleOutcome, GenerationSink, PeriodicCollector, Scheduler, StickTableCollector};
    pub use crate::config::{ExporterConfig, LogLevel};
    pub use crate::error::{ExporterError, Result};
    pub use crate::metrics::MetricsSink;
    pub use crate::server::MetricsServer;
    pub use crate::storage::PublishedState;
    pub use crate::table::{Generation, ParseIssue, TableSnapshot};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
