//! Core collector traits
use crate::error::{ExporterError, Result};
use crate::table::Generation;

/// A collector that produces one complete generation per call
#[async_trait::async_trait]
pub trait PeriodicCollector: Send + Sync + 'static {
    /// Run one full collection cycle.
    ///
    /// An `Err` means the cycle produced nothing; callers must keep whatever
    /// they published before.
    async fn collect(&self) -> Result<Generation>;

    /// Get the collector name
    fn name(&self) -> &str;
}

/// Consumer of published generations
pub trait GenerationSink: Send + Sync + 'static {
    /// Replay a freshly published generation
    fn record(&self, generation: &Generation);

    /// Note a discarded cycle
    fn record_failure(&self, _error: &ExporterError) {}
}
