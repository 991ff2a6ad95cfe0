use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::time::{self, Instant};

use super::core::{GenerationSink, PeriodicCollector};
use crate::storage::PublishedState;

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new generation was published
    Published { tables: usize },
    /// The cycle failed; the previous generation stays published
    Failed,
}

/// Runs a collector forever with a fixed delay between cycles.
///
/// The delay starts when a cycle ends, so a slow cycle pushes every later one
/// back instead of being subtracted from the sleep.
pub struct Scheduler<P: PeriodicCollector> {
    collector: P,
    state: Arc<PublishedState>,
    sink: Arc<dyn GenerationSink>,
    interval: Duration,
}

impl<P: PeriodicCollector> Scheduler<P> {
    /// Create a new scheduler
    pub fn new(
        collector: P,
        state: Arc<PublishedState>,
        sink: Arc<dyn GenerationSink>,
        interval: Duration,
    ) -> Self {
        Self {
            collector,
            state,
            sink,
            interval,
        }
    }

    /// Get the delay between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run exactly one cycle and publish its result if it succeeded
    pub async fn tick(&self) -> CycleOutcome {
        let started = Instant::now();

        match self.collector.collect().await {
            Ok(generation) => {
                let generation = self.state.publish(generation);
                self.sink.record(&generation);

                info!(
                    "{}: published {} tables in {:?}",
                    self.collector.name(),
                    generation.len(),
                    started.elapsed()
                );
                CycleOutcome::Published {
                    tables: generation.len(),
                }
            }
            Err(e) => {
                error!(
                    "{}: error collecting metrics, keeping previous data: {}",
                    self.collector.name(),
                    e
                );
                self.sink.record_failure(&e);
                CycleOutcome::Failed
            }
        }
    }

    /// Cycle, sleep, repeat. Never returns.
    pub async fn run(self) {
        info!(
            "Starting {} with a {:?} delay between cycles",
            self.collector.name(),
            self.interval
        );

        loop {
            self.tick().await;
            time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::ScriptedChannel;
    use crate::collector::StickTableCollector;
    use crate::error::{ExporterError, Result};
    use crate::table::Generation;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingSink {
        generations: Mutex<Vec<Generation>>,
        failures: Mutex<usize>,
    }

    impl GenerationSink for RecordingSink {
        fn record(&self, generation: &Generation) {
            self.generations.lock().unwrap().push(generation.clone());
        }

        fn record_failure(&self, _error: &ExporterError) {
            *self.failures.lock().unwrap() += 1;
        }
    }

    const LISTING: &str = "# table: fe_http, type: ip, size:1048576, used:1\n\n";
    const FE_HTTP: &str = "# table: fe_http, type: ip, size:1048576, used:1\n\
        0x564104c72d60: key=192.168.128.1 use=0 exp=8183 gpc0=0 conn_rate(3000)=40 conn_cur=0 http_req_rate(10000)=19\n\n";

    #[tokio::test]
    async fn test_failed_read_keeps_previous_generation() {
        let channel = ScriptedChannel::new(vec![
            Ok(LISTING.to_string()),
            Ok(FE_HTTP.to_string()),
            // Second cycle: listing works, the dump read fails
            Ok(LISTING.to_string()),
            Err(ScriptedChannel::read_error()),
        ]);
        let state = Arc::new(PublishedState::new());
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new(
            StickTableCollector::new(channel),
            Arc::clone(&state),
            sink.clone(),
            Duration::from_secs(5),
        );

        assert_eq!(scheduler.tick().await, CycleOutcome::Published { tables: 1 });
        let first = state.load().unwrap();
        let first_json = serde_json::to_string(&*first).unwrap();

        assert_eq!(scheduler.tick().await, CycleOutcome::Failed);
        let after = state.load().unwrap();

        assert!(Arc::ptr_eq(&first, &after));
        assert_eq!(serde_json::to_string(&*after).unwrap(), first_json);
        assert_eq!(sink.generations.lock().unwrap().len(), 1);
        assert_eq!(*sink.failures.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failure_before_first_success_publishes_nothing() {
        let state = Arc::new(PublishedState::new());
        let scheduler = Scheduler::new(
            StickTableCollector::new(ScriptedChannel::new(Vec::new())),
            Arc::clone(&state),
            Arc::new(RecordingSink::default()),
            Duration::from_secs(5),
        );

        assert_eq!(scheduler.tick().await, CycleOutcome::Failed);
        assert!(state.is_empty());
    }

    struct SlowCollector {
        starts: mpsc::UnboundedSender<Instant>,
        duration: Duration,
    }

    #[async_trait::async_trait]
    impl PeriodicCollector for SlowCollector {
        async fn collect(&self) -> Result<Generation> {
            let _ = self.starts.send(Instant::now());
            time::sleep(self.duration).await;
            Ok(Generation::new(Vec::new()))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_cycles() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(
            SlowCollector {
                starts: tx,
                duration: Duration::from_secs(3),
            },
            Arc::new(PublishedState::new()),
            Arc::new(RecordingSink::default()),
            Duration::from_secs(5),
        );
        tokio::spawn(scheduler.run());

        let mut starts = Vec::new();
        for _ in 0..3 {
            starts.push(rx.recv().await.unwrap());
        }

        // Cycle time plus the full interval, not the interval alone
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_secs(8), "gap was {:?}", gap);
            assert!(gap < Duration::from_millis(8_010), "gap was {:?}", gap);
        }
    }
}
