//! Prometheus view of published generations
//!
//! Each successful cycle is replayed into the registry. Gauges are
//! overwritten, but every rate sample present in the generation is observed
//! again on every cycle, so the histograms keep growing for as long as the
//! process runs. That is deliberate: each cycle's samples are treated as new
//! data points in a running distribution.

use log::debug;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::collector::GenerationSink;
use crate::error::{ExporterError, Result};
use crate::table::Generation;

/// Rate histogram layout: 40 buckets of width 10 starting at 0
const RATE_BUCKET_START: f64 = 0.0;
const RATE_BUCKET_WIDTH: f64 = 10.0;
const RATE_BUCKET_COUNT: usize = 40;

/// Registry plus the metric families the exporter maintains
pub struct MetricsSink {
    registry: Registry,
    entries: GaugeVec,
    tcp_conn_rate: HistogramVec,
    http_req_rate: HistogramVec,
    parse_errors: IntCounterVec,
    cycles: IntCounterVec,
}

impl MetricsSink {
    /// Create and register every metric family under `namespace`/`subsystem`
    pub fn new(namespace: &str, subsystem: &str) -> Result<Self> {
        let registry = Registry::new();
        let buckets = prometheus::linear_buckets(RATE_BUCKET_START, RATE_BUCKET_WIDTH, RATE_BUCKET_COUNT)?;

        let entries = GaugeVec::new(
            Opts::new("sticktable_curr_entries", "Number of entries in the stick-table.")
                .namespace(namespace)
                .subsystem(subsystem),
            &["table"],
        )?;

        let tcp_conn_rate = HistogramVec::new(
            HistogramOpts::new("sticktable_tcp_conn_rate", "TCP connection rates.")
                .namespace(namespace)
                .subsystem(subsystem)
                .buckets(buckets.clone()),
            &["table", "interval"],
        )?;

        let http_req_rate = HistogramVec::new(
            HistogramOpts::new("sticktable_http_req_rate", "HTTP request rates.")
                .namespace(namespace)
                .subsystem(subsystem)
                .buckets(buckets),
            &["table", "interval"],
        )?;

        let parse_errors = IntCounterVec::new(
            Opts::new(
                "sticktable_parse_errors_total",
                "Values that could not be parsed from stick-table dumps.",
            )
            .namespace(namespace)
            .subsystem(subsystem),
            &["table", "kind"],
        )?;

        let cycles = IntCounterVec::new(
            Opts::new("collection_cycles_total", "Collection cycles by outcome.")
                .namespace(namespace)
                .subsystem(subsystem),
            &["outcome"],
        )?;

        registry.register(Box::new(entries.clone()))?;
        registry.register(Box::new(tcp_conn_rate.clone()))?;
        registry.register(Box::new(http_req_rate.clone()))?;
        registry.register(Box::new(parse_errors.clone()))?;
        registry.register(Box::new(cycles.clone()))?;

        Ok(Self {
            registry,
            entries,
            tcp_conn_rate,
            http_req_rate,
            parse_errors,
            cycles,
        })
    }

    /// Encode the registry in the Prometheus text format
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    /// Content type of [`MetricsSink::render`] output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl GenerationSink for MetricsSink {
    fn record(&self, generation: &Generation) {
        for table in &generation.tables {
            let name = table.name.as_str();

            self.entries
                .with_label_values(&[name])
                .set(table.entry_count as f64);

            // Only touch a histogram series when there is something to observe
            if !table.conn_rate_samples.is_empty() {
                let histogram = self
                    .tcp_conn_rate
                    .with_label_values(&[name, table.conn_rate_interval.as_str()]);
                for &sample in &table.conn_rate_samples {
                    histogram.observe(sample);
                }
            }

            if !table.http_request_rate_samples.is_empty() {
                let histogram = self
                    .http_req_rate
                    .with_label_values(&[name, table.http_request_rate_interval.as_str()]);
                for &sample in &table.http_request_rate_samples {
                    histogram.observe(sample);
                }
            }

            for issue in &table.issues {
                self.parse_errors
                    .with_label_values(&[name, issue.kind()])
                    .inc();
            }
        }

        self.cycles.with_label_values(&["success"]).inc();
        debug!("Recorded generation of {} tables", generation.len());
    }

    fn record_failure(&self, error: &ExporterError) {
        self.cycles.with_label_values(&["failure"]).inc();
        debug!("Recorded failed cycle: {}", error);
    }
}
