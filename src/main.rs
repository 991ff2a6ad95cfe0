use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;

use sticktable_exporter::config::{ConfigBuilder, ConfigOverrides, ENV_PREFIX};
use sticktable_exporter::prelude::*;
use sticktable_exporter::{server, util, VERSION};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    name = "sticktable-exporter",
    version,
    about = "Exports HAProxy stick-table statistics to Prometheus"
)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address and port to listen to
    #[arg(long)]
    listen_address: Option<String>,

    /// Stats socket to reach haproxy (path, unix://path or tcp://host:port)
    #[arg(long)]
    socket: Option<String>,

    /// Sleep interval between collections, in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Namespace for prometheus metrics
    #[arg(long)]
    namespace: Option<String>,

    /// Subsystem for prometheus metrics
    #[arg(long)]
    subsystem: Option<String>,

    /// Logging level
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_address: self.listen_address.clone(),
            socket: self.socket.clone(),
            interval: self.interval,
            namespace: self.namespace.clone(),
            subsystem: self.subsystem.clone(),
            log_level: self.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigBuilder::<ExporterConfig>::new()
        .use_defaults()
        .add_optional_file(args.config.clone())
        .add_env(ENV_PREFIX)
        .build()?;
    config.apply_overrides(args.overrides());
    config.validate()?;

    util::logging::init(&config.log_level);
    info!("Starting sticktable-exporter {}", VERSION);

    let address = config.channel_address()?;
    let sink = Arc::new(MetricsSink::new(&config.namespace, &config.subsystem)?);
    let state = Arc::new(PublishedState::new());

    let collector = StickTableCollector::new(ControlChannelClient::new(address));
    let polled = collector.channel().address().to_string();
    let scheduler = Scheduler::new(collector, Arc::clone(&state), sink.clone(), config.interval());
    info!("Polling {} every {:?}", polled, scheduler.interval());
    tokio::spawn(scheduler.run());

    let listener = server::bind(&config.listen_address()).await?;
    let metrics_server = Arc::new(MetricsServer::new(sink, state));

    tokio::select! {
        result = metrics_server.serve(listener) => result?,
        _ = tokio::signal::ctrl_c() => info!("Received interrupt, shutting down"),
    }

    Ok(())
}
