use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::channel::ChannelAddress;
use crate::error::{ExporterError, Result};

/// Prefix for environment overrides, e.g. `STICKTABLE_EXPORTER_INTERVAL=10`
pub const ENV_PREFIX: &str = "STICKTABLE_EXPORTER";

/// Exporter configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address and port the metrics endpoint listens on
    pub listen_address: String,
    /// Stats socket of the load balancer
    pub socket: String,
    /// Delay between collection cycles in seconds
    pub interval: u64,
    /// Namespace for the exported metrics
    pub namespace: String,
    /// Subsystem for the exported metrics
    pub subsystem: String,
    /// Logging level
    pub log_level: LogLevel,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9752".to_string(),
            socket: "/var/haproxy/admin.sock".to_string(),
            interval: 5,
            namespace: "smveloso".to_string(),
            subsystem: "haproxy".to_string(),
            log_level: LogLevel::default(),
        }
    }
}

impl ExporterConfig {
    /// Check the values that cannot be caught by deserialization
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(ExporterError::Config("interval must be at least 1 second".to_string()));
        }
        self.channel_address()?;
        Ok(())
    }

    /// Parsed stats socket address
    pub fn channel_address(&self) -> Result<ChannelAddress> {
        self.socket
            .parse()
            .map_err(|e| ExporterError::Config(format!("Invalid socket: {}", e)))
    }

    /// Delay between collection cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Listen address with a bare `:port` expanded to all interfaces
    pub fn listen_address(&self) -> String {
        match self.listen_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.listen_address.clone(),
        }
    }

    /// Apply command line values on top of the loaded configuration
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(listen_address) = overrides.listen_address {
            self.listen_address = listen_address;
        }
        if let Some(socket) = overrides.socket {
            self.socket = socket;
        }
        if let Some(interval) = overrides.interval {
            self.interval = interval;
        }
        if let Some(namespace) = overrides.namespace {
            self.namespace = namespace;
        }
        if let Some(subsystem) = overrides.subsystem {
            self.subsystem = subsystem;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_address: Option<String>,
    pub socket: Option<String>,
    pub interval: Option<u64>,
    pub namespace: Option<String>,
    pub subsystem: Option<String>,
    pub log_level: Option<LogLevel>,
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (TOML format)
    File(PathBuf),
    /// Environment variables named `<PREFIX>_<KEY>`
    Environment(String),
    /// Default configuration
    Defaults,
}

/// Load configuration from sources; later sources override earlier ones
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    return Err(ExporterError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }

                debug!("Loading TOML configuration from file: {}", path.display());
                builder = builder.add_source(
                    config::File::from(path.as_path()).format(config::FileFormat::Toml),
                );
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .prefix_separator("_")
                        .try_parsing(true),
                );
            }
            ConfigSource::Defaults => {
                // Defaults come from the Deserialize implementation
                debug!("Using default configuration values");
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| ExporterError::Config(format!("Failed to build configuration: {}", e)))?;

    let result = config
        .try_deserialize()
        .map_err(|e| ExporterError::Config(format!("Failed to deserialize configuration: {}", e)))?;

    debug!("Configuration loaded successfully: {:?}", result);

    Ok(result)
}

/// Configuration builder
pub struct ConfigBuilder<T: for<'de> Deserialize<'de>> {
    sources: Vec<ConfigSource>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: for<'de> Deserialize<'de> + Debug> ConfigBuilder<T> {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Add a TOML file source
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ConfigSource::File(path.into()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add a TOML file source if a path was given
    pub fn add_optional_file(self, path: Option<impl Into<PathBuf>>) -> Self {
        match path {
            Some(path) => self.add_file(path),
            None => self,
        }
    }

    /// Use default values
    pub fn use_defaults(mut self) -> Self {
        self.sources.push(ConfigSource::Defaults);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<T> {
        load_config::<T>(self.sources)
    }
}

impl<T: for<'de> Deserialize<'de> + Debug> Default for ConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
