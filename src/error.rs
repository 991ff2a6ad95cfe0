// src/error.rs
use std::io;
use thiserror::Error;

use crate::channel::ChannelError;

/// Result type used across the exporter library
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Custom Error type for the exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Control channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Metric error: {0}")]
    Metric(#[from] prometheus::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl ExporterError {
    /// Whether this error came from the control channel (connect, write or read)
    pub fn is_channel(&self) -> bool {
        matches!(self, ExporterError::Channel(_))
    }
}
