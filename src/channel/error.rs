use std::io;
use thiserror::Error;

/// Result type for control channel operations
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

/// Errors that can occur while talking to the stats socket.
///
/// Every variant is fatal for the polling cycle that hit it.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write command {command:?}: {source}")]
    Write {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read response: {0}")]
    Read(#[source] io::Error),

    #[error("Invalid channel address {0:?}")]
    InvalidAddress(String),
}

impl ChannelError {
    /// Short label for the failing step, used in logs and metric labels
    pub fn step(&self) -> &'static str {
        match self {
            ChannelError::Connection { .. } => "connect",
            ChannelError::Write { .. } => "write",
            ChannelError::Read(_) => "read",
            ChannelError::InvalidAddress(_) => "address",
        }
    }
}
