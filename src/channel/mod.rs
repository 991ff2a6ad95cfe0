//! Request/response plumbing for the HAProxy stats socket
//!
//! The stats socket speaks a line-oriented text protocol: one command per
//! connection, terminated by a line feed, answered with plain text until the
//! peer closes the stream. There is no length prefix and no in-band
//! terminator, so EOF is the only completion signal.
//!
//! Connect, write and read are not bounded by any timeout. A wedged peer
//! blocks the polling task until it hangs up.

mod client;
mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{open, receive, send, ChannelAddress, Connection, ControlChannelClient};
pub use error::{ChannelError, ChannelResult};

/// Command listing every stick-table
pub const LIST_TABLES_COMMAND: &str = "show table";

/// Command dumping a single stick-table
pub fn dump_table_command(table: &str) -> String {
    format!("{} {}", LIST_TABLES_COMMAND, table)
}

/// One command, one response
#[async_trait::async_trait]
pub trait ControlChannel: Send + Sync + 'static {
    /// Send `command` on a fresh connection and return the full response
    async fn exchange(&self, command: &str) -> ChannelResult<String>;
}
