use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

use super::error::{ChannelError, ChannelResult};
use super::ControlChannel;

/// Where the stats socket lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAddress {
    /// Unix domain socket (`stats socket /path`)
    Unix(PathBuf),
    /// TCP stats listener (`stats socket ipv4@host:port`)
    Tcp(String),
}

impl FromStr for ChannelAddress {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(addr) = s.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err(ChannelError::InvalidAddress(s.to_string()));
            }
            return Ok(ChannelAddress::Tcp(addr.to_string()));
        }

        let path = s.strip_prefix("unix://").unwrap_or(s);
        if path.is_empty() || path.contains("://") {
            return Err(ChannelError::InvalidAddress(s.to_string()));
        }

        Ok(ChannelAddress::Unix(PathBuf::from(path)))
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelAddress::Unix(path) => write!(f, "unix://{}", path.display()),
            ChannelAddress::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

trait ChannelStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ChannelStream for T {}

/// A single-use connection to the stats socket.
///
/// The underlying stream is closed when the connection is dropped, which
/// happens on every path out of [`ControlChannelClient::exchange`].
pub struct Connection {
    stream: Box<dyn ChannelStream>,
    address: String,
}

/// Open a connection to the stats socket
pub async fn open(address: &ChannelAddress) -> ChannelResult<Connection> {
    debug!("Connecting to {}", address);

    let connect_error = |source| ChannelError::Connection {
        address: address.to_string(),
        source,
    };

    let stream: Box<dyn ChannelStream> = match address {
        ChannelAddress::Unix(path) => Box::new(UnixStream::connect(path).await.map_err(connect_error)?),
        ChannelAddress::Tcp(addr) => Box::new(TcpStream::connect(addr.as_str()).await.map_err(connect_error)?),
    };

    Ok(Connection {
        stream,
        address: address.to_string(),
    })
}

/// Write one command line, terminated by a single line feed
pub async fn send(connection: &mut Connection, command: &str) -> ChannelResult<()> {
    debug!("Sending {:?} to {}", command, connection.address);

    let write_error = |source| ChannelError::Write {
        command: command.to_string(),
        source,
    };

    let line = format!("{}\n", command);
    connection.stream.write_all(line.as_bytes()).await.map_err(write_error)?;
    connection.stream.flush().await.map_err(write_error)?;

    trace!("Wrote {} bytes", line.len());
    Ok(())
}

/// Read the whole response. The peer closing the stream is the only
/// completion signal, so this consumes the connection.
pub async fn receive(mut connection: Connection) -> ChannelResult<String> {
    let mut buffer = Vec::new();
    let read = connection
        .stream
        .read_to_end(&mut buffer)
        .await
        .map_err(ChannelError::Read)?;

    trace!("Read {} bytes from {}", read, connection.address);
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Client for the stats socket: one fresh connection per command
#[derive(Debug, Clone)]
pub struct ControlChannelClient {
    address: ChannelAddress,
}

impl ControlChannelClient {
    /// Create a new client for the given address
    pub fn new(address: ChannelAddress) -> Self {
        Self { address }
    }

    /// Get the address this client connects to
    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }
}

#[async_trait::async_trait]
impl ControlChannel for ControlChannelClient {
    async fn exchange(&self, command: &str) -> ChannelResult<String> {
        let mut connection = open(&self.address).await?;
        send(&mut connection, command).await?;
        receive(connection).await
    }
}
