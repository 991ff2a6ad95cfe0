use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use super::{ChannelError, ChannelResult, ControlChannel};

/// A channel that replays canned responses in order and records commands
pub struct ScriptedChannel {
    responses: Mutex<VecDeque<ChannelResult<String>>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedChannel {
    pub fn new(responses: Vec<ChannelResult<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Every command sent so far
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// A read failure, as if the peer reset the connection
    pub fn read_error() -> ChannelError {
        ChannelError::Read(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer"))
    }
}

#[async_trait::async_trait]
impl ControlChannel for ScriptedChannel {
    async fn exchange(&self, command: &str) -> ChannelResult<String> {
        self.commands.lock().unwrap().push(command.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::read_error()))
    }
}
