//! Hardware-free sink used for visual simulation and tests

use crate::sink::{terminated, MotionSink};
use parking_lot::Mutex;
use scaradraw_core::ConnectionError;
use std::sync::Arc;

/// Shared, cloneable record of every command a [`SimulatedSink`] accepted
///
/// Commands are stored without their final newline.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Arc<Mutex<Vec<String>>>,
}

impl CommandLog {
    /// Snapshot of the recorded commands
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    /// Number of recorded commands equal to `command`
    pub fn count(&self, command: &str) -> usize {
        self.commands.lock().iter().filter(|c| *c == command).count()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    fn push(&self, command: String) {
        self.commands.lock().push(command);
    }
}

/// A sink that records commands instead of sending them
///
/// Ready once connected. Can be told to start failing after a number of
/// successful sends to exercise transport-fault handling.
#[derive(Debug, Default)]
pub struct SimulatedSink {
    connected: bool,
    log: CommandLog,
    fail_after: Option<usize>,
    sent: usize,
}

impl SimulatedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every send after the first `successful` ones
    pub fn failing_after(mut self, successful: usize) -> Self {
        self.fail_after = Some(successful);
        self
    }

    /// A handle onto the command record that outlives the sink
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }
}

impl MotionSink for SimulatedSink {
    fn name(&self) -> String {
        "simulation".to_string()
    }

    fn connect(&mut self) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ConnectionError> {
        self.connected = false;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected
    }

    fn send(&mut self, command: &str) -> Result<(), ConnectionError> {
        if !self.connected {
            return Err(ConnectionError::NotConnected);
        }
        let line = terminated(command);
        let line = line.trim_end_matches('\n');

        if self.fail_after.is_some_and(|limit| self.sent >= limit) {
            return Err(ConnectionError::WriteFailed {
                command: line.to_string(),
                reason: "simulated write failure".to_string(),
            });
        }

        tracing::trace!("sim <- {}", line);
        self.log.push(line.to_string());
        self.sent += 1;
        Ok(())
    }
}
