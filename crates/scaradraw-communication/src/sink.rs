//! The command sink abstraction
//!
//! A sink only has to deliver complete command strings; byte-level framing
//! is the implementation's business.

use parking_lot::Mutex;
use scaradraw_core::{AppEvent, ConnectionError, ConnectionEvent, EventBus};
use std::sync::Arc;

/// A destination for motion commands
///
/// Implementations are driven from the sequencer's worker thread and, for the
/// emergency stop, from whichever thread raised it; [`SharedSink`] serializes
/// the two.
pub trait MotionSink: Send {
    /// Human-readable name (port path, "simulation", ...)
    fn name(&self) -> String;

    /// Open the underlying transport
    fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Close the underlying transport
    fn disconnect(&mut self) -> Result<(), ConnectionError>;

    /// Check if the sink can accept commands
    fn is_ready(&self) -> bool;

    /// Deliver one command
    ///
    /// A missing trailing newline is added by the sink.
    fn send(&mut self, command: &str) -> Result<(), ConnectionError>;
}

/// A sink shared between the sequencer loop and the emergency-stop path
pub type SharedSink = Arc<Mutex<Box<dyn MotionSink>>>;

/// Wrap a sink for sharing
pub fn shared_sink<S: MotionSink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink)))
}

/// Connect a shared sink and announce the outcome on `events`
pub fn connect_shared(sink: &SharedSink, events: Option<&EventBus>) -> Result<(), ConnectionError> {
    let mut guard = sink.lock();
    let name = guard.name();
    match guard.connect() {
        Ok(()) => {
            tracing::info!("Connected to {}", name);
            if let Some(events) = events {
                events.notify(AppEvent::Connection(ConnectionEvent::Connected { sink: name }));
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", name, e);
            if let Some(events) = events {
                events.notify(AppEvent::Connection(ConnectionEvent::ConnectionFailed {
                    sink: name,
                    error: e.to_string(),
                }));
            }
            Err(e)
        }
    }
}

/// Disconnect a shared sink and announce it on `events`
pub fn disconnect_shared(
    sink: &SharedSink,
    events: Option<&EventBus>,
) -> Result<(), ConnectionError> {
    let mut guard = sink.lock();
    let name = guard.name();
    guard.disconnect()?;
    tracing::info!("Disconnected from {}", name);
    if let Some(events) = events {
        events.notify(AppEvent::Connection(ConnectionEvent::Disconnected { sink: name }));
    }
    Ok(())
}

/// Append a newline unless the command already ends with one
pub(crate) fn terminated(command: &str) -> std::borrow::Cow<'_, str> {
    if command.ends_with('\n') {
        std::borrow::Cow::Borrowed(command)
    } else {
        std::borrow::Cow::Owned(format!("{}\n", command))
    }
}
