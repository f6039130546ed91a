//! Event type definitions for the event bus.
//!
//! Events are organized by category and are cloneable and serializable so a
//! run can be logged or replayed into a renderer.

use serde::{Deserialize, Serialize};

use crate::data::{ArmFrame, Point2D, SequencerState};

/// Root event enum for all application events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Sink connection events
    Connection(ConnectionEvent),
    /// Motion sequencer events
    Motion(MotionEvent),
    /// Trajectory compilation events
    Trajectory(TrajectoryEvent),
    /// Error and diagnostic events
    Error(ErrorEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Connection(_) => EventCategory::Connection,
            AppEvent::Motion(_) => EventCategory::Motion,
            AppEvent::Trajectory(_) => EventCategory::Trajectory,
            AppEvent::Error(_) => EventCategory::Error,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Connection(e) => e.description(),
            AppEvent::Motion(e) => e.description(),
            AppEvent::Trajectory(e) => e.description(),
            AppEvent::Error(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Sink connection events.
    Connection,
    /// Motion sequencer events.
    Motion,
    /// Trajectory compilation events.
    Trajectory,
    /// Error and diagnostic events.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Connection => write!(f, "Connection"),
            EventCategory::Motion => write!(f, "Motion"),
            EventCategory::Trajectory => write!(f, "Trajectory"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// Connection-related events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionEvent {
    /// Successfully connected.
    Connected {
        /// Name of the sink (port path or "simulation").
        sink: String,
    },
    /// Disconnected from the sink.
    Disconnected {
        /// Name of the sink.
        sink: String,
    },
    /// Connection attempt failed.
    ConnectionFailed {
        /// Name of the sink.
        sink: String,
        /// Error message describing the failure.
        error: String,
    },
}

impl ConnectionEvent {
    fn description(&self) -> String {
        match self {
            ConnectionEvent::Connected { sink } => format!("Connected to {}", sink),
            ConnectionEvent::Disconnected { sink } => format!("Disconnected from {}", sink),
            ConnectionEvent::ConnectionFailed { sink, error } => {
                format!("Connection failed to {}: {}", sink, error)
            }
        }
    }
}

/// Motion sequencer events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MotionEvent {
    /// Sequencer state transition.
    StateChanged {
        /// State before the transition.
        from: SequencerState,
        /// State after the transition.
        to: SequencerState,
    },
    /// A waypoint was processed (sent or skipped).
    Progress {
        /// Number of waypoints processed so far.
        completed: usize,
        /// Number of waypoints in the run.
        total: usize,
    },
    /// Arm pose after a waypoint was sent.
    Frame(ArmFrame),
    /// A waypoint was skipped because it is unreachable.
    WaypointSkipped {
        /// Index of the skipped waypoint.
        index: usize,
        /// Arm-space position of the skipped waypoint.
        position: Point2D,
    },
    /// A run ended.
    RunFinished {
        /// Terminal state of the run.
        state: SequencerState,
        /// Motion commands delivered.
        sent: usize,
        /// Waypoints skipped as unreachable.
        skipped: usize,
    },
}

impl MotionEvent {
    fn description(&self) -> String {
        match self {
            MotionEvent::StateChanged { from, to } => format!("Sequencer: {} -> {}", from, to),
            MotionEvent::Progress { completed, total } => {
                format!("Progress: {}/{}", completed, total)
            }
            MotionEvent::Frame(frame) => {
                format!("Frame {}/{}: tip {}", frame.index + 1, frame.total, frame.tip)
            }
            MotionEvent::WaypointSkipped { index, position } => {
                format!("Skipped unreachable waypoint {} at {}", index, position)
            }
            MotionEvent::RunFinished {
                state,
                sent,
                skipped,
            } => format!("Run finished: {} ({} sent, {} skipped)", state, sent, skipped),
        }
    }

    /// Check if this event is high-frequency (per waypoint)
    pub fn is_per_waypoint(&self) -> bool {
        matches!(
            self,
            MotionEvent::Progress { .. } | MotionEvent::Frame(_) | MotionEvent::WaypointSkipped { .. }
        )
    }
}

/// Trajectory compilation events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrajectoryEvent {
    /// A trajectory was compiled.
    Compiled {
        /// Number of waypoints produced.
        waypoints: usize,
        /// Number of pen-down strokes.
        strokes: usize,
        /// Number of points dropped as unreachable.
        dropped: usize,
    },
    /// A trajectory was written to disk.
    Exported {
        /// Destination path.
        path: String,
        /// Number of waypoints written.
        waypoints: usize,
    },
}

impl TrajectoryEvent {
    fn description(&self) -> String {
        match self {
            TrajectoryEvent::Compiled {
                waypoints,
                strokes,
                dropped,
            } => format!(
                "Compiled {} waypoints in {} strokes ({} dropped)",
                waypoints, strokes, dropped
            ),
            TrajectoryEvent::Exported { path, waypoints } => {
                format!("Exported {} waypoints to {}", waypoints, path)
            }
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Non-critical warning that does not block operation.
    Warning,
    /// Error that may be recoverable.
    Error,
    /// Critical error requiring immediate attention.
    Critical,
}

/// Error and diagnostic events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ErrorEvent {
    /// Warning (non-blocking).
    Warning {
        /// Warning code identifier.
        code: String,
        /// Human-readable warning message.
        message: String,
    },
    /// Error (may be recoverable).
    Error {
        /// Error code identifier.
        code: String,
        /// Human-readable error message.
        message: String,
        /// Whether recovery is possible without user intervention.
        recoverable: bool,
    },
    /// Critical error (requires attention).
    Critical {
        /// Critical error code identifier.
        code: String,
        /// Human-readable critical error message.
        message: String,
    },
}

impl ErrorEvent {
    fn description(&self) -> String {
        match self {
            ErrorEvent::Warning { code, message } => {
                format!("Warning [{}]: {}", code, message)
            }
            ErrorEvent::Error { code, message, .. } => {
                format!("Error [{}]: {}", code, message)
            }
            ErrorEvent::Critical { code, message } => {
                format!("Critical [{}]: {}", code, message)
            }
        }
    }

    /// Get the severity of this error event
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorEvent::Warning { .. } => ErrorSeverity::Warning,
            ErrorEvent::Error { .. } => ErrorSeverity::Error,
            ErrorEvent::Critical { .. } => ErrorSeverity::Critical,
        }
    }
}
