//! Error handling for scaradraw
//!
//! Provides error types for all layers of the drawing pipeline:
//! - Kinematics errors (reachability, geometry)
//! - Connection errors (sink transport)
//! - Motion errors (sequencer preconditions and faults)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Kinematics error type
///
/// `Unreachable` is the only per-waypoint error in the pipeline. It is
/// recoverable: the offending point is skipped and the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Target lies outside the reachable annulus
    #[error("Point ({x:.2}, {y:.2}) is unreachable: distance {distance:.2}mm outside [{min:.2}, {max:.2}]mm")]
    Unreachable {
        /// Target x in arm space
        x: f64,
        /// Target y in arm space
        y: f64,
        /// Distance of the target from the shoulder
        distance: f64,
        /// Inner radius of the annulus
        min: f64,
        /// Outer radius of the annulus
        max: f64,
    },

    /// Arm geometry is not physically meaningful
    #[error("Invalid arm geometry: {reason}")]
    InvalidGeometry {
        /// Why the geometry was rejected
        reason: String,
    },
}

/// Connection error type
///
/// Represents failures of the hardware or simulation sink transport.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Sink is not connected
    #[error("Sink not connected")]
    NotConnected,

    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Writing a command failed
    #[error("Failed to write command '{command}': {reason}")]
    WriteFailed {
        /// The command that could not be written, without its line terminator.
        command: String,
        /// The reason the write failed.
        reason: String,
    },

    /// Serial port error
    #[error("Serial port error: {reason}")]
    SerialError {
        /// The reason for the serial port error.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {reason}")]
    IoError {
        /// The reason for the I/O error.
        reason: String,
    },
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        ConnectionError::IoError {
            reason: err.to_string(),
        }
    }
}

/// Motion sequencer error type
///
/// Everything here escalates to the caller of a run. Cancellation and
/// emergency stop are not errors; they end a run in the `Stopped` state.
#[derive(Error, Debug, Clone)]
pub enum MotionError {
    /// Sink reported itself not ready when the run was requested
    #[error("Sink '{sink}' is not ready")]
    NotReady {
        /// Name of the sink that was not ready.
        sink: String,
    },

    /// A run is already in progress
    #[error("A run is already in progress")]
    AlreadyRunning,

    /// The previous run faulted and has not been acknowledged
    #[error("Previous run faulted; acknowledge the fault before starting a new run")]
    FaultNotAcknowledged,

    /// A send to the sink failed mid-run
    #[error("Transport fault at waypoint {index} ({sent} sent, {skipped} skipped): {source}")]
    TransportFault {
        /// Waypoint being processed, or the priming/parking phase.
        index: WaypointIndex,
        /// Motion commands delivered before the fault.
        sent: usize,
        /// Waypoints skipped as unreachable before the fault.
        skipped: usize,
        /// Underlying transport error.
        #[source]
        source: ConnectionError,
    },
}

/// Position of a fault within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointIndex {
    /// Priming commands sent before the first waypoint
    Priming,
    /// A specific waypoint (0-based)
    At(usize),
    /// Parking commands sent after the last waypoint or on cancellation
    Parking,
}

impl std::fmt::Display for WaypointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaypointIndex::Priming => write!(f, "priming"),
            WaypointIndex::At(index) => write!(f, "{}", index),
            WaypointIndex::Parking => write!(f, "parking"),
        }
    }
}

/// Main error type for scaradraw
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Kinematics error
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Motion error
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Motion(MotionError::TransportFault { .. })
        )
    }

    /// Check if this is a motion error
    pub fn is_motion_error(&self) -> bool {
        matches!(self, Error::Motion(_))
    }

    /// Check if this is an unreachable-point error
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Kinematics(KinematicsError::Unreachable { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_fault_display() {
        let err = MotionError::TransportFault {
            index: WaypointIndex::At(4),
            sent: 4,
            skipped: 1,
            source: ConnectionError::NotConnected,
        };
        assert_eq!(
            err.to_string(),
            "Transport fault at waypoint 4 (4 sent, 1 skipped): Sink not connected"
        );
    }

    #[test]
    fn test_transport_fault_outside_waypoints() {
        let err = MotionError::TransportFault {
            index: WaypointIndex::Priming,
            sent: 0,
            skipped: 0,
            source: ConnectionError::NotConnected,
        };
        assert!(err.to_string().starts_with("Transport fault at waypoint priming (0 sent"));
        assert_eq!(WaypointIndex::Parking.to_string(), "parking");
    }

    #[test]
    fn test_error_classification() {
        let err: Error = ConnectionError::NotConnected.into();
        assert!(err.is_connection_error());
        assert!(!err.is_motion_error());

        let err: Error = MotionError::AlreadyRunning.into();
        assert!(err.is_motion_error());

        let err: Error = KinematicsError::Unreachable {
            x: 300.0,
            y: 0.0,
            distance: 300.0,
            min: 20.0,
            max: 260.0,
        }
        .into();
        assert!(err.is_unreachable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let conn: ConnectionError = io.into();
        assert!(matches!(conn, ConnectionError::IoError { .. }));
    }
}
