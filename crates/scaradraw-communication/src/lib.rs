//! # scaradraw communication
//!
//! Everything between a planned waypoint and the wire:
//! - `MotionSink`: the `connect`/`send`/`is_ready`/`disconnect` capability the
//!   sequencer drives, with serial and simulated implementations
//! - `MotionProtocol`: how a waypoint and its joint angles become a command
//!   string, with absolute-angle and step-delta vocabularies

pub mod protocol;
pub mod serial;
pub mod simulated;
pub mod sink;

pub use protocol::{
    AbsoluteAngleProtocol, MotionProtocol, ProtocolKind, StepDeltaProtocol,
    DEFAULT_STEPS_PER_DEGREE,
};
pub use serial::{list_ports, SerialParams, SerialPortInfo, SerialSink, AUTO_PORT};
pub use simulated::{CommandLog, SimulatedSink};
pub use sink::{connect_shared, disconnect_shared, shared_sink, MotionSink, SharedSink};
