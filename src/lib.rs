//! # scaradraw
//!
//! Image-to-trajectory planning and motion playback for two-link SCARA
//! drawing arms.
//!
//! ## Architecture
//!
//! scaradraw is organized as a workspace with multiple crates:
//!
//! 1. **scaradraw-core** - Data model, kinematics, errors, event bus
//! 2. **scaradraw-planner** - Contours, strokes, coordinate mapping, trajectory compiler, export
//! 3. **scaradraw-communication** - Motion sinks (serial, simulated) and command protocols
//! 4. **scaradraw-motion** - Cancellable motion sequencer
//! 5. **scaradraw-settings** - Configuration files
//! 6. **scaradraw** - This facade plus the `scaradraw` binary

pub mod app;

pub use scaradraw_communication as communication;
pub use scaradraw_motion as motion;
pub use scaradraw_planner as planner;
pub use scaradraw_settings as settings;

pub use scaradraw_core::{
    forward_kinematics, inverse_kinematics, is_reachable, AppEvent, ArmFrame, ArmGeometry,
    ConnectionError, ElbowBranch, Error, EventBus, JointAngles, KinematicsError, MotionError,
    MotionEvent, PenState, Point2D, Result, SequencerState, Waypoint,
};

pub use scaradraw_communication::{
    list_ports, shared_sink, MotionProtocol, MotionSink, ProtocolKind, SerialSink, SharedSink,
    SimulatedSink,
};
pub use scaradraw_motion::{MotionSequencer, RunReport, SequencerHandle};
pub use scaradraw_planner::{CompiledTrajectory, ContourSet, DrawingPipeline};
pub use scaradraw_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with targets, thread names and line numbers
/// - RUST_LOG environment variable support (default `info`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
