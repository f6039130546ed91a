//! # scaradraw core
//!
//! Data model, kinematics, error taxonomy and the application event bus for
//! the scaradraw drawing pipeline. Every other crate in the workspace builds
//! on these types.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod kinematics;

pub use data::{
    ArmFrame, ArmGeometry, ElbowBranch, JointAngles, PenState, Point2D, SequencerState, Waypoint,
};

pub use error::{
    ConnectionError, Error, KinematicsError, MotionError, Result, WaypointIndex,
};

// Re-export event bus for convenience
pub use event_bus::{
    AppEvent, ConnectionEvent, ErrorEvent, EventBus, EventCategory, EventFilter,
    MotionEvent, SubscriptionId, TrajectoryEvent,
};

pub use kinematics::{
    forward_kinematics, forward_kinematics_for, inverse_kinematics,
    inverse_kinematics_with_branch, is_reachable,
};
