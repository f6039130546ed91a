//! # scaradraw planner
//!
//! Turns traced image contours into a reachable arm-space trajectory.
//!
//! ## Stages
//!
//! - **Contours**: serde model of the vision step's output
//! - **Strokes**: contours to `{Move, PenUp, PenDown}` commands, plus point-count optimization
//! - **Mapper**: image space to arm space (scale, center, y flip)
//! - **Compiler**: commands to waypoints, dropping unreachable points
//! - **Export**: plain-text trajectory file for firmware upload
//! - **Pipeline**: all of the above in one call

pub mod compiler;
pub mod contours;
pub mod error;
pub mod export;
pub mod mapper;
pub mod pipeline;
pub mod strokes;

// Re-export commonly used items
pub use compiler::{
    CompiledTrajectory, TrajectoryCompiler, TrajectoryWarning, DEFAULT_TRAVEL_THRESHOLD,
};
pub use contours::{Contour, ContourSet};
pub use error::{ParameterError, PlannerError, PlannerResult};
pub use export::{export_trajectory, format_waypoint, write_trajectory, EXPORT_HEADER};
pub use mapper::{map_to_arm_space, CoordinateMapper, DEFAULT_WORKSPACE_SIZE};
pub use pipeline::{DrawingPipeline, PlannerSettings};
pub use strokes::{
    move_count, optimize_path, resample_indices, PathCommand, StrokeBuilder, DEFAULT_MAX_POINTS,
    DEFAULT_MIN_PERIMETER,
};
