//! Data models shared by every stage of the drawing pipeline
//!
//! This module provides:
//! - 2D points used in image space and arm space
//! - Pen state and waypoints (the unit of a compiled trajectory)
//! - Joint angles produced by inverse kinematics
//! - Arm geometry and the elbow branch policy

use crate::error::KinematicsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in either image space or arm space
///
/// Image space has its origin at the top-left pixel with `y` growing downward.
/// Arm space has its origin at the shoulder joint with `y` growing upward and
/// is measured in millimeters. The two are only related through
/// `scaradraw_planner::map_to_arm_space`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point2D {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin of the coordinate space
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Distance from the origin
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Whether the tool is lifted (travel) or lowered (drawing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenState {
    /// Lifted: the transition into this waypoint is a travel move
    #[default]
    Up,
    /// Lowered: the transition into this waypoint draws a line
    Down,
}

impl PenState {
    /// Wire flag used by line protocols and the trajectory export (1 = down)
    pub fn as_flag(self) -> u8 {
        match self {
            PenState::Up => 0,
            PenState::Down => 1,
        }
    }

    /// Check if the pen is lowered
    pub fn is_down(self) -> bool {
        self == PenState::Down
    }
}

impl fmt::Display for PenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PenState::Up => write!(f, "Up"),
            PenState::Down => write!(f, "Down"),
        }
    }
}

/// A single arm-space target with its pen state
///
/// Waypoints are produced by the trajectory compiler and never mutated
/// afterwards; their order is the drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target position in arm space (mm)
    pub position: Point2D,
    /// Pen state while travelling to `position`
    pub pen: PenState,
}

impl Waypoint {
    /// Create a new waypoint
    pub const fn new(position: Point2D, pen: PenState) -> Self {
        Self { position, pen }
    }

    /// Create a drawing waypoint
    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(Point2D::new(x, y), PenState::Down)
    }

    /// Create a travel waypoint
    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(Point2D::new(x, y), PenState::Up)
    }
}

/// Shoulder and elbow angles in degrees
///
/// Always derived from a waypoint by inverse kinematics and never used as
/// ground truth for a position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointAngles {
    /// Shoulder angle, measured counter-clockwise from the +x axis
    pub theta1: f64,
    /// Elbow angle, relative to link 1
    pub theta2: f64,
}

impl JointAngles {
    /// Create joint angles from degrees
    pub const fn new(theta1: f64, theta2: f64) -> Self {
        Self { theta1, theta2 }
    }

    /// Angles of the home pose (both links along +x)
    pub const fn home() -> Self {
        Self {
            theta1: 0.0,
            theta2: 0.0,
        }
    }

    /// Difference `self - previous`, joint by joint
    pub fn delta_from(&self, previous: &JointAngles) -> JointAngles {
        JointAngles {
            theta1: self.theta1 - previous.theta1,
            theta2: self.theta2 - previous.theta2,
        }
    }
}

impl fmt::Display for JointAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "θ1={:.2}° θ2={:.2}°", self.theta1, self.theta2)
    }
}

/// Which of the two inverse kinematics solutions to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElbowBranch {
    /// Non-negative `acos` root for the elbow angle
    #[default]
    Positive,
    /// Mirrored solution with a non-positive elbow angle
    Negative,
}

impl fmt::Display for ElbowBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElbowBranch::Positive => write!(f, "positive"),
            ElbowBranch::Negative => write!(f, "negative"),
        }
    }
}

/// Link lengths of the two-link arm, in millimeters
///
/// Constant for a session. Defines the reachable annulus
/// `[|L1 - L2|, L1 + L2]` around the shoulder. Deserialization goes through
/// [`ArmGeometry::new`], so a stored geometry is validated like a built one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArmLinks")]
pub struct ArmGeometry {
    link1_length: f64,
    link2_length: f64,
}

/// Unvalidated wire form of [`ArmGeometry`]
#[derive(Deserialize)]
struct ArmLinks {
    link1_length: f64,
    link2_length: f64,
}

impl TryFrom<ArmLinks> for ArmGeometry {
    type Error = KinematicsError;

    fn try_from(links: ArmLinks) -> Result<Self, Self::Error> {
        ArmGeometry::new(links.link1_length, links.link2_length)
    }
}

impl ArmGeometry {
    /// Create a geometry, rejecting non-positive or non-finite lengths
    pub fn new(link1_length: f64, link2_length: f64) -> Result<Self, KinematicsError> {
        for (name, value) in [("link1_length", link1_length), ("link2_length", link2_length)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(KinematicsError::InvalidGeometry {
                    reason: format!("{} must be a positive length, got {}", name, value),
                });
            }
        }

        Ok(Self {
            link1_length,
            link2_length,
        })
    }

    /// Length of the shoulder-to-elbow link
    pub fn link1_length(&self) -> f64 {
        self.link1_length
    }

    /// Length of the elbow-to-tip link
    pub fn link2_length(&self) -> f64 {
        self.link2_length
    }

    /// Inner radius of the reachable annulus
    pub fn min_reach(&self) -> f64 {
        (self.link1_length - self.link2_length).abs()
    }

    /// Outer radius of the reachable annulus
    pub fn max_reach(&self) -> f64 {
        self.link1_length + self.link2_length
    }
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            link1_length: 140.0,
            link2_length: 120.0,
        }
    }
}

impl fmt::Display for ArmGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L1={}mm L2={}mm (reach {}..{}mm)",
            self.link1_length,
            self.link2_length,
            self.min_reach(),
            self.max_reach()
        )
    }
}

/// Lifecycle state of the motion sequencer
///
/// `Idle -> Running -> {Completed | Stopped | Faulted}`, with
/// `Running -> Cancelling -> Stopped` on a user stop. `Faulted` only returns
/// to `Idle` after acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SequencerState {
    /// No run in progress
    #[default]
    Idle,
    /// Stepping through waypoints
    Running,
    /// Stop requested; parking the tool
    Cancelling,
    /// Ended by cancellation or emergency stop
    Stopped,
    /// All waypoints processed
    Completed,
    /// Aborted by a transport failure
    Faulted,
}

impl SequencerState {
    /// Check if a run is active (running or winding down)
    pub fn is_active(self) -> bool {
        matches!(self, SequencerState::Running | SequencerState::Cancelling)
    }

    /// Check if this is a terminal state of a run
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SequencerState::Stopped | SequencerState::Completed | SequencerState::Faulted
        )
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerState::Idle => write!(f, "Idle"),
            SequencerState::Running => write!(f, "Running"),
            SequencerState::Cancelling => write!(f, "Cancelling"),
            SequencerState::Stopped => write!(f, "Stopped"),
            SequencerState::Completed => write!(f, "Completed"),
            SequencerState::Faulted => write!(f, "Faulted"),
        }
    }
}

/// One simulation frame: the arm pose after a waypoint was sent
///
/// Consumed by the external renderer; the sequencer itself never draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmFrame {
    /// Start of link 1 (the shoulder, always the arm-space origin)
    pub shoulder: Point2D,
    /// End of link 1
    pub elbow: Point2D,
    /// End of link 2
    pub tip: Point2D,
    /// Pen state for the segment drawn into `tip`
    pub pen: PenState,
    /// Index of the waypoint this frame belongs to
    pub index: usize,
    /// Number of waypoints in the run
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_deserialization_is_validated() {
        let geometry: ArmGeometry =
            serde_json::from_str(r#"{"link1_length": 100.0, "link2_length": 80.0}"#).unwrap();
        assert_eq!(geometry.min_reach(), 20.0);

        let err = serde_json::from_str::<ArmGeometry>(r#"{"link1_length": 0, "link2_length": 80.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("link1_length must be a positive length"));

        let json = serde_json::to_string(&ArmGeometry::default()).unwrap();
        assert_eq!(json, r#"{"link1_length":140.0,"link2_length":120.0}"#);
    }

    #[test]
    fn test_sequencer_state_classes() {
        assert!(SequencerState::Running.is_active());
        assert!(SequencerState::Cancelling.is_active());
        assert!(!SequencerState::Idle.is_active());
        assert!(SequencerState::Faulted.is_terminal());
        assert!(!SequencerState::Running.is_terminal());
        assert_eq!(SequencerState::default(), SequencerState::Idle);
    }

    #[test]
    fn test_geometry_annulus() {
        let geometry = ArmGeometry::new(140.0, 120.0).unwrap();
        assert_eq!(geometry.min_reach(), 20.0);
        assert_eq!(geometry.max_reach(), 260.0);
    }

    #[test]
    fn test_geometry_rejects_bad_lengths() {
        assert!(ArmGeometry::new(0.0, 120.0).is_err());
        assert!(ArmGeometry::new(140.0, -1.0).is_err());
        assert!(ArmGeometry::new(f64::NAN, 120.0).is_err());
    }

    #[test]
    fn test_pen_flag() {
        assert_eq!(PenState::Up.as_flag(), 0);
        assert_eq!(PenState::Down.as_flag(), 1);
        assert_eq!(PenState::default(), PenState::Up);
    }

    #[test]
    fn test_angle_delta() {
        let prev = JointAngles::new(10.0, 20.0);
        let next = JointAngles::new(12.5, 15.0);
        assert_eq!(next.delta_from(&prev), JointAngles::new(2.5, -5.0));
    }

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::from((3.0, 4.0));
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.magnitude(), 5.0);
    }
}
