//! Forward and inverse kinematics for the two-link planar arm
//!
//! Angles are in degrees, lengths in millimeters, positions in arm space
//! (shoulder at the origin, y up).

use crate::data::{ArmGeometry, ElbowBranch, JointAngles, Point2D};
use crate::error::KinematicsError;

/// Check whether `(x, y)` lies inside the reachable annulus
///
/// `|L1 - L2| <= sqrt(x² + y²) <= L1 + L2`. The trajectory compiler and the
/// motion sequencer both go through this predicate so a point filtered in one
/// stage is never re-attempted in the other.
pub fn is_reachable(x: f64, y: f64, geometry: &ArmGeometry) -> bool {
    let distance = x.hypot(y);
    distance >= geometry.min_reach() && distance <= geometry.max_reach()
}

/// Solve joint angles for `(x, y)` using the default (positive) elbow branch
pub fn inverse_kinematics(
    x: f64,
    y: f64,
    geometry: &ArmGeometry,
) -> Result<JointAngles, KinematicsError> {
    inverse_kinematics_with_branch(x, y, geometry, ElbowBranch::Positive)
}

/// Solve joint angles for `(x, y)` on the requested elbow branch
///
/// The law of cosines gives `c = (x² + y² - L1² - L2²) / (2·L1·L2)`; the elbow
/// angle is `±acos(c)` and the shoulder angle follows from the direction to the
/// target minus the angle the forearm adds.
pub fn inverse_kinematics_with_branch(
    x: f64,
    y: f64,
    geometry: &ArmGeometry,
    branch: ElbowBranch,
) -> Result<JointAngles, KinematicsError> {
    if !is_reachable(x, y, geometry) {
        return Err(KinematicsError::Unreachable {
            x,
            y,
            distance: x.hypot(y),
            min: geometry.min_reach(),
            max: geometry.max_reach(),
        });
    }

    let l1 = geometry.link1_length();
    let l2 = geometry.link2_length();

    // The annulus check already bounds c; clamping only absorbs rounding at the rims.
    let c = ((x * x + y * y - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);

    let theta2 = match branch {
        ElbowBranch::Positive => c.acos(),
        ElbowBranch::Negative => -c.acos(),
    };
    let theta1 = y.atan2(x) - (l2 * theta2.sin()).atan2(l1 + l2 * theta2.cos());

    Ok(JointAngles {
        theta1: theta1.to_degrees(),
        theta2: theta2.to_degrees(),
    })
}

/// Positions of the elbow and the tool tip for the given joint angles
///
/// Returns `(elbow, tip)`.
pub fn forward_kinematics(theta1: f64, theta2: f64, geometry: &ArmGeometry) -> (Point2D, Point2D) {
    let t1 = theta1.to_radians();
    let t12 = (theta1 + theta2).to_radians();

    let elbow = Point2D::new(
        geometry.link1_length() * t1.cos(),
        geometry.link1_length() * t1.sin(),
    );
    let tip = Point2D::new(
        elbow.x + geometry.link2_length() * t12.cos(),
        elbow.y + geometry.link2_length() * t12.sin(),
    );

    (elbow, tip)
}

/// Convenience wrapper over [`forward_kinematics`] taking [`JointAngles`]
pub fn forward_kinematics_for(angles: &JointAngles, geometry: &ArmGeometry) -> (Point2D, Point2D) {
    forward_kinematics(angles.theta1, angles.theta2, geometry)
}
