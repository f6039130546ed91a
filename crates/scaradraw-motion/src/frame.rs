//! Simulation frames for the external renderer

use scaradraw_core::{forward_kinematics_for, ArmFrame, ArmGeometry, JointAngles, PenState, Point2D};

/// Build the frame for a pose that was just sent
pub fn arm_frame(
    geometry: &ArmGeometry,
    angles: &JointAngles,
    pen: PenState,
    index: usize,
    total: usize,
) -> ArmFrame {
    let (elbow, tip) = forward_kinematics_for(angles, geometry);
    ArmFrame {
        shoulder: Point2D::origin(),
        elbow,
        tip,
        pen,
        index,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaradraw_core::inverse_kinematics;

    #[test]
    fn test_frame_tip_matches_target() {
        let geometry = ArmGeometry::default();
        let angles = inverse_kinematics(100.0, 150.0, &geometry).unwrap();
        let frame = arm_frame(&geometry, &angles, PenState::Down, 2, 9);

        assert_eq!(frame.shoulder, Point2D::origin());
        assert!((frame.elbow.magnitude() - 140.0).abs() < 1e-9);
        assert!((frame.tip.x - 100.0).abs() < 1e-6);
        assert!((frame.tip.y - 150.0).abs() < 1e-6);
        assert_eq!((frame.index, frame.total), (2, 9));
    }
}
