use super::MotionProtocol;
use scaradraw_core::{JointAngles, Waypoint};

/// One line per waypoint carrying absolute joint angles and the pen flag
///
/// `"<theta1:.2>,<theta2:.2>,<0|1>\n"`. Stateless: a lost line never
/// corrupts later positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteAngleProtocol;

impl MotionProtocol for AbsoluteAngleProtocol {
    fn name(&self) -> &'static str {
        "absolute"
    }

    fn encode(&self, waypoint: &Waypoint, angles: &JointAngles, _previous: &JointAngles) -> String {
        format!(
            "{:.2},{:.2},{}\n",
            angles.theta1,
            angles.theta2,
            waypoint.pen.as_flag()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_absolute_line() {
        let protocol = AbsoluteAngleProtocol;
        let line = protocol.encode(
            &Waypoint::down(10.0, 20.0),
            &JointAngles::new(45.126, -90.0),
            &JointAngles::new(1.0, 2.0),
        );
        assert_eq!(line, "45.13,-90.00,1\n");

        let line = protocol.encode(
            &Waypoint::up(10.0, 20.0),
            &JointAngles::new(0.0, 12.5),
            &JointAngles::home(),
        );
        assert_eq!(line, "0.00,12.50,0\n");
    }
}
