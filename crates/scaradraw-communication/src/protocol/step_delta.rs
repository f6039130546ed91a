use super::MotionProtocol;
use scaradraw_core::{JointAngles, PenState, Waypoint};

/// Default motor steps per joint degree
pub const DEFAULT_STEPS_PER_DEGREE: f64 = 10.0;

/// Relative joint moves in motor steps, followed by a pen verb
///
/// `"G <d1> <d2>\nPD\n"` (or `PU`). Each delta is taken between the rounded
/// absolute step positions, `round(θ·k) - round(θprev·k)`, so rounding error
/// never accumulates over a run.
#[derive(Debug, Clone, Copy)]
pub struct StepDeltaProtocol {
    steps_per_degree: f64,
}

impl Default for StepDeltaProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS_PER_DEGREE)
    }
}

impl StepDeltaProtocol {
    pub fn new(steps_per_degree: f64) -> Self {
        Self { steps_per_degree }
    }

    pub fn steps_per_degree(&self) -> f64 {
        self.steps_per_degree
    }

    fn steps(&self, degrees: f64) -> i64 {
        (degrees * self.steps_per_degree).round() as i64
    }

    /// Step deltas for both joints
    pub fn deltas(&self, angles: &JointAngles, previous: &JointAngles) -> (i64, i64) {
        (
            self.steps(angles.theta1) - self.steps(previous.theta1),
            self.steps(angles.theta2) - self.steps(previous.theta2),
        )
    }
}

impl MotionProtocol for StepDeltaProtocol {
    fn name(&self) -> &'static str {
        "step_delta"
    }

    fn encode(&self, waypoint: &Waypoint, angles: &JointAngles, previous: &JointAngles) -> String {
        let (d1, d2) = self.deltas(angles, previous);
        let pen = match waypoint.pen {
            PenState::Down => self.pen_down(),
            PenState::Up => self.pen_up(),
        };
        format!("G {} {}\n{}", d1, d2, pen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_step_delta() {
        let protocol = StepDeltaProtocol::default();
        let line = protocol.encode(
            &Waypoint::down(0.0, 0.0),
            &JointAngles::new(12.34, -5.0),
            &JointAngles::home(),
        );
        assert_eq!(line, "G 123 -50\nPD\n");

        let line = protocol.encode(
            &Waypoint::up(0.0, 0.0),
            &JointAngles::new(12.0, -5.0),
            &JointAngles::new(12.34, -5.0),
        );
        assert_eq!(line, "G -3 0\nPU\n");
    }

    proptest! {
        #[test]
        fn prop_deltas_sum_to_final_position(
            path in prop::collection::vec((-180.0f64..180.0, -180.0f64..180.0), 1..50),
        ) {
            let protocol = StepDeltaProtocol::default();
            let mut previous = JointAngles::home();
            let (mut total1, mut total2) = (0i64, 0i64);
            for (t1, t2) in &path {
                let angles = JointAngles::new(*t1, *t2);
                let (d1, d2) = protocol.deltas(&angles, &previous);
                total1 += d1;
                total2 += d2;
                previous = angles;
            }
            prop_assert_eq!(total1, protocol.steps(previous.theta1));
            prop_assert_eq!(total2, protocol.steps(previous.theta2));
        }
    }
}
