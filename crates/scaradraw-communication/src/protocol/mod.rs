//! Command vocabularies spoken by drawing controllers
//!
//! A protocol turns one waypoint (with the joint angles solved for it and the
//! angles last sent) into a command string, and supplies the fixed verbs for
//! homing, lifting the pen and halting.

mod absolute;
mod step_delta;

pub use absolute::AbsoluteAngleProtocol;
pub use step_delta::{StepDeltaProtocol, DEFAULT_STEPS_PER_DEGREE};

use scaradraw_core::{JointAngles, Waypoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Encodes waypoints into controller commands
pub trait MotionProtocol: Send + Sync + fmt::Debug {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Command moving the arm to `angles` with the waypoint's pen state
    ///
    /// `previous` is the last pose sent in this run (home at run start).
    fn encode(&self, waypoint: &Waypoint, angles: &JointAngles, previous: &JointAngles) -> String;

    /// Return both joints to their reference position
    fn home(&self) -> String {
        "HOME\n".to_string()
    }

    /// Lift the pen
    fn pen_up(&self) -> String {
        "PU\n".to_string()
    }

    /// Lower the pen
    fn pen_down(&self) -> String {
        "PD\n".to_string()
    }

    /// Halt all motion immediately
    fn emergency_stop(&self) -> String {
        "STOP\n".to_string()
    }
}

/// Protocol selection as it appears in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// `"<theta1>,<theta2>,<pen>"` per waypoint
    #[default]
    Absolute,
    /// `"G <d1> <d2>"` joint step deltas followed by `PD`/`PU`
    StepDelta,
}

impl ProtocolKind {
    /// Instantiate the protocol
    ///
    /// `steps_per_degree` is only used by [`ProtocolKind::StepDelta`].
    pub fn build(self, steps_per_degree: f64) -> Arc<dyn MotionProtocol> {
        match self {
            ProtocolKind::Absolute => Arc::new(AbsoluteAngleProtocol),
            ProtocolKind::StepDelta => Arc::new(StepDeltaProtocol::new(steps_per_degree)),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolKind::Absolute => write!(f, "absolute"),
            ProtocolKind::StepDelta => write!(f, "step_delta"),
        }
    }
}

impl std::str::FromStr for ProtocolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(ProtocolKind::Absolute),
            "step_delta" | "step-delta" | "delta" => Ok(ProtocolKind::StepDelta),
            other => Err(format!("unknown protocol '{}'", other)),
        }
    }
}
