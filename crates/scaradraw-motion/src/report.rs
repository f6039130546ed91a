use scaradraw_core::SequencerState;
use serde::{Deserialize, Serialize};

/// Outcome of a run that ended without a transport fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// `Completed` or `Stopped`
    pub state: SequencerState,
    /// Waypoints in the run
    pub total: usize,
    /// Motion commands delivered
    pub sent: usize,
    /// Waypoints skipped as unreachable
    pub skipped: usize,
    /// Indices of the skipped waypoints
    pub skipped_indices: Vec<usize>,
}

impl RunReport {
    /// Check if every waypoint was processed
    pub fn is_complete(&self) -> bool {
        self.state == SequencerState::Completed
    }

    /// Waypoints never reached because the run stopped early
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.sent + self.skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopped() -> RunReport {
        RunReport {
            state: SequencerState::Stopped,
            total: 10,
            sent: 3,
            skipped: 1,
            skipped_indices: vec![2],
        }
    }

    #[test]
    fn test_remaining_after_stop() {
        let report = stopped();
        assert!(!report.is_complete());
        assert_eq!(report.remaining(), 6);
    }

    #[test]
    fn test_report_json() {
        let json = serde_json::to_value(stopped()).unwrap();
        assert_eq!(json["state"], "Stopped");
        assert_eq!(json["skipped_indices"], serde_json::json!([2]));
    }
}
